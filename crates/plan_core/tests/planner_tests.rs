//! End-to-end planner tests over the shared fixtures.
//!
//! Every plan found here is replayed step by step to check preconditions,
//! costs and resource conservation.

use plan_core::prelude::*;
use plan_test_utils::fixtures::{self, Fixture};
use plan_test_utils::replay::assert_plan_valid;

fn plan(fixture: &Fixture) -> Result<Plan> {
    Planner::new(fixture.config.clone()).plan(&fixture.snapshot, fixture.goal)
}

fn step_names(plan: &Plan) -> Vec<&'static str> {
    plan.steps.iter().map(Operator::name).collect()
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn test_single_trip() {
    let fixture = fixtures::single_trip();
    let plan = plan(&fixture).unwrap();

    assert_eq!(
        step_names(&plan),
        vec!["MoveToResource", "Harvest", "MoveToBase", "Deposit"]
    );
    assert_eq!(plan.cost, 6);
    assert_eq!(plan.final_stockpile.gold, 100);

    let end = assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &plan);
    assert_eq!(end.resource(ResourceId(10)).unwrap().remaining, 400);
}

#[test]
fn test_goal_already_met() {
    let fixture = fixtures::goal_already_met();
    let plan = plan(&fixture).unwrap();

    assert!(plan.is_empty());
    assert_eq!(plan.cost, 0);
    assert_eq!(plan.stats.expanded, 0);
}

#[test]
fn test_missing_mine_is_no_plan() {
    let err = plan(&fixtures::no_gold_mine()).unwrap_err();
    assert!(matches!(err, PlannerError::NoPlanFound { .. }));
}

#[test]
fn test_two_small_mines() {
    let fixture = fixtures::two_small_mines();
    let plan = plan(&fixture).unwrap();

    assert!(plan.final_stockpile.gold >= 200);
    let end = assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &plan);

    // The 150 mine cannot cover 200 alone
    let harvested: Vec<ResourceId> = plan
        .steps
        .iter()
        .filter_map(|op| match op {
            Operator::Harvest(h) => Some(h.resource),
            _ => None,
        })
        .collect();
    assert!(harvested.contains(&ResourceId(10)));
    assert!(harvested.contains(&ResourceId(11)));
    assert!(end.resource(ResourceId(10)).is_none());
}

// =============================================================================
// Supplementary behaviour
// =============================================================================

#[test]
fn test_mixed_resources() {
    let fixture = fixtures::mixed_resources();
    let plan = plan(&fixture).unwrap();

    let end = assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &plan);
    assert!(end.stockpile().gold >= 200);
    assert!(end.stockpile().wood >= 100);
}

#[test]
fn test_loaded_worker_goes_straight_home() {
    let fixture = fixtures::loaded_worker();
    let plan = plan(&fixture).unwrap();

    assert_eq!(step_names(&plan), vec!["MoveToBase", "Deposit"]);
    assert_eq!(plan.cost, 5);
}

#[test]
fn test_build_is_offered_but_not_forced() {
    let fixture = fixtures::build_economy();
    let root = SearchNode::root(&fixture.snapshot, fixture.goal, &fixture.config).unwrap();
    assert!(root
        .applicable_operators()
        .iter()
        .any(|op| matches!(op, Operator::Build(_))));

    let plan = plan(&fixture).unwrap();
    assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &plan);
}

#[test]
fn test_build_disabled_by_default() {
    let fixture = fixtures::build_economy().with_config(PlannerConfig::default());
    let root = SearchNode::root(&fixture.snapshot, fixture.goal, &fixture.config).unwrap();
    assert!(!root
        .applicable_operators()
        .iter()
        .any(|op| matches!(op, Operator::Build(_))));
}

#[test]
fn test_joint_departure_saves_cost() {
    let snapshot = WorldSnapshot::new(8, 8)
        .with_unit(UnitSnapshot::depot(1, 0, 0))
        .with_unit(UnitSnapshot::worker(2, 0, 0))
        .with_unit(UnitSnapshot::worker(3, 1, 0))
        .with_resource(ResourceSnapshot::new(10, 3, 0, ResourceKind::GoldMine, 500));
    let goal = Goal::new(200, 0);

    let sequential = PlannerConfig::default().with_heuristic(HeuristicKind::Zero);
    let plan = Planner::new(sequential.clone()).plan(&snapshot, goal).unwrap();
    assert_eq!(plan.cost, 12);

    let joint = sequential.with_joint_moves(true);
    let plan = Planner::new(joint.clone()).plan(&snapshot, goal).unwrap();
    assert_eq!(plan.cost, 10);
    assert!(plan.steps.iter().any(|op| matches!(op, Operator::Joint(_))));
    assert_plan_valid(&snapshot, goal, &joint, &plan);

    // Both workers leave in one step
    let moves = plan
        .commands()
        .iter()
        .filter(|c| matches!(c, HostCommand::Move { .. }))
        .count();
    assert_eq!(moves, 4);
}

#[test]
fn test_full_yield_only_skips_small_node() {
    let snapshot = WorldSnapshot::new(8, 8)
        .with_unit(UnitSnapshot::depot(1, 0, 0))
        .with_unit(UnitSnapshot::worker(2, 0, 0))
        .with_resource(ResourceSnapshot::new(10, 2, 0, ResourceKind::GoldMine, 50))
        .with_resource(ResourceSnapshot::new(11, 5, 0, ResourceKind::GoldMine, 500));
    let goal = Goal::new(100, 0);

    // Clamp: the small node is drained first
    let clamp = PlannerConfig::default();
    let plan = Planner::new(clamp.clone()).plan(&snapshot, goal).unwrap();
    assert_plan_valid(&snapshot, goal, &clamp, &plan);

    // Full yields only: workers head for the big node instead
    let strict = PlannerConfig::default().with_depletion(DepletionPolicy::FullYieldOnly);
    let plan = Planner::new(strict.clone()).plan(&snapshot, goal).unwrap();
    assert_plan_valid(&snapshot, goal, &strict, &plan);
    assert!(plan.steps.iter().all(|op| match op {
        Operator::Harvest(h) => h.resource == ResourceId(11),
        _ => true,
    }));
    assert_eq!(plan.cost, 10);
}

// =============================================================================
// Failure modes
// =============================================================================

#[test]
fn test_expansion_budget_exhausted() {
    let fixture = fixtures::two_small_mines();
    let config = fixture.config.clone().with_max_expansions(Some(1));
    let err = Planner::new(config)
        .plan(&fixture.snapshot, fixture.goal)
        .unwrap_err();

    assert!(matches!(err, PlannerError::BudgetExhausted { expanded: 1, .. }));
}

#[test]
fn test_time_budget_exhausted() {
    let fixture = fixtures::two_small_mines();
    let config = fixture.config.clone().with_max_duration_ms(Some(0));
    let err = Planner::new(config)
        .plan(&fixture.snapshot, fixture.goal)
        .unwrap_err();

    assert!(matches!(err, PlannerError::BudgetExhausted { expanded: 0, .. }));
    assert!(err.to_string().contains("time limit"));
}

#[test]
fn test_malformed_snapshot() {
    let snapshot = WorldSnapshot::new(8, 8).with_unit(UnitSnapshot::worker(2, 0, 0));
    let err = Planner::default()
        .plan(&snapshot, Goal::new(100, 0))
        .unwrap_err();

    assert!(matches!(
        err,
        PlannerError::MalformedSnapshot(SnapshotError::MissingDepot)
    ));
}

#[test]
fn test_oversized_map_is_malformed() {
    let edge = i32::MAX;
    let snapshot = WorldSnapshot::new(u32::MAX, 4)
        .with_unit(UnitSnapshot::depot(1, edge, 0))
        .with_unit(UnitSnapshot::worker(2, edge - 5, 0))
        .with_resource(ResourceSnapshot::new(10, edge - 10, 0, ResourceKind::GoldMine, 500));
    let err = Planner::default()
        .plan(&snapshot, Goal::new(100, 0))
        .unwrap_err();

    assert!(matches!(
        err,
        PlannerError::MalformedSnapshot(SnapshotError::MapTooLarge { .. })
    ));
}

#[test]
fn test_planner_is_reusable() {
    let planner = Planner::default();
    let a = fixtures::single_trip();
    let c = fixtures::no_gold_mine();

    assert!(planner.plan(&c.snapshot, c.goal).is_err());
    let first = planner.plan(&a.snapshot, a.goal).unwrap();
    let second = planner.plan(&a.snapshot, a.goal).unwrap();
    assert_eq!(first.steps, second.steps);
}

// =============================================================================
// Plan files
// =============================================================================

#[test]
fn test_plan_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.plan");

    let fixture = fixtures::mixed_resources();
    let plan = plan(&fixture).unwrap();
    PlanFile::new(fixture.name.clone(), plan.clone())
        .save(&path)
        .unwrap();

    let loaded = PlanFile::load(&path).unwrap();
    assert_eq!(loaded.plan, plan);
    assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &loaded.plan);
}

#[test]
fn test_plan_json_output() {
    let plan = plan(&fixtures::single_trip()).unwrap();
    let json = serde_json::to_value(&plan).unwrap();

    assert_eq!(json["cost"], 6);
    assert_eq!(json["steps"].as_array().unwrap().len(), 4);
    assert!(json["steps"][0].get("MoveToResource").is_some());
}
