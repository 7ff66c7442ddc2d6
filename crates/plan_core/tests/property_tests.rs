//! Property tests over randomly generated worlds.

use plan_core::prelude::*;
use plan_test_utils::determinism::strategies::arb_fixture;
use plan_test_utils::proptest::prelude::*;
use plan_test_utils::replay::{resource_total, replay_plan};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every plan the search returns executes step by step.
    #[test]
    fn prop_plans_replay(fixture in arb_fixture()) {
        match Planner::new(fixture.config.clone()).plan(&fixture.snapshot, fixture.goal) {
            Ok(plan) => {
                let end = replay_plan(&fixture.snapshot, fixture.goal, &fixture.config, &plan);
                prop_assert!(end.is_ok(), "{}", end.unwrap_err());
                prop_assert!(fixture.goal.is_met(&plan.final_stockpile));
            }
            Err(PlannerError::NoPlanFound { .. } | PlannerError::BudgetExhausted { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A goal above everything on the map fails before any expansion.
    #[test]
    fn prop_unreachable_goals_fail_fast(fixture in arb_fixture()) {
        let root = SearchNode::root(&fixture.snapshot, fixture.goal, &fixture.config).unwrap();
        let gold = resource_total(&root, ResourceKind::GoldMine);
        let wood = resource_total(&root, ResourceKind::Tree);
        let goal = Goal::new(
            u32::try_from(gold + 1).unwrap_or(u32::MAX),
            u32::try_from(wood).unwrap_or(u32::MAX),
        );

        let result = Planner::new(fixture.config.clone()).plan(&fixture.snapshot, goal);
        let failed_fast = matches!(result, Err(PlannerError::NoPlanFound { expanded: 0 }));
        prop_assert!(failed_fast, "expected an immediate NoPlanFound, got {:?}", result);
    }

    /// The admissible heuristic finds plans as cheap as uniform-cost search.
    #[test]
    fn prop_lower_bound_is_optimal(fixture in arb_fixture()) {
        let config = fixture.config.clone().with_joint_moves(false);
        let bounded = Planner::new(config.clone().with_heuristic(HeuristicKind::HarvestLowerBound))
            .plan(&fixture.snapshot, fixture.goal);
        let uniform = Planner::new(config.with_heuristic(HeuristicKind::Zero))
            .plan(&fixture.snapshot, fixture.goal);

        if let (Ok(bounded), Ok(uniform)) = (bounded, uniform) {
            prop_assert_eq!(bounded.cost, uniform.cost);
        }
    }

    /// Successor generation never changes the parent.
    #[test]
    fn prop_successors_leave_parent_untouched(fixture in arb_fixture()) {
        let root = SearchNode::root(&fixture.snapshot, fixture.goal, &fixture.config).unwrap();
        let key = root.key();
        let stockpile = root.stockpile();

        for child in root.successors().unwrap() {
            prop_assert!(root.check_successor(&child).is_ok());
            prop_assert!(child.cost() >= root.cost());
        }
        prop_assert_eq!(root.key(), key);
        prop_assert_eq!(root.stockpile(), stockpile);
    }
}
