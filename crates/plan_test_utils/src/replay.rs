//! Plan replay checker.
//!
//! Re-applies a plan step by step from a fresh root and checks every
//! precondition, the parent/child invariants and resource conservation.
//! A plan that passes here is executable against the snapshot it was made
//! for.

use std::fmt;

use plan_core::config::PlannerConfig;
use plan_core::entities::{Goal, ResourceKind};
use plan_core::operators::Operator;
use plan_core::plan::Plan;
use plan_core::snapshot::WorldSnapshot;
use plan_core::state::SearchNode;

/// Why a plan failed to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFailure {
    /// Zero-based step index, or `None` for a whole-plan check.
    pub step: Option<usize>,
    /// What went wrong.
    pub reason: String,
}

impl fmt::Display for ReplayFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "step {}: {}", step + 1, self.reason),
            None => write!(f, "plan: {}", self.reason),
        }
    }
}

impl std::error::Error for ReplayFailure {}

fn fail(step: Option<usize>, reason: impl Into<String>) -> ReplayFailure {
    ReplayFailure {
        step,
        reason: reason.into(),
    }
}

/// Stockpile, carried cargo and node contents of one kind.
#[must_use]
pub fn resource_total(node: &SearchNode, kind: ResourceKind) -> u64 {
    let banked = u64::from(node.stockpile().amount(kind));
    let carried: u64 = node
        .workers()
        .iter()
        .filter_map(|w| w.cargo)
        .filter(|c| c.kind().resource_kind() == kind)
        .map(|c| u64::from(c.amount()))
        .sum();
    let in_nodes: u64 = node
        .resources()
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| u64::from(r.remaining))
        .sum();
    banked + carried + in_nodes
}

/// Gold an operator removes from the economy.
fn gold_spent(op: &Operator) -> u64 {
    match op {
        Operator::Build(build) => u64::from(build.price),
        Operator::Joint(joint) => joint.actions().iter().map(gold_spent).sum(),
        _ => 0,
    }
}

/// Replay `plan` from the root built from `snapshot`.
///
/// Returns the final node on success.
///
/// # Errors
///
/// Returns the first failing step and reason.
pub fn replay_plan(
    snapshot: &WorldSnapshot,
    goal: Goal,
    config: &PlannerConfig,
    plan: &Plan,
) -> Result<SearchNode, ReplayFailure> {
    let mut node =
        SearchNode::root(snapshot, goal, config).map_err(|e| fail(None, e.to_string()))?;

    for (i, op) in plan.steps.iter().enumerate() {
        if !op.precondition(&node) {
            return Err(fail(Some(i), format!("precondition false for {op}")));
        }
        let child = op.apply(&node).map_err(|e| fail(Some(i), e.to_string()))?;
        node.check_successor(&child).map_err(|e| fail(Some(i), e))?;

        if child.cost() != node.cost() + op.cost() {
            return Err(fail(Some(i), "cost did not grow by the step cost"));
        }
        for kind in ResourceKind::ALL {
            let spent = if kind == ResourceKind::GoldMine { gold_spent(op) } else { 0 };
            let before = resource_total(&node, kind);
            let after = resource_total(&child, kind);
            if after + spent != before {
                return Err(fail(
                    Some(i),
                    format!("{kind:?} total went from {before} to {after} (spent {spent})"),
                ));
            }
        }

        tracing::trace!(step = i + 1, %op, g = child.cost(), "Replayed step");
        node = child;
    }

    if node.cost() != plan.cost {
        return Err(fail(
            None,
            format!("plan claims cost {} but steps sum to {}", plan.cost, node.cost()),
        ));
    }
    if node.stockpile() != plan.final_stockpile {
        return Err(fail(None, "final stockpile differs from the plan"));
    }
    if !node.is_goal() {
        return Err(fail(None, "final node does not meet the goal"));
    }

    Ok(node)
}

/// Replay a plan and panic with a readable message if it fails.
///
/// # Panics
///
/// Panics if any step fails to replay.
pub fn assert_plan_valid(
    snapshot: &WorldSnapshot,
    goal: Goal,
    config: &PlannerConfig,
    plan: &Plan,
) -> SearchNode {
    match replay_plan(snapshot, goal, config, plan) {
        Ok(node) => node,
        Err(failure) => panic!("Plan does not replay!\n{failure}\n\n{plan}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use plan_core::search::Planner;

    #[test]
    fn test_valid_plan_replays() {
        let fixture = fixtures::single_trip();
        let plan = Planner::new(fixture.config.clone())
            .plan(&fixture.snapshot, fixture.goal)
            .unwrap();

        let node = assert_plan_valid(&fixture.snapshot, fixture.goal, &fixture.config, &plan);
        assert_eq!(node.stockpile().gold, 100);
    }

    #[test]
    fn test_reordered_plan_rejected() {
        let fixture = fixtures::single_trip();
        let mut plan = Planner::new(fixture.config.clone())
            .plan(&fixture.snapshot, fixture.goal)
            .unwrap();
        plan.steps.swap(0, 1);

        let failure = replay_plan(&fixture.snapshot, fixture.goal, &fixture.config, &plan)
            .unwrap_err();
        assert_eq!(failure.step, Some(0));
    }

    #[test]
    fn test_wrong_cost_rejected() {
        let fixture = fixtures::single_trip();
        let mut plan = Planner::new(fixture.config.clone())
            .plan(&fixture.snapshot, fixture.goal)
            .unwrap();
        plan.cost += 1;

        let failure = replay_plan(&fixture.snapshot, fixture.goal, &fixture.config, &plan)
            .unwrap_err();
        assert_eq!(failure.step, None);
    }

    #[test]
    fn test_truncated_plan_misses_goal() {
        let fixture = fixtures::single_trip();
        let mut plan = Planner::new(fixture.config.clone())
            .plan(&fixture.snapshot, fixture.goal)
            .unwrap();
        plan.steps.pop();
        plan.cost = 5;
        plan.final_stockpile = plan_core::entities::Stockpile::default();

        let failure = replay_plan(&fixture.snapshot, fixture.goal, &fixture.config, &plan)
            .unwrap_err();
        assert!(failure.reason.contains("goal"));
    }
}
