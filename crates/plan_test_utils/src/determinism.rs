//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the planner produces identical
//! plans given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism a planner can pick up include:
//!
//! - **HashMap iteration order**: the closed set is only ever probed,
//!   never iterated. Entities are kept in sorted id order.
//!
//! - **Heap ties**: frontier entries with equal `f` and `h` pop in
//!   insertion order.
//!
//! - **Wall-clock budgets**: a time limit can cut two runs at different
//!   points. Determinism tests use expansion limits only.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: single fixtures planned repeatedly
//! 2. **Property tests**: random worlds must still plan deterministically
//! 3. **Parallel tests**: running N searches on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use plan_core::error::Result;
use plan_core::plan::Plan;
use plan_core::search::Planner;

use crate::fixtures::Fixture;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic planner).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the planner was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Planner is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a computation multiple times and verify the results hash equally.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `run` - Function producing one result
/// * `hash` - Function to compute the result hash
pub fn verify_determinism<S, Run, HashFn>(runs: usize, run: Run, hash: HashFn) -> DeterminismResult
where
    Run: Fn() -> S,
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&run())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
    }
}

/// Hash of everything in a plan that must not vary between runs.
///
/// Timing is excluded; expansion counters are included.
#[must_use]
pub fn plan_hash(plan: &Plan) -> u64 {
    let mut hasher = DefaultHasher::new();
    plan.steps.hash(&mut hasher);
    plan.cost.hash(&mut hasher);
    plan.final_stockpile.hash(&mut hasher);
    plan.stats.expanded.hash(&mut hasher);
    plan.stats.generated.hash(&mut hasher);
    hasher.finish()
}

/// Hash of a planning outcome, including failures.
#[must_use]
pub fn outcome_hash(outcome: &Result<Plan>) -> u64 {
    match outcome {
        Ok(plan) => plan_hash(plan),
        Err(err) => compute_hash(&err.to_string()),
    }
}

/// Plan a fixture `runs` times with fresh planners and compare outcomes.
#[must_use]
pub fn verify_plan_determinism(fixture: &Fixture, runs: usize) -> DeterminismResult {
    verify_determinism(
        runs,
        || Planner::new(fixture.config.clone()).plan(&fixture.snapshot, fixture.goal),
        outcome_hash,
    )
}

/// Result of parallel planning runs.
#[derive(Debug, Clone)]
pub struct ParallelPlanResult {
    /// Outcome hash from each search.
    pub hashes: Vec<u64>,
    /// Number of searches run.
    pub num_runs: usize,
}

impl ParallelPlanResult {
    /// Check if all searches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all searches matched.
    ///
    /// # Panics
    ///
    /// Panics if searches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel searches diverged!\n\
                 Searches: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_runs,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Plan the same fixture on `num_runs` scoped threads.
///
/// # Panics
///
/// Panics if a search thread panics.
#[must_use]
pub fn run_parallel_plans(fixture: &Fixture, num_runs: usize) -> ParallelPlanResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    let outcome =
                        Planner::new(fixture.config.clone()).plan(&fixture.snapshot, fixture.goal);
                    outcome_hash(&outcome)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("search thread panicked"))
            .collect()
    });

    ParallelPlanResult { hashes, num_runs }
}

/// Index of the first step at which two plans differ.
///
/// Returns `None` if the plans have identical steps. A plan that is a
/// prefix of the other diverges at the shorter length.
#[must_use]
pub fn find_first_divergence(a: &Plan, b: &Plan) -> Option<usize> {
    let common = a.steps.len().min(b.steps.len());
    (0..common)
        .find(|&i| a.steps[i] != b.steps[i])
        .or_else(|| (a.steps.len() != b.steps.len()).then_some(common))
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for planner testing.
///
/// Worlds are small enough for exhaustive searches to finish quickly.
pub mod strategies {
    use plan_core::config::PlannerConfig;
    use plan_core::entities::{Goal, ResourceKind};
    use plan_core::snapshot::{ResourceSnapshot, UnitSnapshot, WorldSnapshot};
    use proptest::prelude::*;

    use crate::fixtures::Fixture;

    /// Side length of generated maps.
    pub const MAP_SIZE: i32 = 8;

    /// Generate a cell inside the generated map.
    pub fn arb_cell() -> impl Strategy<Value = (i32, i32)> {
        (0..MAP_SIZE, 0..MAP_SIZE)
    }

    /// Generate a resource kind.
    pub fn arb_resource_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![Just(ResourceKind::GoldMine), Just(ResourceKind::Tree)]
    }

    /// Generate node contents, including partial loads.
    pub fn arb_node_amount() -> impl Strategy<Value = i64> {
        prop_oneof![Just(100i64), Just(250), Just(500), 1i64..400]
    }

    /// Generate a goal in whole or partial loads.
    pub fn arb_goal() -> impl Strategy<Value = Goal> {
        (0u32..=3, 0u32..=2, prop_oneof![Just(0u32), Just(50)])
            .prop_map(|(gold, wood, extra)| Goal::new(gold * 100 + extra, wood * 100))
    }

    /// Generate a world with one depot, one or two workers and up to four nodes.
    pub fn arb_world() -> impl Strategy<Value = WorldSnapshot> {
        (
            arb_cell(),
            proptest::collection::vec(arb_cell(), 1..=2),
            proptest::collection::vec((arb_cell(), arb_resource_kind(), arb_node_amount()), 0..=4),
        )
            .prop_map(|(depot, workers, nodes)| {
                let size = MAP_SIZE.unsigned_abs();
                let mut world = WorldSnapshot::new(size, size)
                    .with_unit(UnitSnapshot::depot(1, depot.0, depot.1));
                for (i, (x, y)) in (10u32..).zip(workers) {
                    world = world.with_unit(UnitSnapshot::worker(i, x, y));
                }
                for (i, ((x, y), kind, amount)) in (100u32..).zip(nodes) {
                    world = world.with_resource(ResourceSnapshot::new(i, x, y, kind, amount));
                }
                world
            })
    }

    /// Generate a complete fixture with a bounded search budget.
    pub fn arb_fixture() -> impl Strategy<Value = Fixture> {
        (arb_world(), arb_goal(), any::<bool>()).prop_map(|(snapshot, goal, joint_moves)| Fixture {
            name: "generated".into(),
            description: "proptest world".into(),
            snapshot,
            goal,
            config: PlannerConfig::default()
                .with_joint_moves(joint_moves)
                .with_max_expansions(Some(20_000)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, || 100u64, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |n| *n,
        );

        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_fixture_plans_are_deterministic() {
        for fixture in fixtures::solvable() {
            verify_plan_determinism(&fixture, 3).assert_deterministic();
        }
    }

    #[test]
    fn test_failures_are_deterministic() {
        verify_plan_determinism(&fixtures::no_gold_mine(), 2).assert_deterministic();
    }

    #[test]
    fn test_parallel_plans_match() {
        run_parallel_plans(&fixtures::two_small_mines(), 4).assert_deterministic();
    }

    #[test]
    fn test_first_divergence() {
        let fixture = fixtures::single_trip();
        let plan = Planner::new(fixture.config.clone())
            .plan(&fixture.snapshot, fixture.goal)
            .unwrap();

        assert_eq!(find_first_divergence(&plan, &plan), None);

        let mut shorter = plan.clone();
        shorter.steps.pop();
        assert_eq!(find_first_divergence(&plan, &shorter), Some(3));

        let mut swapped = plan.clone();
        swapped.steps.swap(1, 2);
        assert_eq!(find_first_divergence(&plan, &swapped), Some(1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Random worlds plan identically on repeated runs.
        #[test]
        fn prop_random_worlds_are_deterministic(fixture in strategies::arb_fixture()) {
            let result = verify_plan_determinism(&fixture, 2);
            prop_assert!(result.is_deterministic);
        }
    }
}
