//! Best-first A* search over [`SearchNode`]s.
//!
//! The frontier is a binary heap ordered by `f = g + h`, then `h`, then
//! insertion order, so equal inputs always expand the same nodes in the same
//! order. Duplicate states are detected structurally through
//! [`StateKey`]: a node is pushed only if it improves on the best cost seen
//! for its key, and stale entries are skipped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::entities::Goal;
use crate::error::{PlannerError, Result};
use crate::heuristic::{self, Heuristic};
use crate::plan::Plan;
use crate::snapshot::WorldSnapshot;
use crate::state::{SearchNode, StateKey};

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes popped and expanded.
    pub expanded: usize,
    /// Successors produced.
    pub generated: usize,
    /// Successors and stale entries discarded as duplicates.
    pub pruned: usize,
    /// Largest frontier size observed.
    pub max_frontier: usize,
    /// Wall-clock time in microseconds.
    pub elapsed_us: u64,
}

/// Frontier entry.
struct FrontierEntry {
    /// `g + h`.
    f: u32,
    /// Heuristic part of `f`.
    h: u32,
    /// Insertion order, for deterministic tie-breaking.
    seq: u64,
    key: StateKey,
    node: SearchNode,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse everything so the lowest f pops
        // first, then the lowest h, then the oldest entry.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

/// A* planner over economy states.
///
/// A planner is reusable and holds no per-search state; every call to
/// [`Planner::plan`] starts from scratch.
pub struct Planner {
    config: PlannerConfig,
    heuristic: Box<dyn Heuristic>,
}

impl fmt::Debug for Planner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planner")
            .field("config", &self.config)
            .field("heuristic", &self.heuristic.name())
            .finish()
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl Planner {
    /// Create a planner using the heuristic named in `config`.
    #[must_use]
    pub fn new(config: PlannerConfig) -> Self {
        let heuristic = heuristic::for_kind(config.heuristic);
        Self { config, heuristic }
    }

    /// Replace the heuristic with a custom one.
    #[must_use]
    pub fn with_heuristic<H: Heuristic + 'static>(mut self, heuristic: H) -> Self {
        self.heuristic = Box::new(heuristic);
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Name of the active heuristic.
    #[must_use]
    pub fn heuristic_name(&self) -> &'static str {
        self.heuristic.name()
    }

    /// Find a plan that brings the stockpile up to `goal`.
    ///
    /// # Errors
    ///
    /// - `MalformedSnapshot` if the snapshot cannot seed a search
    /// - `NoPlanFound` if the goal is unreachable
    /// - `BudgetExhausted` if the expansion or time limit is hit first
    pub fn plan(&self, snapshot: &WorldSnapshot, goal: Goal) -> Result<Plan> {
        let root = SearchNode::root(snapshot, goal, &self.config)?;
        self.plan_from(root)
    }

    /// Search from an already built root node.
    ///
    /// # Errors
    ///
    /// See [`Planner::plan`].
    pub fn plan_from(&self, root: SearchNode) -> Result<Plan> {
        let started = Instant::now();
        let mut stats = SearchStats::default();

        if root.is_goal() {
            tracing::debug!("Goal already met at root");
            return Ok(Plan::from_goal_node(&root, stats));
        }
        if !root.is_feasible() {
            tracing::warn!(goal = ?root.goal(), "Goal exceeds every reachable resource");
            return Err(PlannerError::NoPlanFound { expanded: 0 });
        }

        let budget = self.config.budget;
        let max_duration = budget.max_duration();

        let mut frontier: BinaryHeap<FrontierEntry> = BinaryHeap::new();
        let mut best_cost: FxHashMap<StateKey, u32> = FxHashMap::default();
        let mut seq: u64 = 0;

        let key = root.key();
        let h = self.heuristic.estimate(&root);
        best_cost.insert(key.clone(), root.cost());
        frontier.push(FrontierEntry {
            f: h,
            h,
            seq,
            key,
            node: root,
        });

        tracing::debug!(
            heuristic = self.heuristic.name(),
            initial_estimate = h,
            "Starting search"
        );

        while let Some(entry) = frontier.pop() {
            let FrontierEntry { key, node, .. } = entry;

            // A cheaper copy of this state was pushed after this one
            if best_cost.get(&key).is_some_and(|&g| g < node.cost()) {
                stats.pruned += 1;
                continue;
            }

            if node.is_goal() {
                stats.elapsed_us = elapsed_us(started);
                tracing::debug!(
                    cost = node.cost(),
                    steps = node.path().len(),
                    expanded = stats.expanded,
                    generated = stats.generated,
                    "Plan found"
                );
                return Ok(Plan::from_goal_node(&node, stats));
            }

            if let Some(limit) = budget.max_expansions {
                if stats.expanded >= limit {
                    return Err(self.exhausted(stats, format!("expansion limit {limit} reached")));
                }
            }
            if let Some(limit) = max_duration {
                if started.elapsed() >= limit {
                    return Err(self.exhausted(
                        stats,
                        format!("time limit {}ms reached", limit.as_millis()),
                    ));
                }
            }

            stats.expanded += 1;
            tracing::trace!(
                g = node.cost(),
                stockpile = ?node.stockpile(),
                frontier = frontier.len(),
                "Expanding node"
            );

            for child in node.successors()? {
                #[cfg(feature = "debug-validation")]
                node.check_successor(&child)
                    .map_err(PlannerError::InvalidOperator)?;

                stats.generated += 1;
                let child_key = child.key();
                if best_cost
                    .get(&child_key)
                    .is_some_and(|&g| g <= child.cost())
                {
                    stats.pruned += 1;
                    continue;
                }

                best_cost.insert(child_key.clone(), child.cost());
                let h = self.heuristic.estimate(&child);
                seq += 1;
                frontier.push(FrontierEntry {
                    f: child.cost().saturating_add(h),
                    h,
                    seq,
                    key: child_key,
                    node: child,
                });
            }
            stats.max_frontier = stats.max_frontier.max(frontier.len());
        }

        tracing::debug!(expanded = stats.expanded, "Frontier exhausted");
        Err(PlannerError::NoPlanFound {
            expanded: stats.expanded,
        })
    }

    fn exhausted(&self, stats: SearchStats, reason: String) -> PlannerError {
        tracing::warn!(
            expanded = stats.expanded,
            generated = stats.generated,
            heuristic = self.heuristic.name(),
            %reason,
            "Search budget exhausted"
        );
        PlannerError::BudgetExhausted {
            expanded: stats.expanded,
            reason,
        }
    }
}

fn elapsed_us(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}
