//! Planner configuration.
//!
//! All tunables that shape the search space or bound the search live here.
//! The struct is serde-friendly so scenario files can carry it as RON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entities::UnitTemplateId;

/// Default amount a single Harvest takes from a node.
pub const DEFAULT_HARVEST_YIELD: u32 = 100;

/// Default gold price of a new worker.
pub const DEFAULT_WORKER_PRICE: u32 = 400;

/// Default maximum number of workers Build may raise the count to.
pub const DEFAULT_WORKER_CAP: usize = 3;

/// Default cap on node expansions per planning call.
pub const DEFAULT_MAX_EXPANSIONS: usize = 200_000;

/// How Harvest behaves when a node holds less than one yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepletionPolicy {
    /// Take whatever is left; the worker carries a partial load.
    #[default]
    Clamp,
    /// Only harvest nodes that still hold a full yield.
    FullYieldOnly,
}

/// Rules for the Build operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRules {
    /// Whether Build successors are generated at all.
    pub enabled: bool,
    /// Gold spent per new worker.
    pub price: u32,
    /// Build requires fewer workers than this.
    pub worker_cap: usize,
    /// Search cost of one Build.
    pub cost: u32,
    /// Host template for new workers.
    pub template: UnitTemplateId,
}

impl Default for BuildRules {
    fn default() -> Self {
        Self {
            enabled: false,
            price: DEFAULT_WORKER_PRICE,
            worker_cap: DEFAULT_WORKER_CAP,
            // Building is free in the search metric
            cost: 0,
            template: UnitTemplateId(0),
        }
    }
}

/// Limits that abort a search with `BudgetExhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum node expansions (None = unlimited).
    pub max_expansions: Option<usize>,
    /// Maximum wall-clock time in milliseconds (None = unlimited).
    pub max_duration_ms: Option<u64>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_expansions: Some(DEFAULT_MAX_EXPANSIONS),
            max_duration_ms: None,
        }
    }
}

impl SearchBudget {
    /// A budget with no limits.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_expansions: None,
            max_duration_ms: None,
        }
    }

    /// Wall-clock limit as a `Duration`.
    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

/// Which heuristic the search driver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeuristicKind {
    /// Farthest-node distance times remaining trips. Not admissible.
    #[default]
    TripDistance,
    /// Harvest and deposit count lower bound. Admissible without joint moves.
    HarvestLowerBound,
    /// Always zero (uniform-cost search).
    Zero,
}

/// Planner configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Amount one Harvest takes from a node.
    pub harvest_yield: u32,
    /// Build operator rules.
    pub build: BuildRules,
    /// Behaviour of nearly depleted nodes.
    pub depletion: DepletionPolicy,
    /// Also generate joint moves for idle workers at a depot.
    pub joint_moves: bool,
    /// Search limits.
    pub budget: SearchBudget,
    /// Heuristic strategy.
    pub heuristic: HeuristicKind,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            harvest_yield: DEFAULT_HARVEST_YIELD,
            build: BuildRules::default(),
            depletion: DepletionPolicy::default(),
            joint_moves: false,
            budget: SearchBudget::default(),
            heuristic: HeuristicKind::default(),
        }
    }
}

impl PlannerConfig {
    /// Set the harvest yield.
    pub fn with_harvest_yield(mut self, harvest_yield: u32) -> Self {
        self.harvest_yield = harvest_yield;
        self
    }

    /// Enable or disable the Build operator.
    pub fn with_build(mut self, enabled: bool) -> Self {
        self.build.enabled = enabled;
        self
    }

    /// Replace the Build rules.
    pub fn with_build_rules(mut self, rules: BuildRules) -> Self {
        self.build = rules;
        self
    }

    /// Set the depletion policy.
    pub fn with_depletion(mut self, policy: DepletionPolicy) -> Self {
        self.depletion = policy;
        self
    }

    /// Enable or disable joint move generation.
    pub fn with_joint_moves(mut self, enabled: bool) -> Self {
        self.joint_moves = enabled;
        self
    }

    /// Set the expansion limit.
    pub fn with_max_expansions(mut self, limit: Option<usize>) -> Self {
        self.budget.max_expansions = limit;
        self
    }

    /// Set the wall-clock limit in milliseconds.
    pub fn with_max_duration_ms(mut self, limit: Option<u64>) -> Self {
        self.budget.max_duration_ms = limit;
        self
    }

    /// Set the heuristic.
    pub fn with_heuristic(mut self, kind: HeuristicKind) -> Self {
        self.heuristic = kind;
        self
    }

    /// Parse a config from RON.
    pub fn from_ron_str(ron: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(ron)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        assert_eq!(config.harvest_yield, 100);
        assert!(!config.build.enabled);
        assert_eq!(config.build.price, 400);
        assert_eq!(config.build.worker_cap, 3);
        assert_eq!(config.build.cost, 0);
        assert_eq!(config.depletion, DepletionPolicy::Clamp);
        assert_eq!(config.budget.max_expansions, Some(DEFAULT_MAX_EXPANSIONS));
        assert_eq!(config.heuristic, HeuristicKind::TripDistance);
    }

    #[test]
    fn test_builder_pattern() {
        let config = PlannerConfig::default()
            .with_harvest_yield(50)
            .with_build(true)
            .with_depletion(DepletionPolicy::FullYieldOnly)
            .with_max_expansions(None)
            .with_max_duration_ms(Some(250))
            .with_heuristic(HeuristicKind::Zero);

        assert_eq!(config.harvest_yield, 50);
        assert!(config.build.enabled);
        assert_eq!(config.depletion, DepletionPolicy::FullYieldOnly);
        assert_eq!(config.budget.max_expansions, None);
        assert_eq!(config.budget.max_duration(), Some(Duration::from_millis(250)));
        assert_eq!(config.heuristic, HeuristicKind::Zero);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = PlannerConfig::from_ron_str("(harvest_yield: 25, joint_moves: true)").unwrap();
        assert_eq!(config.harvest_yield, 25);
        assert!(config.joint_moves);
        assert_eq!(config.build, BuildRules::default());
    }

    #[test]
    fn test_ron_roundtrip() {
        let config = PlannerConfig::default().with_build(true);
        let text = ron::to_string(&config).unwrap();
        assert_eq!(PlannerConfig::from_ron_str(&text).unwrap(), config);
    }
}
