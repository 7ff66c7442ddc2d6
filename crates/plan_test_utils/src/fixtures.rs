//! Test fixtures and helpers.
//!
//! Pre-built worlds, goals and configurations for consistent testing.
//! A [`Fixture`] has the same shape as a scenario file, so tools tests can
//! write fixtures to disk and load them back.

use plan_core::config::PlannerConfig;
use plan_core::entities::{CargoKind, Goal, ResourceKind};
use plan_core::snapshot::{ResourceSnapshot, UnitSnapshot, WorldSnapshot};
use serde::{Deserialize, Serialize};

/// A named planning problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Short identifier.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Starting world.
    pub snapshot: WorldSnapshot,
    /// Stockpile to reach.
    pub goal: Goal,
    /// Planner settings.
    pub config: PlannerConfig,
}

impl Fixture {
    fn new(name: &str, description: &str, snapshot: WorldSnapshot, goal: Goal) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            snapshot,
            goal,
            config: PlannerConfig::default(),
        }
    }

    /// Replace the planner settings.
    #[must_use]
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Render as a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if RON serialization fails.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

/// One worker sharing a cell with the depot, one gold mine three cells away.
///
/// Expected: move out (2), harvest (1), move back (2), deposit (1).
#[must_use]
pub fn single_trip() -> Fixture {
    Fixture::new(
        "single-trip",
        "One worker, one mine, one load of gold",
        WorldSnapshot::new(8, 8)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 0, 0))
            .with_resource(ResourceSnapshot::new(10, 3, 0, ResourceKind::GoldMine, 500)),
        Goal::new(100, 0),
    )
}

/// Nothing required: the root is already a goal.
#[must_use]
pub fn goal_already_met() -> Fixture {
    let mut fixture = single_trip();
    fixture.name = "goal-already-met".into();
    fixture.description = "Zero goal, empty plan".into();
    fixture.goal = Goal::new(0, 0);
    fixture
}

/// Gold is required but only trees exist.
#[must_use]
pub fn no_gold_mine() -> Fixture {
    Fixture::new(
        "no-gold-mine",
        "Gold required, no mine on the map",
        WorldSnapshot::new(8, 8)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 0, 0))
            .with_resource(ResourceSnapshot::new(20, 0, 3, ResourceKind::Tree, 400)),
        Goal::new(100, 0),
    )
}

/// Two workers, two small mines that together hold just enough.
#[must_use]
pub fn two_small_mines() -> Fixture {
    Fixture::new(
        "two-small-mines",
        "Two workers drain a 150 mine and a 100 mine",
        WorldSnapshot::new(10, 10)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 0, 0))
            .with_unit(UnitSnapshot::worker(3, 1, 0))
            .with_resource(ResourceSnapshot::new(10, 3, 0, ResourceKind::GoldMine, 150))
            .with_resource(ResourceSnapshot::new(11, 0, 4, ResourceKind::GoldMine, 100)),
        Goal::new(200, 0),
    )
}

/// Gold and wood from separate nodes.
#[must_use]
pub fn mixed_resources() -> Fixture {
    Fixture::new(
        "mixed-resources",
        "One worker collects gold and wood",
        WorldSnapshot::new(10, 10)
            .with_unit(UnitSnapshot::depot(1, 2, 2))
            .with_unit(UnitSnapshot::worker(2, 2, 3))
            .with_resource(ResourceSnapshot::new(10, 6, 2, ResourceKind::GoldMine, 1000))
            .with_resource(ResourceSnapshot::new(20, 2, 5, ResourceKind::Tree, 1000)),
        Goal::new(200, 100),
    )
}

/// Enough banked gold to build workers before gathering.
#[must_use]
pub fn build_economy() -> Fixture {
    Fixture::new(
        "build-economy",
        "Starts with 800 gold, building workers is allowed",
        WorldSnapshot::new(10, 10)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 1, 1))
            .with_resource(ResourceSnapshot::new(10, 5, 0, ResourceKind::GoldMine, 2000))
            .with_stockpile(800, 0),
        Goal::new(900, 0),
    )
    .with_config(PlannerConfig::default().with_build(true))
}

/// A worker that starts away from the depot with a load of wood.
#[must_use]
pub fn loaded_worker() -> Fixture {
    Fixture::new(
        "loaded-worker",
        "Worker starts in the field carrying wood",
        WorldSnapshot::new(8, 8)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 4, 4).carrying(CargoKind::Wood, 100))
            .with_resource(ResourceSnapshot::new(20, 5, 5, ResourceKind::Tree, 300)),
        Goal::new(0, 100),
    )
}

/// Every fixture that has a plan.
#[must_use]
pub fn solvable() -> Vec<Fixture> {
    vec![
        single_trip(),
        goal_already_met(),
        two_small_mines(),
        mixed_resources(),
        build_economy(),
        loaded_worker(),
    ]
}
