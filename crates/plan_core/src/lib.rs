//! # Plan Core
//!
//! Deterministic economy planner for RTS-style worlds.
//!
//! Given a snapshot of workers, depots and resource nodes, the planner finds
//! a cheap sequence of operators that brings the gold and wood stockpile up
//! to a goal. This crate contains **only** planning logic:
//! - No IO besides optional plan files
//! - No randomness
//! - No floating-point math
//! - No shared mutable state between search nodes
//!
//! ## Crate Structure
//!
//! - [`snapshot`] - Host world snapshot and validation
//! - [`state`] - Search nodes and structural state keys
//! - [`operators`] - Move, harvest, deposit, build and joint operators
//! - [`heuristic`] - Remaining-cost estimates
//! - [`search`] - A* driver
//! - [`plan`] - Plans, host commands and plan files

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod entities;
pub mod error;
pub mod heuristic;
pub mod operators;
pub mod plan;
pub mod position;
pub mod search;
pub mod snapshot;
pub mod state;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        BuildRules, DepletionPolicy, HeuristicKind, PlannerConfig, SearchBudget,
    };
    pub use crate::entities::{
        Cargo, CargoKind, Goal, ResourceId, ResourceKind, ResourceNode, Stockpile, Unit, UnitId,
        UnitRole, UnitTemplateId,
    };
    pub use crate::error::{PlannerError, Result, SnapshotError};
    pub use crate::heuristic::{Heuristic, HarvestLowerBound, TripDistance, ZeroHeuristic};
    pub use crate::operators::{
        Build, Deposit, Harvest, JointAction, MoveToBase, MoveToResource, Operator,
    };
    pub use crate::plan::{HostCommand, Plan, PlanFile};
    pub use crate::position::{Direction, MapExtents, Position};
    pub use crate::search::{Planner, SearchStats};
    pub use crate::snapshot::{ResourceSnapshot, StockpileSnapshot, UnitSnapshot, WorldSnapshot};
    pub use crate::state::{SearchNode, StateKey};
}
