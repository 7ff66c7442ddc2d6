//! Error types for the planner.

use thiserror::Error;

use crate::entities::{ResourceId, UnitId};
use crate::position::Position;

/// Result type alias using [`PlannerError`].
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Top-level error type for all planning errors.
///
/// Every variant is recoverable by the caller: planning can be retried
/// with a different goal or budget, or abandoned.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// An operator was applied to a node where its precondition is false.
    #[error("Precondition violated for {operator}: {reason}")]
    PreconditionViolation {
        /// Short operator description.
        operator: String,
        /// Which part of the precondition failed.
        reason: String,
    },

    /// An operator could not be constructed.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// The frontier emptied without reaching the goal.
    #[error("No plan found after expanding {expanded} nodes")]
    NoPlanFound {
        /// Nodes expanded before giving up.
        expanded: usize,
    },

    /// The search hit its expansion or time budget.
    #[error("No plan found within budget after expanding {expanded} nodes: {reason}")]
    BudgetExhausted {
        /// Nodes expanded before the budget ran out.
        expanded: usize,
        /// Which limit was hit.
        reason: String,
    },

    /// The configuration cannot drive a search.
    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),

    /// The world snapshot cannot seed a search.
    #[error("Malformed world snapshot: {0}")]
    MalformedSnapshot(#[from] SnapshotError),

    /// Plan file could not be read or written.
    #[error("Plan file error: {0}")]
    PlanFile(String),
}

/// Defects found while building the root node from a world snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Map has no cells.
    #[error("map extents must be positive, got {width}x{height}")]
    EmptyMap {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },

    /// Map is wider or taller than signed cell coordinates can address.
    #[error("map extents {width}x{height} exceed the addressable grid")]
    MapTooLarge {
        /// Reported width.
        width: u32,
        /// Reported height.
        height: u32,
    },

    /// No depot among the controlled units.
    #[error("no depot among controlled units")]
    MissingDepot,

    /// No worker among the controlled units.
    #[error("no worker among controlled units")]
    MissingWorker,

    /// Two units share an id.
    #[error("duplicate unit id {0}")]
    DuplicateUnit(UnitId),

    /// Two resource nodes share an id.
    #[error("duplicate resource id {0}")]
    DuplicateResource(ResourceId),

    /// A unit sits outside the map.
    #[error("{unit} at {position} is outside the map")]
    UnitOutOfBounds {
        /// Offending unit.
        unit: UnitId,
        /// Reported position.
        position: Position,
    },

    /// A resource node sits outside the map.
    #[error("{resource} at {position} is outside the map")]
    ResourceOutOfBounds {
        /// Offending node.
        resource: ResourceId,
        /// Reported position.
        position: Position,
    },

    /// A resource node reports a negative amount.
    #[error("{resource} reports negative amount {amount}")]
    NegativeAmount {
        /// Offending node.
        resource: ResourceId,
        /// Reported amount.
        amount: i64,
    },

    /// A resource node holds more than the planner can count.
    #[error("{resource} reports amount {amount}, above {max}", max = u32::MAX)]
    AmountTooLarge {
        /// Offending node.
        resource: ResourceId,
        /// Reported amount.
        amount: i64,
    },

    /// The stockpile reports a negative amount.
    #[error("stockpile reports negative {resource}: {amount}")]
    NegativeStockpile {
        /// "gold" or "wood".
        resource: &'static str,
        /// Reported amount.
        amount: i64,
    },

    /// The stockpile holds more than the planner can count.
    #[error("stockpile reports {resource} {amount}, above {max}", max = u32::MAX)]
    StockpileTooLarge {
        /// "gold" or "wood".
        resource: &'static str,
        /// Reported amount.
        amount: i64,
    },

    /// A unit's carried cargo is inconsistent.
    #[error("{unit} has invalid cargo: {reason}")]
    InvalidCargo {
        /// Offending unit.
        unit: UnitId,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_error_converts() {
        let err: PlannerError = SnapshotError::MissingDepot.into();
        assert!(matches!(err, PlannerError::MalformedSnapshot(SnapshotError::MissingDepot)));
        assert_eq!(
            err.to_string(),
            "Malformed world snapshot: no depot among controlled units"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = PlannerError::NoPlanFound { expanded: 12 };
        assert_eq!(err.to_string(), "No plan found after expanding 12 nodes");

        let err = SnapshotError::UnitOutOfBounds {
            unit: UnitId(3),
            position: Position::new(-1, 4),
        };
        assert_eq!(err.to_string(), "unit#3 at (-1, 4) is outside the map");
    }
}
