//! Plans and their translation into host commands.
//!
//! A [`Plan`] is the operator path of a goal node plus its cost and search
//! counters. Hosts consume it either as operators or as flattened
//! [`HostCommand`]s. Plans can be stored as versioned bincode files.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entities::{ResourceId, Stockpile, UnitId, UnitTemplateId};
use crate::error::{PlannerError, Result};
use crate::operators::Operator;
use crate::position::{Direction, Position};
use crate::search::SearchStats;
use crate::state::SearchNode;

/// Plan file format version for compatibility.
pub const PLAN_FILE_VERSION: u32 = 1;

/// Primitive command a host engine can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Path the unit to a cell.
    Move {
        /// Moving unit.
        unit: UnitId,
        /// Destination cell.
        target: Position,
    },
    /// Gather from a neighbouring node.
    Gather {
        /// Gathering worker.
        unit: UnitId,
        /// Node gathered from.
        resource: ResourceId,
        /// Direction from the worker to the node. `None` if they share a cell.
        direction: Option<Direction>,
    },
    /// Unload at a neighbouring depot.
    Deposit {
        /// Unloading worker.
        unit: UnitId,
        /// Receiving depot.
        depot: UnitId,
        /// Direction from the worker to the depot. `None` if they share a cell.
        direction: Option<Direction>,
    },
    /// Produce a unit.
    Produce {
        /// Producing depot.
        depot: UnitId,
        /// Template to produce.
        template: UnitTemplateId,
    },
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir =
            |d: &Option<Direction>| d.map_or_else(|| "here".to_string(), |d| format!("{d:?}"));
        match self {
            Self::Move { unit, target } => write!(f, "move {unit} to {target}"),
            Self::Gather {
                unit,
                resource,
                direction,
            } => write!(f, "gather {unit} from {resource} ({})", dir(direction)),
            Self::Deposit {
                unit,
                depot,
                direction,
            } => write!(f, "deposit {unit} into {depot} ({})", dir(direction)),
            Self::Produce { depot, template } => {
                write!(f, "produce template {} at {depot}", template.0)
            }
        }
    }
}

impl Operator {
    /// Host commands that execute this step, in issue order.
    #[must_use]
    pub fn host_commands(&self) -> Vec<HostCommand> {
        match self {
            Self::MoveToResource(op) => vec![HostCommand::Move {
                unit: op.unit,
                target: op.destination,
            }],
            Self::MoveToBase(op) => vec![HostCommand::Move {
                unit: op.unit,
                target: op.destination,
            }],
            Self::Harvest(op) => vec![HostCommand::Gather {
                unit: op.unit,
                resource: op.resource,
                direction: op.from.direction_to(op.at),
            }],
            Self::Deposit(op) => vec![HostCommand::Deposit {
                unit: op.unit,
                depot: op.depot,
                direction: op.from.direction_to(op.at),
            }],
            Self::Build(op) => vec![HostCommand::Produce {
                depot: op.depot,
                template: op.template,
            }],
            Self::Joint(op) => op.actions().iter().flat_map(Self::host_commands).collect(),
        }
    }
}

/// A plan from the root to a goal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Operators in execution order.
    pub steps: Vec<Operator>,
    /// Sum of step costs.
    pub cost: u32,
    /// Stockpile after the last step.
    pub final_stockpile: Stockpile,
    /// Search counters.
    pub stats: SearchStats,
}

impl Plan {
    /// Extract the plan recorded in a goal node.
    #[must_use]
    pub fn from_goal_node(node: &SearchNode, stats: SearchStats) -> Self {
        Self {
            steps: node.path().iter().cloned().collect(),
            cost: node.cost(),
            final_stockpile: node.stockpile(),
            stats,
        }
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the goal was already met.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// All host commands, step by step.
    #[must_use]
    pub fn commands(&self) -> Vec<HostCommand> {
        self.steps.iter().flat_map(Operator::host_commands).collect()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} steps, cost {}, final stockpile {} gold / {} wood",
            self.steps.len(),
            self.cost,
            self.final_stockpile.gold,
            self.final_stockpile.wood
        )?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>4}. {step}", i + 1)?;
        }
        Ok(())
    }
}

/// On-disk plan with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFile {
    /// File format version.
    pub version: u32,
    /// Scenario the plan was made for.
    pub scenario: String,
    /// The plan.
    pub plan: Plan,
}

impl PlanFile {
    /// Wrap a plan for storage.
    #[must_use]
    pub fn new(scenario: impl Into<String>, plan: Plan) -> Self {
        Self {
            version: PLAN_FILE_VERSION,
            scenario: scenario.into(),
            plan,
        }
    }

    /// Save the plan to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| PlannerError::PlanFile(format!("Failed to serialize plan: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| PlannerError::PlanFile(format!("Failed to write plan file: {e}")))?;
        Ok(())
    }

    /// Load a plan from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version
    /// check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| PlannerError::PlanFile(format!("Failed to read plan file: {e}")))?;
        let file: Self = bincode::deserialize(&bytes)
            .map_err(|e| PlannerError::PlanFile(format!("Failed to deserialize plan: {e}")))?;

        if file.version != PLAN_FILE_VERSION {
            return Err(PlannerError::PlanFile(format!(
                "Plan version mismatch: expected {PLAN_FILE_VERSION}, got {}",
                file.version
            )));
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::entities::{Goal, ResourceKind};
    use crate::search::Planner;
    use crate::snapshot::{ResourceSnapshot, UnitSnapshot, WorldSnapshot};

    fn single_trip() -> Plan {
        let snap = WorldSnapshot::new(8, 8)
            .with_unit(UnitSnapshot::depot(1, 0, 0))
            .with_unit(UnitSnapshot::worker(2, 0, 0))
            .with_resource(ResourceSnapshot::new(10, 3, 0, ResourceKind::GoldMine, 500));
        Planner::new(PlannerConfig::default())
            .plan(&snap, Goal::new(100, 0))
            .unwrap()
    }

    #[test]
    fn test_commands_for_single_trip() {
        let plan = single_trip();
        let commands = plan.commands();

        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[0],
            HostCommand::Move {
                unit: UnitId(2),
                target: Position::new(2, 1)
            }
        );
        assert!(matches!(
            commands[1],
            HostCommand::Gather { unit: UnitId(2), resource: ResourceId(10), direction: Some(_) }
        ));
        assert!(matches!(commands[2], HostCommand::Move { .. }));
        assert!(matches!(
            commands[3],
            HostCommand::Deposit { depot: UnitId(1), direction: Some(_), .. }
        ));
    }

    #[test]
    fn test_gather_direction_points_at_node() {
        let plan = single_trip();
        let HostCommand::Gather {
            direction: Some(direction),
            ..
        } = plan.commands()[1]
        else {
            panic!("second command should be a gather");
        };

        // Worker at (2, 1), mine at (3, 0)
        assert_eq!(direction.offset(), (1, -1));
    }

    #[test]
    fn test_display_lists_steps() {
        let text = single_trip().to_string();
        assert!(text.starts_with("4 steps, cost 6"));
        assert!(text.contains("   1. MoveToResource"));
        assert!(text.contains("   4. Deposit"));
    }

    #[test]
    fn test_plan_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.bin");

        let plan = single_trip();
        PlanFile::new("single-trip", plan.clone()).save(&path).unwrap();
        let loaded = PlanFile::load(&path).unwrap();

        assert_eq!(loaded.version, PLAN_FILE_VERSION);
        assert_eq!(loaded.scenario, "single-trip");
        assert_eq!(loaded.plan, plan);
    }

    #[test]
    fn test_plan_file_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.bin");

        let mut file = PlanFile::new("old", single_trip());
        file.version = PLAN_FILE_VERSION + 1;
        file.save(&path).unwrap();

        let err = PlanFile::load(&path).unwrap_err();
        assert!(matches!(err, PlannerError::PlanFile(_)));
    }

    #[test]
    fn test_missing_plan_file() {
        let err = PlanFile::load("/nonexistent/plan.bin").unwrap_err();
        assert!(err.to_string().contains("Failed to read plan file"));
    }
}
