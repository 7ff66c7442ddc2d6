//! Scenario loading and validation.
//!
//! A scenario bundles a world snapshot, a goal and planner settings in one
//! RON file. Scenario files are what the CLI plans, validates and batches.

use std::path::{Path, PathBuf};

use plan_core::config::PlannerConfig;
use plan_core::entities::Goal;
use plan_core::error::SnapshotError;
use plan_core::snapshot::WorldSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The snapshot cannot seed a search.
    #[error("Invalid scenario snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
    /// The planner settings are unusable.
    #[error("Invalid scenario config: {0}")]
    InvalidConfig(String),
}

/// A complete planning scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Starting world.
    pub snapshot: WorldSnapshot,
    /// Stockpile to reach.
    pub goal: Goal,
    /// Planner settings; omitted fields use defaults.
    #[serde(default)]
    pub config: PlannerConfig,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Check that the scenario can seed a search without running one.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.config.harvest_yield == 0 {
            return Err(ScenarioError::InvalidConfig(
                "harvest_yield must be positive".into(),
            ));
        }
        if self.config.build.enabled && self.config.build.worker_cap == 0 {
            return Err(ScenarioError::InvalidConfig(
                "build enabled with a worker cap of zero".into(),
            ));
        }
        self.snapshot.validate(self.config.harvest_yield)?;
        Ok(())
    }
}

/// All `.ron` files directly inside `dir`, sorted by path.
pub fn find_scenarios<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, ScenarioError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ScenarioError::FileNotFound(dir.display().to_string()));
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
