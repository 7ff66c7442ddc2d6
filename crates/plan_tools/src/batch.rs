//! Batch planner over a directory of scenarios.
//!
//! Plans every scenario in parallel using rayon and collects per-scenario
//! outcomes plus an aggregate summary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use plan_core::search::Planner;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scenario::{find_scenarios, Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory holding `.ron` scenarios.
    pub dir: PathBuf,
    /// Maximum parallel searches (0 = use rayon default).
    pub parallel: usize,
    /// Expansion limit applied to every scenario, overriding its own.
    pub max_expansions: Option<usize>,
}

impl BatchConfig {
    /// Create config for a scenario directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the thread count.
    #[must_use]
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel;
        self
    }

    /// Override every scenario's expansion limit.
    #[must_use]
    pub fn with_max_expansions(mut self, limit: Option<usize>) -> Self {
        self.max_expansions = limit;
        self
    }
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOutcome {
    /// A plan was found.
    Solved {
        /// Plan cost.
        cost: u32,
        /// Plan length.
        steps: usize,
        /// Nodes expanded.
        expanded: usize,
    },
    /// Loading or planning failed.
    Failed {
        /// Error message.
        message: String,
    },
}

/// One scenario's entry in the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Scenario file.
    pub path: PathBuf,
    /// Scenario name, if it loaded.
    pub name: Option<String>,
    /// What happened.
    pub outcome: BatchOutcome,
    /// Wall-clock time in microseconds.
    pub elapsed_us: u64,
}

impl BatchEntry {
    /// Whether a plan was found.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Solved { .. })
    }
}

/// Aggregate counts across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Scenarios attempted.
    pub total: usize,
    /// Scenarios solved.
    pub solved: usize,
    /// Scenarios that failed.
    pub failed: usize,
    /// Sum of solved plan costs.
    pub total_cost: u64,
    /// Sum of expanded nodes over solved scenarios.
    pub total_expanded: u64,
}

impl BatchSummary {
    /// Summarize a set of entries.
    #[must_use]
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut summary = Self {
            total: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            match entry.outcome {
                BatchOutcome::Solved { cost, expanded, .. } => {
                    summary.solved += 1;
                    summary.total_cost += u64::from(cost);
                    summary.total_expanded += expanded as u64;
                }
                BatchOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-scenario entries, in path order.
    pub entries: Vec<BatchEntry>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Load, validate and plan one scenario file.
fn run_single(path: &Path, max_expansions: Option<usize>) -> BatchEntry {
    let start = Instant::now();
    let scenario = match Scenario::load(path).and_then(|s| s.validate().map(|()| s)) {
        Ok(scenario) => scenario,
        Err(e) => {
            warn!("Scenario {} failed to load: {}", path.display(), e);
            return BatchEntry {
                path: path.to_path_buf(),
                name: None,
                outcome: BatchOutcome::Failed {
                    message: e.to_string(),
                },
                elapsed_us: elapsed_us(start),
            };
        }
    };

    let mut config = scenario.config.clone();
    if max_expansions.is_some() {
        config.budget.max_expansions = max_expansions;
    }

    let outcome = match Planner::new(config).plan(&scenario.snapshot, scenario.goal) {
        Ok(plan) => {
            debug!(
                "{}: cost {} in {} steps ({} expanded)",
                scenario.name,
                plan.cost,
                plan.len(),
                plan.stats.expanded
            );
            BatchOutcome::Solved {
                cost: plan.cost,
                steps: plan.len(),
                expanded: plan.stats.expanded,
            }
        }
        Err(e) => {
            warn!("Scenario {} failed: {}", scenario.name, e);
            BatchOutcome::Failed {
                message: e.to_string(),
            }
        }
    };

    BatchEntry {
        path: path.to_path_buf(),
        name: Some(scenario.name),
        outcome,
        elapsed_us: elapsed_us(start),
    }
}

/// Plan every scenario in `config.dir`.
///
/// # Errors
///
/// Returns an error only if the directory cannot be listed; individual
/// scenario failures are recorded in the results.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let paths = find_scenarios(&config.dir)?;

    info!(
        "Starting batch run: {} scenarios from {}",
        paths.len(),
        config.dir.display()
    );

    if config.parallel > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel)
            .build_global()
            .ok(); // Ignore if already set
    }

    let entries: Vec<BatchEntry> = paths
        .par_iter()
        .map(|path| run_single(path, config.max_expansions))
        .collect();

    let summary = BatchSummary::from_entries(&entries);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {}/{} solved in {:.2}s",
        summary.solved, summary.total, duration_seconds
    );

    Ok(BatchResults {
        config,
        entries,
        summary,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_test_utils::fixtures;

    fn write_fixtures(dir: &Path) {
        for fixture in fixtures::solvable().into_iter().chain([fixtures::no_gold_mine()]) {
            let path = dir.join(format!("{}.ron", fixture.name));
            std::fs::write(path, fixture.to_ron().unwrap()).unwrap();
        }
    }

    #[test]
    fn test_batch_over_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let results = run_batch(BatchConfig::new(dir.path())).unwrap();
        let total = fixtures::solvable().len() + 1;

        assert_eq!(results.summary.total, total);
        assert_eq!(results.summary.solved, total - 1);
        assert_eq!(results.summary.failed, 1);

        let failed: Vec<_> = results.entries.iter().filter(|e| !e.is_solved()).collect();
        assert_eq!(failed[0].name.as_deref(), Some("no-gold-mine"));
    }

    #[test]
    fn test_entries_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());

        let results = run_batch(BatchConfig::new(dir.path())).unwrap();
        assert!(results.entries.windows(2).all(|w| w[0].path < w[1].path));
    }

    #[test]
    fn test_unparseable_scenario_recorded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.ron"), "(name: ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let results = run_batch(BatchConfig::new(dir.path())).unwrap();
        assert_eq!(results.summary.total, 1);
        assert!(results.entries[0].name.is_none());
        assert!(matches!(results.entries[0].outcome, BatchOutcome::Failed { .. }));
    }

    #[test]
    fn test_expansion_override() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = fixtures::two_small_mines();
        std::fs::write(dir.path().join("mines.ron"), fixture.to_ron().unwrap()).unwrap();

        let results =
            run_batch(BatchConfig::new(dir.path()).with_max_expansions(Some(1))).unwrap();
        match &results.entries[0].outcome {
            BatchOutcome::Failed { message } => assert!(message.contains("expansion limit")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_results_save_load() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(dir.path());
        let results = run_batch(BatchConfig::new(dir.path())).unwrap();

        let out = dir.path().join("out").join("batch.json");
        results.save(&out).unwrap();
        let loaded = BatchResults::load(&out).unwrap();
        assert_eq!(loaded.summary, results.summary);
    }

    #[test]
    fn test_missing_dir() {
        assert!(run_batch(BatchConfig::new("/nonexistent/scenarios")).is_err());
    }
}
