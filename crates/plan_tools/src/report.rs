//! Plan reports in text, JSON and RON.

use clap::ValueEnum;
use plan_core::entities::Goal;
use plan_core::plan::{HostCommand, Plan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable step listing.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// Pretty-printed RON.
    Ron,
}

/// Error rendering a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// RON serialization failed.
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Everything the CLI prints about a solved scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    /// Scenario name.
    pub scenario: String,
    /// Heuristic the search used.
    pub heuristic: String,
    /// Goal that was planned for.
    pub goal: Goal,
    /// The plan itself.
    pub plan: Plan,
    /// Host commands, in issue order.
    pub commands: Vec<HostCommand>,
}

impl PlanReport {
    /// Build a report for `plan`.
    #[must_use]
    pub fn new(scenario: impl Into<String>, heuristic: &str, goal: Goal, plan: Plan) -> Self {
        let commands = plan.commands();
        Self {
            scenario: scenario.into(),
            heuristic: heuristic.to_string(),
            goal,
            plan,
            commands,
        }
    }

    /// Render in the requested format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, format: OutputFormat) -> Result<String, ReportError> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Ron => Ok(ron::ser::to_string_pretty(
                self,
                ron::ser::PrettyConfig::default(),
            )?),
        }
    }

    fn to_text(&self) -> String {
        let stats = &self.plan.stats;
        let mut out = format!(
            "Scenario: {}\nGoal: {} gold, {} wood\nHeuristic: {}\n",
            self.scenario, self.goal.required_gold, self.goal.required_wood, self.heuristic
        );
        out.push_str(&format!(
            "Search: {} expanded, {} generated, {} pruned, frontier peak {}, {}us\n\n",
            stats.expanded, stats.generated, stats.pruned, stats.max_frontier, stats.elapsed_us
        ));
        out.push_str(&format!("{}\n", self.plan));
        if !self.commands.is_empty() {
            out.push_str("\nCommands:\n");
            for command in &self.commands {
                out.push_str(&format!("  {command}\n"));
            }
        }
        out
    }
}
