//! Economy planner - command-line tools
//!
//! # Usage
//!
//! ```bash
//! # Plan a scenario and print the steps
//! cargo run -p plan_tools -- plan --scenario scenarios/single_trip.ron
//!
//! # Plan, print JSON and keep the plan for later
//! cargo run -p plan_tools -- plan --scenario scenarios/two_mines.ron \
//!     --format json --save mines.plan
//!
//! # Check scenario files without planning
//! cargo run -p plan_tools -- validate scenarios/*.ron
//!
//! # Plan a whole directory in parallel
//! cargo run -p plan_tools -- batch --dir scenarios --parallel 4
//!
//! # Print a saved plan
//! cargo run -p plan_tools -- show --plan mines.plan
//! ```
//!
//! Reports go to stdout, logs to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use plan_core::config::HeuristicKind;
use plan_core::plan::PlanFile;
use plan_core::search::Planner;
use plan_tools::batch::{run_batch, BatchConfig, BatchOutcome};
use plan_tools::report::{OutputFormat, PlanReport};
use plan_tools::scenario::Scenario;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "plan-tools")]
#[command(about = "Economy planner for RTS worlds")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Heuristic choice on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeuristicArg {
    /// Farthest node distance times remaining trips
    TripDistance,
    /// Admissible harvest/deposit count
    HarvestLowerBound,
    /// Uniform-cost search
    Zero,
}

impl From<HeuristicArg> for HeuristicKind {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::TripDistance => HeuristicKind::TripDistance,
            HeuristicArg::HarvestLowerBound => HeuristicKind::HarvestLowerBound,
            HeuristicArg::Zero => HeuristicKind::Zero,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a single scenario
    Plan {
        /// Scenario file (RON)
        #[arg(short, long)]
        scenario: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Write the plan to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Override the expansion limit
        #[arg(long)]
        max_expansions: Option<usize>,

        /// Override the heuristic
        #[arg(long, value_enum)]
        heuristic: Option<HeuristicArg>,
    },

    /// Validate scenario files
    Validate {
        /// Scenario files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Plan every scenario in a directory
    Batch {
        /// Directory of .ron scenarios
        #[arg(short, long, default_value = "scenarios")]
        dir: PathBuf,

        /// Maximum parallel searches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Override every scenario's expansion limit
        #[arg(long)]
        max_expansions: Option<usize>,

        /// Write results as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a saved plan
    Show {
        /// Plan file written by `plan --save`
        #[arg(short, long)]
        plan: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr, stdout is for reports
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let ok = match cli.command {
        Commands::Plan {
            scenario,
            format,
            save,
            max_expansions,
            heuristic,
        } => cmd_plan(&scenario, format, save, max_expansions, heuristic),
        Commands::Validate { files } => cmd_validate(&files),
        Commands::Batch {
            dir,
            parallel,
            max_expansions,
            output,
        } => cmd_batch(dir, parallel, max_expansions, output),
        Commands::Show { plan, format } => cmd_show(&plan, format),
    };

    if !ok {
        std::process::exit(1);
    }
}

fn cmd_plan(
    path: &Path,
    format: OutputFormat,
    save: Option<PathBuf>,
    max_expansions: Option<usize>,
    heuristic: Option<HeuristicArg>,
) -> bool {
    let scenario = match Scenario::load(path).and_then(|s| s.validate().map(|()| s)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            return false;
        }
    };

    let mut config = scenario.config.clone();
    if max_expansions.is_some() {
        config.budget.max_expansions = max_expansions;
    }
    if let Some(kind) = heuristic {
        config.heuristic = kind.into();
    }

    tracing::info!("Planning '{}'", scenario.name);
    let planner = Planner::new(config);
    let plan = match planner.plan(&scenario.snapshot, scenario.goal) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("Planning failed: {e}");
            return false;
        }
    };

    if let Some(save) = save {
        if let Err(e) = PlanFile::new(scenario.name.clone(), plan.clone()).save(&save) {
            tracing::error!("Failed to save plan: {e}");
            return false;
        }
        tracing::info!("Plan saved to {}", save.display());
    }

    let report = PlanReport::new(scenario.name, planner.heuristic_name(), scenario.goal, plan);
    print_report(&report, format)
}

fn cmd_validate(files: &[PathBuf]) -> bool {
    let mut failures = 0;
    for path in files {
        match Scenario::load(path).and_then(|s| s.validate()) {
            Ok(()) => tracing::info!("{}: ok", path.display()),
            Err(e) => {
                tracing::error!("{}: {e}", path.display());
                failures += 1;
            }
        }
    }
    tracing::info!("{} of {} files valid", files.len() - failures, files.len());
    failures == 0
}

fn cmd_batch(
    dir: PathBuf,
    parallel: usize,
    max_expansions: Option<usize>,
    output: Option<PathBuf>,
) -> bool {
    let config = BatchConfig::new(dir)
        .with_parallel(parallel)
        .with_max_expansions(max_expansions);
    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Batch failed: {e}");
            return false;
        }
    };

    for entry in &results.entries {
        let name = entry
            .name
            .clone()
            .unwrap_or_else(|| entry.path.display().to_string());
        match &entry.outcome {
            BatchOutcome::Solved {
                cost,
                steps,
                expanded,
            } => println!(
                "{name:<24} solved  cost {cost:>5}  steps {steps:>4}  expanded {expanded}"
            ),
            BatchOutcome::Failed { message } => println!("{name:<24} FAILED  {message}"),
        }
    }
    println!(
        "\n{} / {} solved, total cost {}",
        results.summary.solved, results.summary.total, results.summary.total_cost
    );

    if let Some(output) = output {
        if let Err(e) = results.save(&output) {
            tracing::error!("Failed to write results: {e}");
            return false;
        }
        tracing::info!("Results written to {}", output.display());
    }
    true
}

fn cmd_show(path: &Path, format: OutputFormat) -> bool {
    let file = match PlanFile::load(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("{e}");
            return false;
        }
    };
    match format {
        OutputFormat::Text => {
            println!("Scenario: {} (plan file v{})", file.scenario, file.version);
            println!("{}", file.plan);
            for command in file.plan.commands() {
                println!("  {command}");
            }
            true
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&file.plan) {
            Ok(json) => {
                println!("{json}");
                true
            }
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        },
        OutputFormat::Ron => {
            match ron::ser::to_string_pretty(&file.plan, ron::ser::PrettyConfig::default()) {
                Ok(text) => {
                    println!("{text}");
                    true
                }
                Err(e) => {
                    tracing::error!("{e}");
                    false
                }
            }
        }
    }
}

fn print_report(report: &PlanReport, format: OutputFormat) -> bool {
    match report.render(format) {
        Ok(text) => {
            println!("{text}");
            true
        }
        Err(e) => {
            tracing::error!("{e}");
            false
        }
    }
}
