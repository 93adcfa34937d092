//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Acceptance test step narration and result aggregation engine
#[derive(Parser, Debug)]
#[command(name = "narrator")]
#[command(version)]
#[command(about = "Run scripted scenarios and aggregate their step outcomes")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run scenario files and print their outcomes
    Run(RunArgs),

    /// View and export stored outcomes
    Results(ResultsArgs),

    /// Manage tool configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario files (JSON or YAML)
    #[arg(required = true)]
    pub scenarios: Vec<PathBuf>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Store sealed outcomes after the run
    #[arg(short, long)]
    pub store: bool,

    /// Suite name used when storing results
    #[arg(long)]
    pub suite: Option<String>,

    /// Results directory override
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Write the formatted outcome of the last scenario to a file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Suite to inspect
    #[arg(short, long, default_value = "default")]
    pub suite: String,

    /// Show a specific run by ID
    #[arg(long)]
    pub show: Option<String>,

    /// Show the latest run
    #[arg(long)]
    pub latest: bool,

    /// Export a run to a file (format chosen by extension)
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Run ID to export (defaults to the latest run)
    #[arg(long)]
    pub run: Option<String>,

    /// Delete a run by ID
    #[arg(long)]
    pub delete: Option<String>,

    /// List all suites with stored results
    #[arg(long)]
    pub suites: bool,

    /// Results directory override
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Write a default configuration file to the given path
    #[arg(long)]
    pub init: Option<PathBuf>,

    /// Configuration file to show
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let args = Args::parse_from([
            "narrator", "run", "scenario.json", "--format", "json", "--store",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.scenarios.len(), 1);
                assert_eq!(run.format.as_deref(), Some("json"));
                assert!(run.store);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_parse_results_command() {
        let args = Args::parse_from(["narrator", "results", "--suite", "smoke", "--latest"]);
        match args.command {
            Command::Results(results) => {
                assert_eq!(results.suite, "smoke");
                assert!(results.latest);
            }
            _ => panic!("expected results command"),
        }
    }
}
