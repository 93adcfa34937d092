//! narrator - Acceptance test step narration and result aggregation
//!
//! A CLI tool around a step instrumentation engine: scenario files
//! describe ordered, possibly nested step invocations; the engine
//! reconstructs the step tree, applies rollup and skip-propagation rules,
//! and seals one outcome per scenario for printing or storage.
//!
//! ## Usage
//!
//! ```bash
//! # Run a scenario and print the outcome tree
//! narrator run checkout.json
//!
//! # Run several scenarios, store their outcomes under a suite
//! narrator run smoke/*.yaml --store --suite smoke
//!
//! # Inspect stored outcomes
//! narrator results --suite smoke
//! narrator results --suite smoke --latest
//! narrator results --suite smoke --export latest.csv
//!
//! # Write a default configuration file
//! narrator config --init narrator.json
//! ```

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::Path;

mod cli;
mod config;
mod executor;
mod listener;
mod models;
mod output;
mod results;
mod scenario;
mod snapshot;
mod utils;

use cli::{Args, Command};
use config::AppConfig;
use output::{write_outcome_to_file, OutputFormat, ResultFormatter};
use results::{ExportFormat, ResultsStorage, StoredOutcome};
use scenario::{Scenario, ScenarioRunner, SuiteSummary};
use utils::logger::{init_logger, LogLevel};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match args.command {
        Command::Run(run_args) => run_scenarios(run_args),
        Command::Results(results_args) => show_results(results_args),
        Command::Config(config_args) => manage_config(config_args),
    }
}

fn run_scenarios(args: cli::RunArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let format_name = args.format.as_deref().unwrap_or(&config.default_format);
    let format = OutputFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown output format: {format_name}"))?;

    let mut formatter = ResultFormatter::new(format);
    if args.no_color || !config.color {
        formatter = formatter.no_color();
    }

    let storage = if args.store || config.store_results {
        Some(open_storage(
            args.results_dir.as_deref().or(config.results_dir.as_deref()),
        )?)
    } else {
        None
    };
    let suite = args.suite.as_deref().unwrap_or(&config.suite);

    let mut runner = ScenarioRunner::new();
    let mut outcomes = Vec::new();

    for path in &args.scenarios {
        let scenario = Scenario::load(path)?;
        let outcome = runner.run(&scenario);
        println!("{}", formatter.format_outcome(&outcome));

        if let Some(storage) = &storage {
            let stored = StoredOutcome::from_outcome(suite, &outcome);
            storage.save(&stored)?;
        }
        outcomes.push(outcome);
    }

    if let Some(output_path) = &args.output {
        if let Some(last) = outcomes.last() {
            write_outcome_to_file(output_path, last, format)?;
        }
    }

    let summary = SuiteSummary::new(&outcomes);
    if outcomes.len() > 1 {
        println!("{}", formatter.format_suite(&summary));
    }

    if summary.unsuccessful() > 0 {
        return Err(anyhow!(
            "{} of {} scenarios did not succeed",
            summary.unsuccessful(),
            summary.total
        ));
    }
    Ok(())
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let storage = open_storage(args.results_dir.as_deref())?;

    if args.suites {
        for suite in storage.list_suites()? {
            println!("{suite}");
        }
        return Ok(());
    }

    if let Some(run_id) = &args.delete {
        storage.delete(&args.suite, run_id)?;
        return Ok(());
    }

    if let Some(export_path) = &args.export {
        let outcome = match &args.run {
            Some(id) => storage.load(&args.suite, id)?,
            None => storage
                .latest(&args.suite)?
                .ok_or_else(|| anyhow!("No runs stored for suite '{}'", args.suite))?,
        };
        let format = ExportFormat::from_extension(export_path)
            .ok_or_else(|| anyhow!("Cannot infer export format from {}", export_path.display()))?;
        storage.export(&outcome, export_path, format)?;
        return Ok(());
    }

    if let Some(run_id) = &args.show {
        let outcome = storage.load(&args.suite, run_id)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if args.latest {
        let outcome = storage
            .latest(&args.suite)?
            .ok_or_else(|| anyhow!("No runs stored for suite '{}'", args.suite))?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let runs = storage.list_runs(&args.suite)?;
    if runs.is_empty() {
        println!("No runs stored for suite '{}'", args.suite);
        return Ok(());
    }
    for run in runs {
        println!(
            "{}  {:7}  {}  {}",
            run.id,
            run.result.to_string(),
            run.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            run.title.unwrap_or_default()
        );
    }
    Ok(())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    if let Some(path) = &args.init {
        AppConfig::default().save(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

fn open_storage(dir: Option<&Path>) -> Result<ResultsStorage> {
    let storage = match dir {
        Some(dir) => ResultsStorage::new(dir),
        None => ResultsStorage::default_dir()?,
    };
    storage.ensure_dir()?;
    Ok(storage)
}
