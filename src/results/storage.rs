//! Results storage and retrieval
//!
//! Persists sealed test outcomes as JSON, one file per run, partitioned
//! by suite. The stored tree carries resolved statuses so downstream
//! writers never re-run aggregation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{StepFailure, StepStatus, TestOutcome, TestStep, UserStory};

/// Stored step with its resolved status
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredStep {
    /// Step description
    pub description: String,

    /// Resolved status (derived for groups)
    pub status: StepStatus,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Failure details (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,

    /// Snapshot artifact reference (if captured)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,

    /// Nested steps, in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StoredStep>,
}

impl StoredStep {
    /// Convert from a sealed step node
    pub fn from_step(step: &TestStep) -> Self {
        Self {
            description: step.description().to_string(),
            status: step.result(),
            duration_ms: step.duration_ms(),
            failure: step.failure().cloned(),
            artifact: step.artifact().map(|a| a.as_str().to_string()),
            children: step.children().iter().map(StoredStep::from_step).collect(),
        }
    }
}

/// Stored test outcome containing the full step tree
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredOutcome {
    /// Unique run ID
    pub id: String,

    /// Suite this outcome belongs to
    pub suite: String,

    /// Resolved title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// User story link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_story: Option<UserStory>,

    /// Aggregate result
    pub result: StepStatus,

    /// Primary failure cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_cause: Option<StepFailure>,

    /// Timestamp when the outcome was stored
    pub recorded_at: DateTime<Utc>,

    /// Total duration in milliseconds
    pub duration_ms: u64,

    /// Number of steps at all depths
    pub step_count: usize,

    /// Root-level steps
    pub steps: Vec<StoredStep>,
}

impl StoredOutcome {
    /// Convert a sealed outcome for storage under the given suite
    pub fn from_outcome(suite: impl Into<String>, outcome: &TestOutcome) -> Self {
        Self {
            id: generate_run_id(),
            suite: suite.into(),
            title: outcome.title().map(str::to_string),
            user_story: outcome.user_story().cloned(),
            result: outcome.result(),
            failure_cause: outcome.failure_cause().cloned(),
            recorded_at: Utc::now(),
            duration_ms: outcome.duration_ms(),
            step_count: outcome.step_count(),
            steps: outcome.steps().iter().map(StoredStep::from_step).collect(),
        }
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Brief run information
#[derive(Clone, Debug)]
pub struct RunInfo {
    pub id: String,
    pub suite: String,
    pub recorded_at: DateTime<Utc>,
    pub result: StepStatus,
    pub title: Option<String>,
}

/// Export format
#[derive(Clone, Copy, Debug)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
    }
}

/// Results storage manager
pub struct ResultsStorage {
    /// Base directory for results
    base_dir: PathBuf,
}

impl ResultsStorage {
    /// Create a new results storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create with default directory
    pub fn default_dir() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("narrator")
            .join("results");
        Ok(Self::new(base_dir))
    }

    /// Ensure storage directory exists
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    /// Get path for a suite's results
    fn suite_dir(&self, suite: &str) -> PathBuf {
        self.base_dir.join(suite.to_lowercase())
    }

    /// Get path for a specific run
    fn run_path(&self, suite: &str, run_id: &str) -> PathBuf {
        self.suite_dir(suite).join(format!("{run_id}.json"))
    }

    /// Save a stored outcome
    pub fn save(&self, outcome: &StoredOutcome) -> Result<PathBuf> {
        let suite_dir = self.suite_dir(&outcome.suite);
        fs::create_dir_all(&suite_dir)?;

        let path = self.run_path(&outcome.suite, &outcome.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, outcome).context("Failed to write results")?;

        info!("Saved outcome to {}", path.display());
        Ok(path)
    }

    /// Load a stored outcome
    pub fn load(&self, suite: &str, run_id: &str) -> Result<StoredOutcome> {
        let path = self.run_path(suite, run_id);
        self.load_from_path(&path)
    }

    /// Load from a specific path
    pub fn load_from_path(&self, path: &Path) -> Result<StoredOutcome> {
        let file = File::open(path).context("Failed to open results file")?;
        let reader = BufReader::new(file);

        let outcome: StoredOutcome =
            serde_json::from_reader(reader).context("Failed to parse results")?;

        debug!("Loaded outcome from {}", path.display());
        Ok(outcome)
    }

    /// Load all outcomes for a suite, newest first
    pub fn load_suite(&self, suite: &str) -> Result<Vec<StoredOutcome>> {
        let suite_dir = self.suite_dir(suite);
        if !suite_dir.exists() {
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::new();
        for entry in fs::read_dir(&suite_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        debug!("Failed to load {}: {}", path.display(), e);
                    }
                }
            }
        }

        outcomes.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(outcomes)
    }

    /// List all suites with results
    pub fn list_suites(&self) -> Result<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut suites = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    suites.push(name.to_string());
                }
            }
        }

        suites.sort();
        Ok(suites)
    }

    /// List all runs for a suite, newest first
    pub fn list_runs(&self, suite: &str) -> Result<Vec<RunInfo>> {
        let outcomes = self.load_suite(suite)?;
        Ok(outcomes
            .into_iter()
            .map(|o| RunInfo {
                id: o.id,
                suite: o.suite,
                recorded_at: o.recorded_at,
                result: o.result,
                title: o.title,
            })
            .collect())
    }

    /// Get latest run for a suite
    pub fn latest(&self, suite: &str) -> Result<Option<StoredOutcome>> {
        let outcomes = self.load_suite(suite)?;
        Ok(outcomes.into_iter().next())
    }

    /// Delete a run
    pub fn delete(&self, suite: &str, run_id: &str) -> Result<()> {
        let path = self.run_path(suite, run_id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted run: {}", path.display());
        }
        Ok(())
    }

    /// Export an outcome to a file
    pub fn export(&self, outcome: &StoredOutcome, path: &Path, format: ExportFormat) -> Result<()> {
        match format {
            ExportFormat::Json => {
                let file = File::create(path)?;
                let writer = BufWriter::new(file);
                serde_json::to_writer_pretty(writer, outcome)?;
            }
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;

                writer.write_record([
                    "depth",
                    "description",
                    "status",
                    "duration_ms",
                    "message",
                    "artifact",
                ])?;

                for step in &outcome.steps {
                    write_csv_rows(&mut writer, step, 0)?;
                }
                writer.flush()?;
            }
        }

        info!("Exported outcome to {}", path.display());
        Ok(())
    }
}

fn write_csv_rows(
    writer: &mut csv::Writer<File>,
    step: &StoredStep,
    depth: usize,
) -> Result<()> {
    writer.write_record([
        depth.to_string(),
        step.description.clone(),
        step.status.to_string(),
        step.duration_ms.to_string(),
        step.failure
            .as_ref()
            .map(|f| f.message.clone())
            .unwrap_or_default(),
        step.artifact.clone().unwrap_or_default(),
    ])?;

    for child in &step.children {
        write_csv_rows(writer, child, depth + 1)?;
    }
    Ok(())
}
