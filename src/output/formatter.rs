//! Output formatters for test outcomes
//!
//! Provides JSON, Table, CSV, and summary output formats for the sealed
//! outcome tree. Formatters only ever read the tree; aggregation is done
//! by the time they see it.

#![allow(dead_code)]

use serde::Serialize;
use std::io::Write;

use crate::models::{StepFailure, StepStatus, TestOutcome, TestStep, UserStory};
use crate::scenario::SuiteSummary;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }
}

/// Serializable view of a step with its resolved status
#[derive(Serialize)]
struct StepJson<'a> {
    description: &'a str,
    status: StepStatus,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'a StepFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifact: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<StepJson<'a>>,
}

impl<'a> StepJson<'a> {
    fn from_step(step: &'a TestStep) -> Self {
        Self {
            description: step.description(),
            status: step.result(),
            duration_ms: step.duration_ms(),
            failure: step.failure(),
            artifact: step.artifact().map(|a| a.as_str()),
            children: step.children().iter().map(StepJson::from_step).collect(),
        }
    }
}

/// Serializable view of a sealed outcome
#[derive(Serialize)]
struct OutcomeJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    result: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_story: Option<&'a UserStory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_cause: Option<&'a StepFailure>,
    duration_ms: u64,
    steps: Vec<StepJson<'a>>,
}

impl<'a> OutcomeJson<'a> {
    fn from_outcome(outcome: &'a TestOutcome) -> Self {
        Self {
            title: outcome.title(),
            result: outcome.result(),
            user_story: outcome.user_story(),
            failure_cause: outcome.failure_cause(),
            duration_ms: outcome.duration_ms(),
            steps: outcome.steps().iter().map(StepJson::from_step).collect(),
        }
    }
}

/// Outcome formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format one sealed outcome
    pub fn format_outcome(&self, outcome: &TestOutcome) -> String {
        match self.format {
            OutputFormat::Table => self.format_outcome_table(outcome),
            OutputFormat::Json => {
                serde_json::to_string(&OutcomeJson::from_outcome(outcome)).unwrap_or_default()
            }
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(&OutcomeJson::from_outcome(outcome))
                    .unwrap_or_default()
            }
            OutputFormat::Csv => self.format_outcome_csv(outcome),
            OutputFormat::Summary => self.format_outcome_summary(outcome),
        }
    }

    fn status_str(&self, status: StepStatus) -> String {
        let plain = format!("{} {}", status.symbol(), status);
        if !self.colorize {
            return plain;
        }
        match status {
            StepStatus::Success => format!("\x1b[32m{plain}\x1b[0m"),
            StepStatus::Failure | StepStatus::Error => format!("\x1b[31m{plain}\x1b[0m"),
            StepStatus::Skipped | StepStatus::Pending => format!("\x1b[33m{plain}\x1b[0m"),
            StepStatus::Ignored => plain,
        }
    }

    fn format_outcome_table(&self, outcome: &TestOutcome) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(&format!(
            "{} - {}\n",
            outcome.title().unwrap_or("(untitled)"),
            self.status_str(outcome.result())
        ));
        if let Some(story) = outcome.user_story() {
            output.push_str(&format!("Story: {story}\n"));
        }
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        for step in outcome.steps() {
            self.push_step_lines(&mut output, step, 1);
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        if let Some(cause) = outcome.failure_cause() {
            output.push_str(&format!("Cause: {cause}\n"));
            if let Some(detail) = &cause.detail {
                output.push_str(&format!("       {detail}\n"));
            }
        }
        output.push_str(&format!(
            "Steps: {} | Duration: {}ms\n",
            outcome.step_count(),
            outcome.duration_ms()
        ));

        output
    }

    fn push_step_lines(&self, output: &mut String, step: &TestStep, depth: usize) {
        let indent = "  ".repeat(depth);
        output.push_str(&format!(
            "{}{} {} [{}ms]",
            indent,
            self.status_str(step.result()),
            step.description(),
            step.duration_ms()
        ));
        if let Some(failure) = step.failure() {
            output.push_str(&format!(" - {failure}"));
        }
        if let Some(artifact) = step.artifact() {
            output.push_str(&format!(" ({artifact})"));
        }
        output.push('\n');

        for child in step.children() {
            self.push_step_lines(output, child, depth + 1);
        }
    }

    fn format_outcome_csv(&self, outcome: &TestOutcome) -> String {
        let mut output = String::new();
        output.push_str("depth,description,status,duration_ms,message\n");
        for step in outcome.steps() {
            push_csv_rows(&mut output, step, 0);
        }
        output
    }

    fn format_outcome_summary(&self, outcome: &TestOutcome) -> String {
        format!(
            "{} {} ({} steps, {}ms)",
            outcome.result().symbol(),
            outcome.title().unwrap_or("(untitled)"),
            outcome.step_count(),
            outcome.duration_ms()
        )
    }

    /// Format a suite summary
    pub fn format_suite(&self, summary: &SuiteSummary) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(summary).unwrap_or_default(),
            OutputFormat::JsonPretty => {
                serde_json::to_string_pretty(summary).unwrap_or_default()
            }
            OutputFormat::Summary | OutputFormat::Csv => format!("{summary}"),
            OutputFormat::Table => {
                let mut output = String::new();
                output.push('\n');
                output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
                output.push_str(&format!("{summary}\n"));
                output.push_str(&format!(
                    "Pass Rate: {:.1}% | Duration: {}ms\n",
                    summary.pass_rate(),
                    summary.total_duration_ms
                ));
                output
            }
        }
    }
}

fn push_csv_rows(output: &mut String, step: &TestStep, depth: usize) {
    let message = step
        .failure()
        .map(|f| f.message.replace('"', "\"\""))
        .unwrap_or_default();
    output.push_str(&format!(
        "{},{},{},{},\"{}\"\n",
        depth,
        escape_csv(step.description()),
        step.result(),
        step.duration_ms(),
        message
    ));
    for child in step.children() {
        push_csv_rows(output, child, depth + 1);
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

/// Write a formatted outcome to a file
pub fn write_outcome_to_file(
    path: &str,
    outcome: &TestOutcome,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let formatter = ResultFormatter::new(format).no_color();
    let content = formatter.format_outcome(outcome);

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Scenario, ScenarioRunner, ScriptedOutcome, ScriptedStep};

    fn sample_outcome() -> TestOutcome {
        let scenario = Scenario {
            name: "should_render_nicely".into(),
            title: None,
            test_class: None,
            steps: vec![
                ScriptedStep {
                    description: "open the page".into(),
                    outcome: ScriptedOutcome::Success,
                    message: None,
                    detail: None,
                    children: Vec::new(),
                },
                ScriptedStep {
                    description: "check the heading".into(),
                    outcome: ScriptedOutcome::Failure,
                    message: Some("heading missing".into()),
                    detail: None,
                    children: Vec::new(),
                },
            ],
        };
        ScenarioRunner::new().run(&scenario)
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_table_output_shows_the_tree() {
        let output = ResultFormatter::new(OutputFormat::Table)
            .no_color()
            .format_outcome(&sample_outcome());

        assert!(output.contains("Should render nicely"));
        assert!(output.contains("open the page"));
        assert!(output.contains("heading missing"));
        assert!(output.contains("Cause: heading missing"));
    }

    #[test]
    fn test_json_output_resolves_statuses() {
        let output = ResultFormatter::new(OutputFormat::Json).format_outcome(&sample_outcome());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["result"], "failure");
        assert_eq!(value["steps"][0]["status"], "success");
        assert_eq!(value["steps"][1]["failure"]["message"], "heading missing");
    }

    #[test]
    fn test_csv_output_flattens_the_tree() {
        let output = ResultFormatter::new(OutputFormat::Csv).format_outcome(&sample_outcome());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("depth,description"));
        assert!(lines[1].starts_with("0,open the page,SUCCESS"));
    }

    #[test]
    fn test_summary_line() {
        let output =
            ResultFormatter::new(OutputFormat::Summary).format_outcome(&sample_outcome());
        assert!(output.contains("Should render nicely"));
        assert!(output.contains("2 steps"));
    }
}
