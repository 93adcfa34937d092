//! Scenario definitions and execution
//!
//! A scenario file is an ordered, possibly nested list of step
//! definitions with scripted outcomes. Scenarios supply the resolved step
//! invocations the engine consumes; running one produces a sealed
//! `TestOutcome`.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::executor::{Step, StepOutcome, StepRunner};
use crate::listener::{NarrationListener, TestIdentifier};
use crate::models::{FailureKind, StepFailure, StepStatus, TestOutcome};
use crate::snapshot::{NoSnapshots, SnapshotCapture};

/// Scenario loading and validation errors
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scenario: {0}")]
    Parse(String),

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// Scripted outcome of a scenario step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptedOutcome {
    #[default]
    Success,
    Failure,
    Error,
    Ignored,
    Pending,
    /// Succeed, then resolve the remaining steps of this group as ignored
    IgnoreRemaining,
    /// Succeed, then resolve the remaining steps of this group as pending
    PendingRemaining,
}

/// One scripted step; a step with children is a group and derives its
/// status from them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedStep {
    pub description: String,

    #[serde(default)]
    pub outcome: ScriptedOutcome,

    /// Failure message, used when outcome is failure or error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Longer failure detail, e.g. a backtrace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ScriptedStep>,
}

impl ScriptedStep {
    fn scripted_failure(&self, kind: FailureKind) -> StepFailure {
        StepFailure {
            kind,
            message: self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} failed", self.description)),
            detail: self.detail.clone(),
        }
    }
}

impl Step for ScriptedStep {
    fn invoke(&self, runner: &mut StepRunner<'_>) -> StepOutcome {
        if !self.children.is_empty() {
            run_scripted(runner, &self.children);
            return StepOutcome::Success;
        }
        match self.outcome {
            ScriptedOutcome::Success => StepOutcome::Success,
            ScriptedOutcome::Failure => {
                StepOutcome::Failure(self.scripted_failure(FailureKind::Assertion))
            }
            ScriptedOutcome::Error => {
                StepOutcome::Failure(self.scripted_failure(FailureKind::Fault))
            }
            ScriptedOutcome::Ignored => StepOutcome::Ignored,
            ScriptedOutcome::Pending => StepOutcome::Pending,
            ScriptedOutcome::IgnoreRemaining => {
                runner.ignore_remaining();
                StepOutcome::Success
            }
            ScriptedOutcome::PendingRemaining => {
                runner.pending_remaining();
                StepOutcome::Success
            }
        }
    }
}

/// Run a sequence of scripted steps through the step runner.
///
/// Steps declared ignored or pending are recorded without ever executing
/// their bodies (children included).
pub fn run_scripted(runner: &mut StepRunner<'_>, steps: &[ScriptedStep]) {
    for step in steps {
        match step.outcome {
            ScriptedOutcome::Ignored => {
                runner.ignored_step(&step.description);
            }
            ScriptedOutcome::Pending => {
                runner.pending_step(&step.description);
            }
            _ => {
                runner.run_step(&step.description, step);
            }
        }
    }
}

/// A named scenario: one test method's worth of scripted steps
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier, humanized into the default title
    pub name: String,

    /// Explicit title; wins over the derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Owning test class identity, used for the user story link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_class: Option<String>,

    #[serde(default)]
    pub steps: Vec<ScriptedStep>,
}

impl Scenario {
    /// Load a scenario from a JSON or YAML file, by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let scenario = if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };

        scenario.validate()?;
        info!(
            "loaded scenario '{}' with {} root steps from {}",
            scenario.name,
            scenario.steps.len(),
            path.display()
        );
        Ok(scenario)
    }

    pub fn from_json(content: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        serde_yaml::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    /// Check structural requirements: non-empty name and descriptions
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Invalid("scenario name is empty".into()));
        }
        validate_steps(&self.steps)?;
        Ok(())
    }
}

fn validate_steps(steps: &[ScriptedStep]) -> Result<(), ScenarioError> {
    for step in steps {
        if step.description.trim().is_empty() {
            return Err(ScenarioError::Invalid(
                "step description is empty".into(),
            ));
        }
        validate_steps(&step.children)?;
    }
    Ok(())
}

/// Executes scenarios, one isolated listener per run
pub struct ScenarioRunner<C: SnapshotCapture = NoSnapshots> {
    listener: NarrationListener<C>,
}

impl ScenarioRunner<NoSnapshots> {
    pub fn new() -> Self {
        Self {
            listener: NarrationListener::new(),
        }
    }
}

impl Default for ScenarioRunner<NoSnapshots> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SnapshotCapture> ScenarioRunner<C> {
    pub fn with_capture(capture: C) -> Self {
        Self {
            listener: NarrationListener::with_capture(capture),
        }
    }

    /// Run one scenario and seal its outcome
    pub fn run(&mut self, scenario: &Scenario) -> TestOutcome {
        let mut identifier = TestIdentifier::new(&scenario.name);
        if let Some(class) = &scenario.test_class {
            identifier = identifier.with_class(class);
        }

        self.listener.test_started(identifier);
        if let Some(title) = &scenario.title {
            self.listener.set_title(title);
        }

        let mut runner = self.listener.step_runner();
        run_scripted(&mut runner, &scenario.steps);

        self.listener.test_finished()
    }

    /// Run scenarios in order; every scenario gets a fresh recording
    pub fn run_all(&mut self, scenarios: &[Scenario]) -> Vec<TestOutcome> {
        scenarios.iter().map(|s| self.run(s)).collect()
    }
}

/// Aggregate counts over the outcomes of a scenario suite
#[derive(Clone, Debug, Serialize)]
pub struct SuiteSummary {
    pub total: usize,
    pub successful: usize,
    pub pending: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: usize,
    pub total_duration_ms: u64,
}

impl SuiteSummary {
    pub fn new(outcomes: &[TestOutcome]) -> Self {
        let count = |status: StepStatus| outcomes.iter().filter(|o| o.result() == status).count();
        Self {
            total: outcomes.len(),
            successful: count(StepStatus::Success),
            pending: count(StepStatus::Pending),
            ignored: count(StepStatus::Ignored),
            skipped: count(StepStatus::Skipped),
            failed: count(StepStatus::Failure),
            errors: count(StepStatus::Error),
            total_duration_ms: outcomes.iter().map(TestOutcome::duration_ms).sum(),
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_successful(&self) -> bool {
        self.successful == self.total
    }

    /// Number of outcomes that ended in failure or error
    pub fn unsuccessful(&self) -> usize {
        self.failed + self.errors
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {} | Success: {} | Failure: {} | Error: {} | Pending: {} | Ignored: {}",
            self.total, self.successful, self.failed, self.errors, self.pending, self.ignored
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(description: &str, outcome: ScriptedOutcome) -> ScriptedStep {
        ScriptedStep {
            description: description.to_string(),
            outcome,
            message: None,
            detail: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_parse_json_scenario() {
        let scenario = Scenario::from_json(
            r#"{
                "name": "should_total_the_cart",
                "steps": [
                    { "description": "add two items" },
                    { "description": "check the total", "outcome": "failure",
                      "message": "expected 42 but got 41" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.name, "should_total_the_cart");
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].outcome, ScriptedOutcome::Success);
        assert_eq!(scenario.steps[1].outcome, ScriptedOutcome::Failure);
    }

    #[test]
    fn test_parse_yaml_scenario_with_nesting() {
        let scenario = Scenario::from_yaml(
            "name: should_navigate\nsteps:\n  - description: open the home page\n    children:\n      - description: wait for the banner\n      - description: dismiss the cookie bar\n",
        )
        .unwrap();

        assert_eq!(scenario.steps.len(), 1);
        assert_eq!(scenario.steps[0].children.len(), 2);
    }

    #[test]
    fn test_unknown_outcome_is_a_parse_error() {
        let result = Scenario::from_json(
            r#"{ "name": "x", "steps": [ { "description": "y", "outcome": "exploded" } ] }"#,
        );
        assert!(matches!(result, Err(ScenarioError::Parse(_))));
    }

    #[test]
    fn test_empty_description_fails_validation() {
        let scenario = Scenario {
            name: "valid".into(),
            title: None,
            test_class: None,
            steps: vec![scripted("  ", ScriptedOutcome::Success)],
        };
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid(_))
        ));
    }

    #[test]
    fn test_run_scenario_with_failure_and_skip() {
        let scenario = Scenario {
            name: "should_fail_in_the_middle".into(),
            title: None,
            test_class: None,
            steps: vec![
                scripted("first", ScriptedOutcome::Success),
                scripted("second", ScriptedOutcome::Failure),
                scripted("third", ScriptedOutcome::Success),
            ],
        };

        let outcome = ScenarioRunner::new().run(&scenario);
        assert_eq!(outcome.result(), StepStatus::Failure);
        assert_eq!(outcome.steps()[2].result(), StepStatus::Skipped);
        assert_eq!(
            outcome.failure_cause().unwrap().message,
            "second failed"
        );
    }

    #[test]
    fn test_run_scenario_with_nested_group_failure() {
        let scenario = Scenario::from_json(
            r#"{
                "name": "nested_failure",
                "steps": [
                    { "description": "group g", "children": [
                        { "description": "subgroup h", "children": [
                            { "description": "breaks", "outcome": "failure" }
                        ] }
                    ] },
                    { "description": "after the group" }
                ]
            }"#,
        )
        .unwrap();

        let outcome = ScenarioRunner::new().run(&scenario);
        let g = &outcome.steps()[0];
        assert_eq!(g.result(), StepStatus::Failure);
        assert_eq!(g.children()[0].result(), StepStatus::Failure);
        assert_eq!(outcome.steps()[1].result(), StepStatus::Skipped);
    }

    #[test]
    fn test_ignore_remaining_is_scoped_to_its_group() {
        let scenario = Scenario::from_json(
            r#"{
                "name": "partial_group",
                "steps": [
                    { "description": "group", "children": [
                        { "description": "runs", "outcome": "ignore-remaining" },
                        { "description": "not reached" },
                        { "description": "also not reached" }
                    ] },
                    { "description": "outer still runs" }
                ]
            }"#,
        )
        .unwrap();

        let outcome = ScenarioRunner::new().run(&scenario);
        let group = &outcome.steps()[0];
        assert_eq!(group.children()[1].result(), StepStatus::Ignored);
        assert_eq!(group.children()[2].result(), StepStatus::Ignored);
        assert_eq!(outcome.steps()[1].result(), StepStatus::Success);
    }

    #[test]
    fn test_declared_ignored_group_never_runs_children() {
        let scenario = Scenario::from_json(
            r#"{
                "name": "ignored_group",
                "steps": [
                    { "description": "skipped wholesale", "outcome": "ignored",
                      "children": [ { "description": "would fail", "outcome": "failure" } ] }
                ]
            }"#,
        )
        .unwrap();

        let outcome = ScenarioRunner::new().run(&scenario);
        assert_eq!(outcome.result(), StepStatus::Ignored);
        // The scripted children were never executed, so none were recorded
        assert!(outcome.steps()[0].children().is_empty());
    }

    #[test]
    fn test_explicit_scenario_title() {
        let scenario = Scenario {
            name: "technical_name".into(),
            title: Some("Adding two items totals correctly".into()),
            test_class: Some("cart::AddingItems".into()),
            steps: vec![scripted("only step", ScriptedOutcome::Success)],
        };

        let outcome = ScenarioRunner::new().run(&scenario);
        assert_eq!(outcome.title(), Some("Adding two items totals correctly"));
        assert_eq!(outcome.user_story().unwrap().id, "cart::AddingItems");
    }

    #[test]
    fn test_suite_summary_counts() {
        let mut runner = ScenarioRunner::new();
        let outcomes = runner.run_all(&[
            Scenario {
                name: "passes".into(),
                title: None,
                test_class: None,
                steps: vec![scripted("ok", ScriptedOutcome::Success)],
            },
            Scenario {
                name: "fails".into(),
                title: None,
                test_class: None,
                steps: vec![scripted("broken", ScriptedOutcome::Failure)],
            },
            Scenario {
                name: "undefined".into(),
                title: None,
                test_class: None,
                steps: vec![],
            },
        ]);

        let summary = SuiteSummary::new(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.unsuccessful(), 1);
        assert!(!summary.is_all_successful());
    }
}
