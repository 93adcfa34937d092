//! Step nodes and failure records
//!
//! A `TestStep` is one entry in the step nesting tree: either a leaf step
//! or a step group whose status is derived from its children.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::status::{most_severe, StepStatus};

/// Kind of failure raised by a step body
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// An expected-style check failed
    Assertion,
    /// Any other runtime fault
    Fault,
}

/// Failure details recorded on a step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StepFailure {
    /// Create an assertion-style failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: message.into(),
            detail: None,
        }
    }

    /// Create an unexpected-fault failure
    pub fn fault(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fault,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Status this failure resolves to
    pub fn status(&self) -> StepStatus {
        match self.kind {
            FailureKind::Assertion => StepStatus::Failure,
            FailureKind::Fault => StepStatus::Error,
        }
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Opaque reference to a captured snapshot artifact
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in the step nesting tree.
///
/// Children are kept in insertion order, which is execution order. The
/// recorded status of a group is never authoritative: `result()` derives
/// it from the children.
#[derive(Clone, Debug)]
pub struct TestStep {
    description: String,
    status: Option<StepStatus>,
    children: Vec<TestStep>,
    failure: Option<StepFailure>,
    artifact: Option<ArtifactRef>,
    started_at: DateTime<Utc>,
    duration_ms: u64,
}

impl TestStep {
    /// Create a new, not-yet-finished step
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: None,
            children: Vec::new(),
            failure: None,
            artifact: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Status recorded by the event bus, if any
    pub fn recorded_status(&self) -> Option<StepStatus> {
        self.status
    }

    /// Final status: derived from children for groups, the recorded status
    /// for leaves, `Pending` when nothing was recorded.
    pub fn result(&self) -> StepStatus {
        if self.children.is_empty() {
            self.status.unwrap_or(StepStatus::Pending)
        } else {
            most_severe(self.children.iter().map(TestStep::result))
        }
    }

    pub fn children(&self) -> &[TestStep] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<TestStep> {
        &mut self.children
    }

    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        self.failure.as_ref()
    }

    pub fn artifact(&self) -> Option<&ArtifactRef> {
        self.artifact.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Record a terminal status; the first recorded status wins
    pub(crate) fn record_status(&mut self, status: StepStatus) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    /// Record a failure, overriding any previously recorded non-failure
    /// status; the first failure on a node wins.
    pub(crate) fn fail_with(&mut self, failure: StepFailure) {
        if self.failure.is_none() {
            self.status = Some(failure.status());
            self.failure = Some(failure);
        }
    }

    pub(crate) fn attach_artifact(&mut self, artifact: ArtifactRef) {
        if self.artifact.is_none() {
            self.artifact = Some(artifact);
        }
    }

    pub(crate) fn set_duration_ms(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Total number of steps in this subtree, this step included
    pub fn step_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TestStep::step_count)
            .sum::<usize>()
    }
}

impl fmt::Display for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.result().symbol(),
            self.description,
            self.duration_ms
        )?;
        if let Some(failure) = &self.failure {
            write!(f, " - {failure}")?;
        }
        Ok(())
    }
}
