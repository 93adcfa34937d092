//! Test outcome assembly
//!
//! The sealed, top-level result record for one test method or scenario.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::fmt;

use super::status::{most_severe, StepStatus};
use super::step::{StepFailure, TestStep};
use super::story::UserStory;

/// The top-level record for one test: title, ordered root steps, aggregate
/// result, and the first failure cause encountered at any depth.
///
/// The title is resolved once. An explicit title always wins over a derived
/// one, and the first explicit title wins over later explicit ones.
#[derive(Clone, Debug, Default)]
pub struct TestOutcome {
    explicit_title: Option<String>,
    derived_title: Option<String>,
    steps: Vec<TestStep>,
    failure_cause: Option<StepFailure>,
    user_story: Option<UserStory>,
    started_at: Option<DateTime<Utc>>,
    duration_ms: u64,
}

impl TestOutcome {
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Set the title explicitly; the first explicit title wins
    pub fn set_title(&mut self, title: impl Into<String>) {
        if self.explicit_title.is_none() {
            self.explicit_title = Some(title.into());
        }
    }

    /// Provide the default title derived from the test identifier; kept
    /// only until an explicit title arrives, set once.
    pub fn derive_title(&mut self, title: impl Into<String>) {
        if self.derived_title.is_none() {
            self.derived_title = Some(title.into());
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.explicit_title
            .as_deref()
            .or(self.derived_title.as_deref())
    }

    /// Append a sealed root-level step
    pub fn record_step(&mut self, step: TestStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    /// Aggregate result, rolled up from the root steps the same way a
    /// group derives from its children.
    pub fn result(&self) -> StepStatus {
        most_severe(self.steps.iter().map(TestStep::result))
    }

    /// Record the primary failure cause; the first recorded cause wins
    pub fn record_failure(&mut self, cause: StepFailure) {
        if self.failure_cause.is_none() {
            self.failure_cause = Some(cause);
        }
    }

    pub fn failure_cause(&self) -> Option<&StepFailure> {
        self.failure_cause.as_ref()
    }

    pub fn set_user_story(&mut self, story: UserStory) {
        self.user_story = Some(story);
    }

    pub fn user_story(&self) -> Option<&UserStory> {
        self.user_story.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Total number of steps at all depths
    pub fn step_count(&self) -> usize {
        self.steps.iter().map(TestStep::step_count).sum()
    }

    /// Close the bookkeeping window; called once when the test finishes
    pub(crate) fn seal(&mut self) {
        if let Some(started_at) = self.started_at {
            let elapsed = Utc::now().signed_duration_since(started_at);
            self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {}",
            self.result().symbol(),
            self.title().unwrap_or("(untitled)"),
            self.result()
        )
    }
}
