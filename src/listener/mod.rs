//! Test lifecycle listener
//!
//! Observes a test run and assembles a sealed `TestOutcome` per test
//! method: creates the outcome when the test starts, routes step events
//! through its own bus, and applies the finish-time assembly rules
//! (synthetic failures, title resolution, snapshot eligibility).

#![allow(dead_code)]

use tracing::{info, warn};

use crate::executor::{StepEntry, StepEventBus, StepRunner};
use crate::models::{StepFailure, TestOutcome, TestStep, UserStory};
use crate::snapshot::{NoSnapshots, SnapshotCapture};
use crate::utils::inflect::{humanize, underscore};

/// Resolvable identity of one test method
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestIdentifier {
    method_name: String,
    test_class: Option<String>,
}

impl TestIdentifier {
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            test_class: None,
        }
    }

    /// Attach the owning test class identity
    pub fn with_class(mut self, test_class: impl Into<String>) -> Self {
        self.test_class = Some(test_class.into());
        self
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn test_class(&self) -> Option<&str> {
        self.test_class.as_deref()
    }

    /// Humanized default title for this test
    pub fn method_title(&self) -> String {
        humanize(&self.method_name)
    }
}

/// Lifecycle adapter that seals one `TestOutcome` per test method.
///
/// Owns its own `StepEventBus`, cleared at every test start, so separate
/// listeners on separate worker threads never share aggregation state.
pub struct NarrationListener<C: SnapshotCapture = NoSnapshots> {
    bus: StepEventBus,
    outcome: Option<TestOutcome>,
    identifier: Option<TestIdentifier>,
    host_failure: Option<StepFailure>,
    capture: C,
}

impl NarrationListener<NoSnapshots> {
    pub fn new() -> Self {
        Self::with_capture(NoSnapshots)
    }
}

impl Default for NarrationListener<NoSnapshots> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SnapshotCapture> NarrationListener<C> {
    /// Create a listener with a snapshot capture collaborator
    pub fn with_capture(capture: C) -> Self {
        Self {
            bus: StepEventBus::new(),
            outcome: None,
            identifier: None,
            host_failure: None,
            capture,
        }
    }

    /// Begin recording a new test method
    pub fn test_started(&mut self, identifier: TestIdentifier) {
        self.bus.clear();
        self.host_failure = None;

        let mut outcome = TestOutcome::new();
        outcome.derive_title(identifier.method_title());
        if let Some(class) = identifier.test_class() {
            outcome.set_user_story(UserStory::from_test_class(class));
        }

        info!("test started: {}", identifier.method_name());
        self.identifier = Some(identifier);
        self.outcome = Some(outcome);
    }

    /// Set the outcome title explicitly; always wins over the derived one
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.outcome
            .get_or_insert_with(TestOutcome::new)
            .set_title(title);
    }

    /// The host framework skipped this test entirely
    pub fn test_ignored(&mut self) {
        let description = self
            .identifier
            .as_ref()
            .map(TestIdentifier::method_title)
            .unwrap_or_else(|| "Ignored test".to_string());
        if self.bus.step_started(&description) == StepEntry::Open {
            self.bus.step_ignored();
        }
    }

    /// The host framework reported a test-level failure. The first
    /// reported cause is kept; step-level failures take precedence at
    /// assembly time.
    pub fn test_failed(&mut self, cause: StepFailure) {
        if self.host_failure.is_none() {
            self.host_failure = Some(cause);
        }
    }

    /// Runner for feeding this test's step invocations into the bus
    pub fn step_runner(&mut self) -> StepRunner<'_> {
        StepRunner::new(&mut self.bus)
    }

    pub fn bus(&self) -> &StepEventBus {
        &self.bus
    }

    /// Outcome snapshot usable mid-execution
    pub fn current_outcome(&self) -> TestOutcome {
        let mut snapshot = self.outcome.clone().unwrap_or_default();
        for step in self.bus.root_steps() {
            snapshot.record_step(step.clone());
        }
        if let Some(failure) = self.bus.first_failure() {
            snapshot.record_failure(failure.clone());
        }
        snapshot
    }

    /// Seal and return the outcome of the current test method
    pub fn test_finished(&mut self) -> TestOutcome {
        let mut outcome = self.outcome.take().unwrap_or_default();
        let identifier = self.identifier.take();
        let step_failure_recorded = self.bus.failure_recorded();
        let bus_failure = self.bus.first_failure().cloned();
        let mut steps = self.bus.take_roots();
        self.bus.clear();

        if let Some(cause) = bus_failure {
            outcome.record_failure(cause);
        }

        // A host-reported failure only matters when no step recorded one
        let host_cause = self.host_failure.take().filter(|_| !step_failure_recorded);
        if let Some(cause) = &host_cause {
            if let Some(last) = steps.last_mut() {
                last.fail_with(cause.clone());
            } else {
                // The test failed before any instrumented step ran
                let description = identifier
                    .as_ref()
                    .map(TestIdentifier::method_title)
                    .unwrap_or_else(|| "Failure without steps".to_string());
                let mut step = TestStep::new(description);
                step.fail_with(cause.clone());
                steps.push(step);
            }
        }
        let any_failure = step_failure_recorded || host_cause.is_some();
        if let Some(cause) = host_cause {
            outcome.record_failure(cause);
        }

        if !steps.is_empty() && !any_failure {
            let name = underscore(outcome.title().unwrap_or("test"));
            match self.capture.capture_snapshot(&name) {
                Ok(Some(artifact)) => {
                    if let Some(last) = steps.last_mut() {
                        last.attach_artifact(artifact);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("snapshot capture failed, continuing: {e}"),
            }
        }

        for step in steps {
            outcome.record_step(step);
        }
        outcome.seal();
        info!("test finished: {outcome}");
        outcome
    }
}
