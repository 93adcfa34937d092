//! Step invocation wrapper
//!
//! Runs step bodies against the event bus, guaranteeing that every started
//! step receives exactly one terminal event. Step bodies report their
//! outcome as plain data; nothing propagates out of a step as a fault.

#![allow(dead_code)]

use tracing::debug;

use crate::models::{StepFailure, StepStatus};

use super::bus::{StepEntry, StepEventBus};

/// Result value returned by a step body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure(StepFailure),
    Ignored,
    Pending,
}

impl StepOutcome {
    /// Assertion-style failure outcome
    pub fn failure(message: impl Into<String>) -> Self {
        StepOutcome::Failure(StepFailure::assertion(message))
    }

    /// Unexpected-fault outcome
    pub fn fault(message: impl Into<String>) -> Self {
        StepOutcome::Failure(StepFailure::fault(message))
    }
}

/// A single executable step.
///
/// A step group is nothing special: a step whose body invokes further
/// steps through the runner it is handed.
pub trait Step {
    fn invoke(&self, runner: &mut StepRunner<'_>) -> StepOutcome;
}

/// Drives step bodies and translates their outcomes into bus events.
///
/// The runner borrows the bus for the duration of one test's step
/// sequence; nested invocations reuse the same runner, which keeps the
/// bus stack aligned with the program's own call nesting.
pub struct StepRunner<'a> {
    bus: &'a mut StepEventBus,
}

impl<'a> StepRunner<'a> {
    pub fn new(bus: &'a mut StepEventBus) -> Self {
        Self { bus }
    }

    /// Run one step and return its final status.
    ///
    /// If the bus resolves the step on start (an earlier failure, or a
    /// programmatic ignore/pending of the remaining group), the body is
    /// never executed.
    pub fn run_step(&mut self, description: &str, step: &dyn Step) -> StepStatus {
        match self.bus.step_started(description) {
            StepEntry::Resolved(status) => {
                debug!("not executing {description}: resolved to {status}");
                status
            }
            StepEntry::Open => {
                let outcome = step.invoke(self);
                self.finish(outcome)
            }
        }
    }

    /// Record a step that is declared ignored; its body never runs
    pub fn ignored_step(&mut self, description: &str) -> StepStatus {
        match self.bus.step_started(description) {
            StepEntry::Resolved(status) => status,
            StepEntry::Open => {
                self.bus.step_ignored();
                StepStatus::Ignored
            }
        }
    }

    /// Record a step that is declared pending; its body never runs
    pub fn pending_step(&mut self, description: &str) -> StepStatus {
        match self.bus.step_started(description) {
            StepEntry::Resolved(status) => status,
            StepEntry::Open => {
                self.bus.step_pending();
                StepStatus::Pending
            }
        }
    }

    /// Request that the remaining steps of the current group be recorded
    /// as ignored without executing.
    pub fn ignore_remaining(&mut self) {
        self.bus.ignore_remaining();
    }

    /// Request that the remaining steps of the current group be recorded
    /// as pending without executing.
    pub fn pending_remaining(&mut self) {
        self.bus.pending_remaining();
    }

    fn finish(&mut self, outcome: StepOutcome) -> StepStatus {
        match outcome {
            StepOutcome::Success => {
                self.bus.step_succeeded();
                StepStatus::Success
            }
            StepOutcome::Failure(failure) => {
                let status = failure.status();
                self.bus.step_failed(failure);
                status
            }
            StepOutcome::Ignored => {
                self.bus.step_ignored();
                StepStatus::Ignored
            }
            StepOutcome::Pending => {
                self.bus.step_pending();
                StepStatus::Pending
            }
        }
    }
}
