//! Step event bus
//!
//! The single entry point for step lifecycle events. The bus reconstructs
//! the step nesting tree from start/finish notifications and applies the
//! skip-propagation policy for the remainder of the current test.

#![allow(dead_code)]

use std::time::Instant;
use tracing::{debug, error};

use crate::models::{StepFailure, StepStatus, TestOutcome, TestStep};

/// Decision returned by [`StepEventBus::step_started`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepEntry {
    /// The step is open; the caller must run its body and report exactly
    /// one terminal event for it.
    Open,
    /// The step was recorded and immediately resolved; its body must not
    /// be executed.
    Resolved(StepStatus),
}

/// One open step on the nesting stack
struct OpenStep {
    /// Index path from the root sequence to this node
    path: Vec<usize>,
    started: Instant,
    /// When set, children started under this step resolve to this status
    /// instead of executing (programmatic ignore/pending of remaining
    /// sibling steps).
    child_default: Option<StepStatus>,
}

/// Event sink for one test's step sequence.
///
/// Each logical test-execution thread owns its own bus; `clear()` must be
/// called between test methods. All events arrive in strict call/return
/// order matching the program's own nesting, so no locking is involved.
#[derive(Default)]
pub struct StepEventBus {
    roots: Vec<TestStep>,
    open: Vec<OpenStep>,
    root_default: Option<StepStatus>,
    test_failed: bool,
    first_failure: Option<StepFailure>,
}

impl StepEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a step at the current nesting level.
    ///
    /// Never fails. Once any step in the current test has failed, the new
    /// node is still created but resolves to `Skipped` without executing;
    /// the same applies to a group-scoped ignore/pending request.
    pub fn step_started(&mut self, description: &str) -> StepEntry {
        if self.test_failed {
            self.record_resolved(description, StepStatus::Skipped);
            return StepEntry::Resolved(StepStatus::Skipped);
        }
        if let Some(status) = self.current_default() {
            self.record_resolved(description, status);
            return StepEntry::Resolved(status);
        }

        let path = self.append_child(TestStep::new(description));
        debug!("step started at depth {}: {description}", path.len());
        self.open.push(OpenStep {
            path,
            started: Instant::now(),
            child_default: None,
        });
        StepEntry::Open
    }

    /// Close the current step as successful (unless a more specific event
    /// already resolved it).
    pub fn step_succeeded(&mut self) {
        self.close_step(StepStatus::Success, None);
    }

    /// Close the current step as failed and propagate skipping to every
    /// step started later in this test, at any level.
    pub fn step_failed(&mut self, failure: StepFailure) {
        self.test_failed = true;
        if self.first_failure.is_none() {
            self.first_failure = Some(failure.clone());
        }
        self.close_step(failure.status(), Some(failure));
    }

    /// Close the current step as ignored; does not affect later steps
    pub fn step_ignored(&mut self) {
        self.close_step(StepStatus::Ignored, None);
    }

    /// Close the current step as pending; does not affect later steps
    pub fn step_pending(&mut self) {
        self.close_step(StepStatus::Pending, None);
    }

    /// Resolve the not-yet-started siblings of the currently executing
    /// step to `Ignored`. Scoped to the innermost enclosing group only.
    pub fn ignore_remaining(&mut self) {
        self.suppress_siblings(StepStatus::Ignored);
    }

    /// Resolve the not-yet-started siblings of the currently executing
    /// step to `Pending`. Scoped to the innermost enclosing group only.
    pub fn pending_remaining(&mut self) {
        self.suppress_siblings(StepStatus::Pending);
    }

    /// Reset the nesting stack and the failure flag. Must be called
    /// between test methods; the bus keeps no state across tests.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.open.clear();
        self.root_default = None;
        self.test_failed = false;
        self.first_failure = None;
    }

    /// True once any step in the current test has failed
    pub fn failure_recorded(&self) -> bool {
        self.test_failed
    }

    pub fn first_failure(&self) -> Option<&StepFailure> {
        self.first_failure.as_ref()
    }

    pub fn root_steps(&self) -> &[TestStep] {
        &self.roots
    }

    pub fn has_steps(&self) -> bool {
        !self.roots.is_empty()
    }

    /// Move the recorded root steps out of the bus
    pub(crate) fn take_roots(&mut self) -> Vec<TestStep> {
        std::mem::take(&mut self.roots)
    }

    /// Sealed view of the recorded tree, usable at any point including
    /// mid-execution.
    pub fn current_outcome(&self) -> TestOutcome {
        let mut outcome = TestOutcome::new();
        for step in &self.roots {
            outcome.record_step(step.clone());
        }
        if let Some(failure) = &self.first_failure {
            outcome.record_failure(failure.clone());
        }
        outcome
    }

    /// Default resolution for steps started at the current nesting level
    fn current_default(&self) -> Option<StepStatus> {
        match self.open.last() {
            Some(open) => open.child_default,
            None => self.root_default,
        }
    }

    fn suppress_siblings(&mut self, status: StepStatus) {
        // The currently executing step is the top of the stack; its
        // siblings live in the scope one level up.
        let depth = self.open.len();
        if depth >= 2 {
            self.open[depth - 2].child_default = Some(status);
        } else {
            self.root_default = Some(status);
        }
        debug!("remaining steps in the current group resolve to {status}");
    }

    /// Append a node under the current open step (or as a new root) and
    /// return its index path.
    fn append_child(&mut self, step: TestStep) -> Vec<usize> {
        if let Some(parent_path) = self.open.last().map(|open| open.path.clone()) {
            let parent = self.node_mut(&parent_path);
            parent.children_mut().push(step);
            let index = parent.children().len() - 1;
            let mut path = parent_path;
            path.push(index);
            path
        } else {
            self.roots.push(step);
            vec![self.roots.len() - 1]
        }
    }

    fn record_resolved(&mut self, description: &str, status: StepStatus) {
        let mut step = TestStep::new(description);
        step.record_status(status);
        debug!("step resolved without execution: {description} -> {status}");
        self.append_child(step);
    }

    fn close_step(&mut self, status: StepStatus, failure: Option<StepFailure>) {
        let Some(open) = self.open.pop() else {
            // Contract violation in the instrumentation wrapper; dropping
            // the event keeps the recorded sibling data intact.
            error!("unbalanced step event: {status} reported with no open step");
            return;
        };
        let duration_ms = open.started.elapsed().as_millis() as u64;
        let node = self.node_mut(&open.path);
        node.set_duration_ms(duration_ms);
        match failure {
            Some(failure) => node.fail_with(failure),
            None => node.record_status(status),
        }
        debug!("step finished: {} -> {status}", node.description());
    }

    fn node_mut(&mut self, path: &[usize]) -> &mut TestStep {
        let mut node = &mut self.roots[path[0]];
        for &index in &path[1..] {
            node = &mut node.children_mut()[index];
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_and_succeed(bus: &mut StepEventBus, description: &str) {
        assert_eq!(bus.step_started(description), StepEntry::Open);
        bus.step_succeeded();
    }

    #[test]
    fn test_flat_steps_become_roots() {
        let mut bus = StepEventBus::new();
        start_and_succeed(&mut bus, "step one");
        start_and_succeed(&mut bus, "step two");
        start_and_succeed(&mut bus, "step three");

        assert_eq!(bus.root_steps().len(), 3);
        assert!(bus
            .root_steps()
            .iter()
            .all(|step| step.result() == StepStatus::Success));
    }

    #[test]
    fn test_nested_steps_attach_to_the_open_step() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("a group"), StepEntry::Open);
        start_and_succeed(&mut bus, "nested one");
        start_and_succeed(&mut bus, "nested two");
        bus.step_succeeded();

        assert_eq!(bus.root_steps().len(), 1);
        assert_eq!(bus.root_steps()[0].children().len(), 2);
    }

    #[test]
    fn test_failure_skips_subsequent_steps() {
        let mut bus = StepEventBus::new();
        start_and_succeed(&mut bus, "step a");
        assert_eq!(bus.step_started("step b"), StepEntry::Open);
        bus.step_failed(StepFailure::assertion("expected true"));

        let entry = bus.step_started("step c");
        assert_eq!(entry, StepEntry::Resolved(StepStatus::Skipped));

        let results: Vec<StepStatus> =
            bus.root_steps().iter().map(TestStep::result).collect();
        assert_eq!(
            results,
            vec![StepStatus::Success, StepStatus::Failure, StepStatus::Skipped]
        );
        assert_eq!(bus.current_outcome().result(), StepStatus::Failure);
    }

    #[test]
    fn test_failure_skips_deeper_steps_as_well() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("outer group"), StepEntry::Open);
        assert_eq!(bus.step_started("failing step"), StepEntry::Open);
        bus.step_failed(StepFailure::assertion("boom"));
        assert_eq!(
            bus.step_started("nested after failure"),
            StepEntry::Resolved(StepStatus::Skipped)
        );
        bus.step_succeeded();

        assert_eq!(
            bus.step_started("outer after failure"),
            StepEntry::Resolved(StepStatus::Skipped)
        );
        assert_eq!(bus.current_outcome().result(), StepStatus::Failure);
    }

    #[test]
    fn test_nested_failure_rolls_up_through_groups() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("group g"), StepEntry::Open);
        assert_eq!(bus.step_started("subgroup h"), StepEntry::Open);
        assert_eq!(bus.step_started("a failing step"), StepEntry::Open);
        bus.step_failed(StepFailure::assertion("nested failure"));
        bus.step_succeeded(); // closes h
        bus.step_succeeded(); // closes g

        assert_eq!(
            bus.step_started("sibling of g"),
            StepEntry::Resolved(StepStatus::Skipped)
        );

        let g = &bus.root_steps()[0];
        assert_eq!(g.result(), StepStatus::Failure);
        assert_eq!(g.children()[0].result(), StepStatus::Failure);
    }

    #[test]
    fn test_first_failure_is_kept_as_the_cause() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("group"), StepEntry::Open);
        assert_eq!(bus.step_started("first failing"), StepEntry::Open);
        bus.step_failed(StepFailure::assertion("original cause"));
        // The enclosing group reports its own failure when its body winds
        // down; the primary cause is unchanged.
        bus.step_failed(StepFailure::fault("later cause"));

        assert_eq!(bus.first_failure().unwrap().message, "original cause");
        assert_eq!(
            bus.root_steps()[0].failure().unwrap().message,
            "later cause"
        );
    }

    #[test]
    fn test_ignored_and_pending_do_not_propagate() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("ignored step"), StepEntry::Open);
        bus.step_ignored();
        assert_eq!(bus.step_started("pending step"), StepEntry::Open);
        bus.step_pending();
        assert_eq!(bus.step_started("normal step"), StepEntry::Open);
        bus.step_succeeded();

        assert!(!bus.failure_recorded());
        assert_eq!(bus.current_outcome().result(), StepStatus::Pending);
    }

    #[test]
    fn test_ignore_remaining_is_scoped_to_the_innermost_group() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("group"), StepEntry::Open);
        assert_eq!(bus.step_started("first nested"), StepEntry::Open);
        bus.ignore_remaining();
        bus.step_succeeded();

        assert_eq!(
            bus.step_started("second nested"),
            StepEntry::Resolved(StepStatus::Ignored)
        );
        bus.step_succeeded(); // closes the group

        // Steps outside the group are unaffected
        assert_eq!(bus.step_started("outer step"), StepEntry::Open);
        bus.step_succeeded();

        let group = &bus.root_steps()[0];
        assert_eq!(group.children()[1].result(), StepStatus::Ignored);
        assert_eq!(bus.root_steps()[1].result(), StepStatus::Success);
    }

    #[test]
    fn test_pending_remaining_at_root_level() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("first"), StepEntry::Open);
        bus.pending_remaining();
        bus.step_succeeded();

        assert_eq!(
            bus.step_started("second"),
            StepEntry::Resolved(StepStatus::Pending)
        );
        assert_eq!(
            bus.step_started("third"),
            StepEntry::Resolved(StepStatus::Pending)
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut bus = StepEventBus::new();
        assert_eq!(bus.step_started("failing"), StepEntry::Open);
        bus.step_failed(StepFailure::fault("broken"));
        bus.clear();

        assert!(!bus.has_steps());
        assert!(!bus.failure_recorded());
        assert!(bus.first_failure().is_none());
        assert_eq!(bus.step_started("fresh step"), StepEntry::Open);
        bus.step_succeeded();
        assert_eq!(bus.current_outcome().result(), StepStatus::Success);
    }

    #[test]
    fn test_unbalanced_terminal_event_is_dropped() {
        let mut bus = StepEventBus::new();
        start_and_succeed(&mut bus, "only step");
        // No open step left; the stray event must not corrupt the tree
        bus.step_succeeded();

        assert_eq!(bus.root_steps().len(), 1);
        assert_eq!(bus.root_steps()[0].result(), StepStatus::Success);
    }

    #[test]
    fn test_current_outcome_mid_execution() {
        let mut bus = StepEventBus::new();
        start_and_succeed(&mut bus, "done");
        assert_eq!(bus.step_started("still running"), StepEntry::Open);

        let outcome = bus.current_outcome();
        assert_eq!(outcome.steps().len(), 2);
        assert_eq!(outcome.steps()[0].result(), StepStatus::Success);
        // The open step has no recorded status yet
        assert_eq!(outcome.steps()[1].result(), StepStatus::Pending);
    }
}
