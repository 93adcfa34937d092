//! Step execution engine
//!
//! Provides the step event bus and the invocation wrapper that drives
//! step bodies through it.

mod bus;
mod runner;

pub use bus::{StepEntry, StepEventBus};
pub use runner::{Step, StepOutcome, StepRunner};
