//! Data models for step narration
//!
//! This module contains the step tree, status domain, and outcome records
//! used throughout the application.

mod outcome;
mod status;
mod step;
mod story;

pub use outcome::TestOutcome;
pub use status::{most_severe, StepStatus};
pub use step::{ArtifactRef, FailureKind, StepFailure, TestStep};
pub use story::UserStory;
