//! Step status domain
//!
//! Defines the status vocabulary shared by steps, step groups, and test
//! outcomes, together with the severity ordering used for rollup.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of a step or of a whole test outcome.
///
/// Variants are declared in ascending rollup severity; the derived `Ord`
/// is the rollup ordering. `Error` is an unexpected runtime fault, as
/// opposed to an assertion-style `Failure`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Ignored,
    Pending,
    Skipped,
    Failure,
    Error,
}

impl StepStatus {
    /// Get status symbol for terminal output
    pub fn symbol(&self) -> &'static str {
        match self {
            StepStatus::Success => "✓",
            StepStatus::Ignored => "−",
            StepStatus::Pending => "…",
            StepStatus::Skipped => "○",
            StepStatus::Failure => "✗",
            StepStatus::Error => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Success)
    }

    /// True for the two terminal-severe statuses
    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failure | StepStatus::Error)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(StepStatus::Success),
            "ignored" => Some(StepStatus::Ignored),
            "pending" => Some(StepStatus::Pending),
            "skipped" => Some(StepStatus::Skipped),
            "failure" => Some(StepStatus::Failure),
            "error" => Some(StepStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Success => write!(f, "SUCCESS"),
            StepStatus::Ignored => write!(f, "IGNORED"),
            StepStatus::Pending => write!(f, "PENDING"),
            StepStatus::Skipped => write!(f, "SKIPPED"),
            StepStatus::Failure => write!(f, "FAILURE"),
            StepStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Roll up a set of child statuses into the status of the enclosing group.
///
/// A group's status is the most severe status among its children; a group
/// with no children resolves to `Pending` (no executable steps is not
/// evidence of success).
pub fn most_severe<I>(statuses: I) -> StepStatus
where
    I: IntoIterator<Item = StepStatus>,
{
    statuses.into_iter().max().unwrap_or(StepStatus::Pending)
}
