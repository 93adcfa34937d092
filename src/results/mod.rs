//! Results storage module
//!
//! Provides persistent JSON storage and export of sealed test outcomes.
//! External report writers consume the stored tree; no report format
//! lives here.

#![allow(dead_code)]

mod storage;

pub use storage::{ExportFormat, ResultsStorage, RunInfo, StoredOutcome, StoredStep};
