//! Output formatting module
//!
//! Provides various output formats for sealed test outcomes.

mod formatter;

pub use formatter::{write_outcome_to_file, OutputFormat, ResultFormatter};
