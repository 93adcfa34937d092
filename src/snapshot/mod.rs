//! Snapshot capture capability
//!
//! The aggregation engine never manages a driver itself; it only needs a
//! collaborator that can capture a snapshot artifact on request at the end
//! of a fully successful test.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::models::ArtifactRef;
use crate::utils::inflect::underscore;

/// Snapshot capture errors
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot source failed: {0}")]
    SourceFailed(String),

    #[error("Failed to store snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to capture a snapshot artifact for a finished step.
///
/// `Ok(None)` means capture is not available here (nothing to report).
/// An `Err` is a capture fault, which callers log and swallow; it never
/// influences the aggregated result.
pub trait SnapshotCapture {
    fn capture_snapshot(&mut self, name: &str) -> Result<Option<ArtifactRef>, SnapshotError>;
}

/// Capture implementation for environments without a driver
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSnapshots;

impl SnapshotCapture for NoSnapshots {
    fn capture_snapshot(&mut self, _name: &str) -> Result<Option<ArtifactRef>, SnapshotError> {
        Ok(None)
    }
}

/// Stores snapshots produced by a caller-supplied source into a directory,
/// one uniquely numbered file per capture.
pub struct DirectorySnapshots<F>
where
    F: FnMut() -> Result<Vec<u8>, SnapshotError>,
{
    directory: PathBuf,
    source: F,
    next_index: u32,
}

impl<F> DirectorySnapshots<F>
where
    F: FnMut() -> Result<Vec<u8>, SnapshotError>,
{
    /// Create a directory-backed capture fed by `source` (typically a
    /// closure over the browser driver's screenshot call).
    pub fn new(directory: impl Into<PathBuf>, source: F) -> Self {
        Self {
            directory: directory.into(),
            source,
            next_index: 1,
        }
    }
}

impl<F> SnapshotCapture for DirectorySnapshots<F>
where
    F: FnMut() -> Result<Vec<u8>, SnapshotError>,
{
    fn capture_snapshot(&mut self, name: &str) -> Result<Option<ArtifactRef>, SnapshotError> {
        let bytes = (self.source)()?;

        fs::create_dir_all(&self.directory)?;
        let file_name = format!("{}_{}.png", underscore(name), self.next_index);
        let path = self.directory.join(file_name);
        fs::write(&path, bytes)?;
        self.next_index += 1;

        debug!("captured snapshot {}", path.display());
        Ok(Some(ArtifactRef::new(path.display().to_string())))
    }
}
