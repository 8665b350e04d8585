//! Descriptor — the lightweight record discovery hands to ingestion.

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A discovered log file. Immutable once created; duplicates across
/// directories are independent files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

impl FileDescriptor {
    /// Build a descriptor from already-fetched metadata.
    /// Fails only when the platform cannot report a modification time.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> io::Result<Self> {
        let modified = metadata.modified()?;
        Ok(Self {
            path,
            size: metadata.len(),
            modified_at: DateTime::<Utc>::from(modified),
        })
    }
}
