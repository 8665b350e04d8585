//! Discovery module — find log files in the configured directories.

pub mod descriptor;
pub mod scan;
pub mod stage;

use std::path::PathBuf;
use thiserror::Error;

pub use descriptor::FileDescriptor;
pub use scan::{scan_dir, ScanFailure, ScanOutcome};
pub use stage::{run_discovery, DiscoveryReport, DiscoverySettings};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("read folder {} error: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("descriptor queue closed while scanning {}", .0.display())]
    QueueClosed(PathBuf),
    #[error("discovery worker slots closed")]
    SlotsClosed,
}
