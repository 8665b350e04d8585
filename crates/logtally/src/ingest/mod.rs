//! Ingest module — scan discovered files into partial tallies.

pub mod file;
pub mod line;
pub mod pool;

use std::path::PathBuf;
use thiserror::Error;

pub use file::{tally_file, FileScan, FileScanOutcome};
pub use line::{parse_line, LogLine};
pub use pool::{run_ingestion, IngestionReport, IngestionSettings, WorkerExit};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("open file {} error: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("process file {} error: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line} of {} exceeds {limit} bytes", .path.display())]
    LineTooLong {
        path: PathBuf,
        line: u64,
        limit: usize,
    },
}
