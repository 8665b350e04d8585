use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Forces the wrapped counters onto their own cache line so that discovery
/// and ingestion tasks updating different groups don't false-share.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Directory and descriptor counters (updated by discovery)
#[derive(Debug, Default)]
pub struct DiscoveryMetrics {
    pub dirs_scanned: AtomicU64,
    pub dirs_failed: AtomicU64,
    pub files_discovered: AtomicU64,
}

/// File counters (updated by ingestion, once per file)
#[derive(Debug, Default)]
pub struct FileMetrics {
    pub ingested: AtomicU64,
    pub failed: AtomicU64,
}

/// Line counters (updated by ingestion, once per file with the file's totals)
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub scanned: AtomicU64,
    pub skipped: AtomicU64,
}

/// Run-wide pipeline counters.
///
/// Observability only: nothing in the pipeline reads these to make decisions,
/// so every operation uses `Ordering::Relaxed`. `snapshot()` reads are not
/// transactional across fields; take one after the run for exact numbers.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub discovery: CacheAligned<DiscoveryMetrics>,
    pub files: CacheAligned<FileMetrics>,
    pub lines: CacheAligned<LineMetrics>,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_dir_scanned(&self) {
        self.discovery.0.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dir_failed(&self) {
        self.discovery.0.dirs_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_file_discovered(&self) {
        self.discovery.0.files_discovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fully scanned file and its line totals
    #[inline]
    pub fn record_file_ingested(&self, lines_scanned: u64, lines_skipped: u64) {
        self.files.0.ingested.fetch_add(1, Ordering::Relaxed);
        self.lines.0.scanned.fetch_add(lines_scanned, Ordering::Relaxed);
        self.lines.0.skipped.fetch_add(lines_skipped, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_file_failed(&self) {
        self.files.0.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dirs_scanned: self.discovery.0.dirs_scanned.load(Ordering::Relaxed),
            dirs_failed: self.discovery.0.dirs_failed.load(Ordering::Relaxed),
            files_discovered: self.discovery.0.files_discovered.load(Ordering::Relaxed),
            files_ingested: self.files.0.ingested.load(Ordering::Relaxed),
            files_failed: self.files.0.failed.load(Ordering::Relaxed),
            lines_scanned: self.lines.0.scanned.load(Ordering::Relaxed),
            lines_skipped: self.lines.0.skipped.load(Ordering::Relaxed),
        }
    }
}

/// A read-only copy of the pipeline counters, suitable for logging or the JSON report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dirs_scanned: u64,
    pub dirs_failed: u64,
    pub files_discovered: u64,
    pub files_ingested: u64,
    pub files_failed: u64,
    pub lines_scanned: u64,
    pub lines_skipped: u64,
}
