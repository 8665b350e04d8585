//! Stage — scan every configured directory with at most K scans in flight.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::descriptor::FileDescriptor;
use super::scan::{scan_dir, ScanFailure, ScanOutcome};
use super::DiscoveryError;
use crate::metrics::PipelineMetrics;

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Maximum directories scanned at the same time.
    pub max_workers: usize,
    /// File-name suffix a log file must end with.
    pub suffix: String,
}

/// Per-run discovery totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub dirs_scanned: usize,
    pub dirs_failed: usize,
    pub dirs_cancelled: usize,
    pub files_emitted: usize,
}

/// Run the discovery stage to completion.
///
/// Every directory gets its own task; a semaphore with `max_workers` permits
/// limits how many of them list at once. `tx` is the stage's own sender:
/// each task works on a clone and this function drops the original only
/// after the join set is empty, so the descriptor queue closes exactly once
/// and never while a scan can still send.
pub async fn run_discovery(
    dirs: Vec<PathBuf>,
    settings: DiscoverySettings,
    tx: mpsc::Sender<FileDescriptor>,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
) -> DiscoveryReport {
    info!(
        dirs = dirs.len(),
        max_workers = settings.max_workers,
        "Starting directory discovery"
    );

    let slots = Arc::new(Semaphore::new(settings.max_workers.max(1)));
    let suffix: Arc<str> = Arc::from(settings.suffix);
    let mut scans = JoinSet::new();

    for dir in dirs {
        let slots = Arc::clone(&slots);
        let suffix = Arc::clone(&suffix);
        let tx = tx.clone();
        let cancel = cancel.clone();
        let metrics = Arc::clone(&metrics);

        scans.spawn(async move {
            // Waiting for a slot is itself a blocking point
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (dir, Ok(ScanOutcome::Cancelled(0))),
                permit = slots.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        let failure = ScanFailure { emitted: 0, error: DiscoveryError::SlotsClosed };
                        return (dir, Err(failure));
                    }
                },
            };
            let result = scan_dir(&dir, &suffix, &tx, &cancel, &metrics).await;
            (dir, result)
        });
    }

    let mut report = DiscoveryReport::default();
    while let Some(joined) = scans.join_next().await {
        match joined {
            Ok((dir, Ok(ScanOutcome::Completed(emitted)))) => {
                debug!(dir = %dir.display(), emitted, "Directory scan complete");
                metrics.record_dir_scanned();
                report.dirs_scanned += 1;
                report.files_emitted += emitted;
            }
            Ok((dir, Ok(ScanOutcome::Cancelled(emitted)))) => {
                debug!(dir = %dir.display(), emitted, "Directory scan cancelled");
                report.dirs_cancelled += 1;
                report.files_emitted += emitted;
            }
            Ok((dir, Err(failure))) => {
                warn!(
                    dir = %dir.display(),
                    emitted = failure.emitted,
                    error = %failure.error,
                    "Walker error"
                );
                metrics.record_dir_failed();
                report.dirs_failed += 1;
                report.files_emitted += failure.emitted;
            }
            Err(e) => {
                error!("Directory scan task failed: {}", e);
                metrics.record_dir_failed();
                report.dirs_failed += 1;
            }
        }
    }

    // Barrier passed: no scan task holds a sender any more
    drop(tx);

    info!(
        scanned = report.dirs_scanned,
        failed = report.dirs_failed,
        cancelled = report.dirs_cancelled,
        files = report.files_emitted,
        "Directory discovery finished"
    );
    report
}
