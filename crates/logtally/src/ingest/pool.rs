//! Pool — a fixed set of ingestion workers sharing the descriptor queue.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::file::{tally_file, FileScan, FileScanOutcome};
use crate::conf::FileErrorPolicy;
use crate::discovery::FileDescriptor;
use crate::metrics::PipelineMetrics;
use crate::tally::Tally;

#[derive(Debug, Clone)]
pub struct IngestionSettings {
    /// Fixed number of worker tasks.
    pub workers: usize,
    pub on_file_error: FileErrorPolicy,
    pub max_line_bytes: usize,
}

/// Why a worker returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The descriptor queue was closed and empty.
    Drained,
    /// The cancellation token fired.
    Cancelled,
    /// A file failed under [`FileErrorPolicy::StopWorker`].
    Stopped,
    /// The partial-tally queue was closed by the reducer.
    Disconnected,
}

#[derive(Debug, Clone, Copy)]
struct WorkerSummary {
    exit: WorkerExit,
    ingested: usize,
    failed: usize,
}

/// Per-run ingestion totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionReport {
    pub files_ingested: usize,
    pub files_failed: usize,
    pub workers_drained: usize,
    pub workers_cancelled: usize,
    pub workers_stopped: usize,
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<FileDescriptor>>>;

/// Run the ingestion stage to completion.
///
/// Spawns `settings.workers` tasks that pull from `rx` until it is drained
/// or `cancel` fires. Like discovery, the stage keeps its own `tx` until
/// every worker has been joined, then drops it, closing the partial-tally
/// queue exactly once.
pub async fn run_ingestion(
    rx: mpsc::Receiver<FileDescriptor>,
    tx: mpsc::Sender<Tally>,
    settings: IngestionSettings,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
) -> IngestionReport {
    info!(
        workers = settings.workers,
        policy = ?settings.on_file_error,
        "Starting ingestion workers"
    );

    let rx: SharedReceiver = Arc::new(Mutex::new(rx));
    let mut workers = JoinSet::new();
    for id in 0..settings.workers {
        workers.spawn(worker(
            id,
            Arc::clone(&rx),
            tx.clone(),
            settings.clone(),
            cancel.clone(),
            Arc::clone(&metrics),
        ));
    }

    let mut report = IngestionReport::default();
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(summary) => {
                report.files_ingested += summary.ingested;
                report.files_failed += summary.failed;
                match summary.exit {
                    WorkerExit::Drained => report.workers_drained += 1,
                    WorkerExit::Cancelled => report.workers_cancelled += 1,
                    WorkerExit::Stopped | WorkerExit::Disconnected => report.workers_stopped += 1,
                }
            }
            Err(e) => {
                error!("Ingestion worker task failed: {}", e);
                report.workers_stopped += 1;
            }
        }
    }

    // Barrier passed: every worker has dropped its sender clone
    drop(tx);

    info!(
        ingested = report.files_ingested,
        failed = report.files_failed,
        stopped = report.workers_stopped,
        cancelled = report.workers_cancelled,
        "Ingestion finished"
    );
    report
}

async fn worker(
    id: usize,
    rx: SharedReceiver,
    tx: mpsc::Sender<Tally>,
    settings: IngestionSettings,
    cancel: CancellationToken,
    metrics: Arc<PipelineMetrics>,
) -> WorkerSummary {
    let mut summary = WorkerSummary {
        exit: WorkerExit::Drained,
        ingested: 0,
        failed: 0,
    };

    summary.exit = loop {
        // The lock is only held while waiting for the next descriptor
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break WorkerExit::Cancelled,
            next = async { rx.lock().await.recv().await } => next,
        };
        let Some(descriptor) = next else {
            break WorkerExit::Drained;
        };

        let scan = match tally_file(&descriptor, settings.max_line_bytes, &cancel).await {
            Ok(FileScanOutcome::Complete(scan)) => scan,
            Ok(FileScanOutcome::Cancelled) => break WorkerExit::Cancelled,
            Err(e) => {
                metrics.record_file_failed();
                summary.failed += 1;
                match settings.on_file_error {
                    FileErrorPolicy::SkipFile => {
                        warn!(worker = id, error = %e, "Skipping unreadable file");
                        continue;
                    }
                    FileErrorPolicy::StopWorker => {
                        error!(worker = id, error = %e, "Ingestion error, worker stopping");
                        break WorkerExit::Stopped;
                    }
                }
            }
        };

        let FileScan { tally, lines, skipped } = scan;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break WorkerExit::Cancelled,
            sent = tx.send(tally) => {
                if sent.is_err() {
                    warn!(worker = id, "Partial tally queue closed, worker stopping");
                    break WorkerExit::Disconnected;
                }
            }
        }

        // Only a tally the reducer can see counts as ingested
        metrics.record_file_ingested(lines, skipped);
        summary.ingested += 1;
        debug!(
            worker = id,
            path = %descriptor.path.display(),
            lines,
            skipped,
            "File ingested"
        );
    };

    debug!(worker = id, exit = ?summary.exit, "Ingestion worker exited");
    summary
}
