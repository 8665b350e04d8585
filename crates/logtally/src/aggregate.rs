//! Aggregate — the single reducer that owns the run-wide tally.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::tally::Tally;

/// The reducer's result: the running total and how the loop ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub total: Tally,
    /// Partial tallies merged into `total`.
    pub merged: u64,
    /// True when the loop returned because the token fired.
    pub cancelled: bool,
}

/// Merge every partial tally from `rx` into one total.
///
/// This task is the only writer of the aggregate, so no locking is needed.
/// Returns when `rx` is closed and drained, or as soon as `cancel` fires;
/// a cancelled aggregation still carries everything merged so far.
pub async fn aggregate(mut rx: mpsc::Receiver<Tally>, cancel: CancellationToken) -> Aggregation {
    let mut aggregation = Aggregation::default();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                aggregation.cancelled = true;
                break;
            }
            partial = rx.recv() => match partial {
                Some(partial) => {
                    aggregation.total.merge(partial);
                    aggregation.merged += 1;
                }
                // channel closed
                None => break,
            },
        }
    }

    debug!(
        merged = aggregation.merged,
        services = aggregation.total.service_count(),
        cancelled = aggregation.cancelled,
        "Aggregation finished"
    );
    aggregation
}
