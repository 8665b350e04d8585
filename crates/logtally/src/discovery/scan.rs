//! Scan — list one directory and emit a descriptor per matching file.

use std::path::Path;
use thiserror::Error;
use tokio::fs::{self, DirEntry};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::descriptor::FileDescriptor;
use super::DiscoveryError;
use crate::metrics::PipelineMetrics;

/// How a single directory scan ended. Both variants carry the number of
/// descriptors that were handed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed(usize),
    Cancelled(usize),
}

/// A scan that stopped on an error. `emitted` descriptors had already been
/// handed downstream and stay there.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ScanFailure {
    pub emitted: usize,
    #[source]
    pub error: DiscoveryError,
}

/// Scan the immediate children of `dir`, sending a [`FileDescriptor`] for
/// every regular file whose name ends in `suffix`. No recursion.
///
/// Listing and sending both race `cancel`; once it fires the scan stops and
/// reports [`ScanOutcome::Cancelled`]. Sends block while `tx` is full.
pub async fn scan_dir(
    dir: &Path,
    suffix: &str,
    tx: &mpsc::Sender<FileDescriptor>,
    cancel: &CancellationToken,
    metrics: &PipelineMetrics,
) -> Result<ScanOutcome, ScanFailure> {
    let mut emitted = 0usize;
    scan_entries(dir, suffix, tx, cancel, metrics, &mut emitted)
        .await
        .map_err(|error| ScanFailure { emitted, error })
}

async fn scan_entries(
    dir: &Path,
    suffix: &str,
    tx: &mpsc::Sender<FileDescriptor>,
    cancel: &CancellationToken,
    metrics: &PipelineMetrics,
    emitted: &mut usize,
) -> Result<ScanOutcome, DiscoveryError> {
    let read_dir_error = |source: std::io::Error| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(ScanOutcome::Cancelled(0)),
        listing = fs::read_dir(dir) => listing.map_err(read_dir_error)?,
    };

    loop {
        if cancel.is_cancelled() {
            return Ok(ScanOutcome::Cancelled(*emitted));
        }

        let entry = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(ScanOutcome::Cancelled(*emitted)),
            next = entries.next_entry() => match next.map_err(read_dir_error)? {
                Some(entry) => entry,
                None => break,
            },
        };

        let Some(descriptor) = describe(&entry, suffix).await else {
            continue;
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(ScanOutcome::Cancelled(*emitted)),
            sent = tx.send(descriptor) => {
                if sent.is_err() {
                    return Err(DiscoveryError::QueueClosed(dir.to_path_buf()));
                }
            }
        }
        *emitted += 1;
        metrics.record_file_discovered();
    }

    Ok(ScanOutcome::Completed(*emitted))
}

/// Apply the per-entry policy: directories and non-matching names are
/// skipped, as are entries whose metadata can't be read.
async fn describe(entry: &DirEntry, suffix: &str) -> Option<FileDescriptor> {
    let file_type = entry.file_type().await.ok()?;
    if file_type.is_dir() {
        return None;
    }
    if !entry.file_name().to_string_lossy().ends_with(suffix) {
        return None;
    }

    let path = entry.path();
    // Follows symlinks so a link to a log file reports the target's size
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping entry without metadata");
            return None;
        }
    };
    if !metadata.is_file() {
        return None;
    }

    match FileDescriptor::from_metadata(path, &metadata) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            debug!(path = %entry.path().display(), error = %e, "Skipping entry without modification time");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn touch(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    async fn drain(mut rx: mpsc::Receiver<FileDescriptor>) -> Vec<FileDescriptor> {
        let mut out = Vec::new();
        while let Some(d) = rx.recv().await {
            out.push(d);
        }
        out
    }

    #[tokio::test]
    async fn test_scan_filters_by_suffix_and_skips_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.log", "x auth ERROR\n");
        touch(dir.path(), "b.log", "");
        touch(dir.path(), "c.txt", "x auth ERROR\n");
        touch(dir.path(), "d.log.gz", "");
        std::fs::create_dir(dir.path().join("nested.log")).unwrap();
        touch(&dir.path().join("nested.log"), "inner.log", "x auth ERROR\n");

        let (tx, rx) = mpsc::channel(16);
        let metrics = PipelineMetrics::new();
        let outcome = scan_dir(dir.path(), ".log", &tx, &CancellationToken::new(), &metrics)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(outcome, ScanOutcome::Completed(2));
        let mut names: Vec<String> = drain(rx)
            .await
            .into_iter()
            .map(|d| d.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.log", "b.log"]);
        assert_eq!(metrics.snapshot().files_discovered, 2);
    }

    #[tokio::test]
    async fn test_scan_records_size() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.log", "12345");

        let (tx, mut rx) = mpsc::channel(1);
        scan_dir(dir.path(), ".log", &tx, &CancellationToken::new(), &PipelineMetrics::new())
            .await
            .unwrap();

        let descriptor = rx.recv().await.unwrap();
        assert_eq!(descriptor.size, 5);
        assert_eq!(descriptor.path, dir.path().join("a.log"));
    }

    #[tokio::test]
    async fn test_scan_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let (tx, _rx) = mpsc::channel(1);
        let result = scan_dir(&missing, ".log", &tx, &CancellationToken::new(), &PipelineMetrics::new()).await;

        match result {
            Err(ScanFailure { emitted: 0, error: DiscoveryError::ReadDir { path, .. } }) => {
                assert_eq!(path, missing)
            }
            other => panic!("expected ReadDir error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.log", "");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, mut rx) = mpsc::channel(4);
        let outcome = scan_dir(dir.path(), ".log", &tx, &cancel, &PipelineMetrics::new())
            .await
            .unwrap();

        assert_eq!(outcome, ScanOutcome::Cancelled(0));
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scan_unblocks_full_queue_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(dir.path(), &format!("{i}.log"), "");
        }

        // Capacity 1 and nobody reading: the second send blocks until cancel fires
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            scan_dir(dir.path(), ".log", &tx, &cancel, &PipelineMetrics::new()),
        )
        .await
        .expect("scan should return once cancelled")
        .unwrap();

        assert_eq!(outcome, ScanOutcome::Cancelled(1));
    }

    #[tokio::test]
    async fn test_scan_backpressure_drops_nothing() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            touch(dir.path(), &format!("{i:02}.log"), "");
        }

        let (tx, mut rx) = mpsc::channel(1);
        let consumer = tokio::spawn(async move {
            let mut seen = 0usize;
            while rx.recv().await.is_some() {
                tokio::time::sleep(Duration::from_millis(1)).await;
                seen += 1;
            }
            seen
        });

        let outcome = scan_dir(dir.path(), ".log", &tx, &CancellationToken::new(), &PipelineMetrics::new())
            .await
            .unwrap();
        drop(tx);

        assert_eq!(outcome, ScanOutcome::Completed(20));
        assert_eq!(consumer.await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_scan_closed_queue_is_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.log", "");

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = scan_dir(dir.path(), ".log", &tx, &CancellationToken::new(), &PipelineMetrics::new()).await;
        assert!(matches!(
            result,
            Err(ScanFailure { emitted: 0, error: DiscoveryError::QueueClosed(_) })
        ));
    }

    #[tokio::test]
    async fn test_failure_reports_descriptors_already_sent() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(dir.path(), &format!("{i}.log"), "");
        }

        // The reader takes one descriptor and goes away mid-scan
        let (tx, mut rx) = mpsc::channel(1);
        let reader = tokio::spawn(async move {
            rx.recv().await;
        });

        let metrics = PipelineMetrics::new();
        let result = scan_dir(dir.path(), ".log", &tx, &CancellationToken::new(), &metrics).await;
        reader.await.unwrap();

        match result {
            Err(ScanFailure { emitted, error: DiscoveryError::QueueClosed(_) }) => {
                assert!(emitted >= 1);
                assert_eq!(emitted as u64, metrics.snapshot().files_discovered);
            }
            other => panic!("expected QueueClosed failure, got {:?}", other),
        }
    }
}
