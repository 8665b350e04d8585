//! File — turn one discovered log file into a partial tally.

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use super::line::parse_line;
use super::IngestError;
use crate::discovery::FileDescriptor;
use crate::tally::Tally;

/// The partial tally of one file plus its line totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileScan {
    pub tally: Tally,
    pub lines: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileScanOutcome {
    Complete(FileScan),
    Cancelled,
}

/// Read `descriptor`'s file line by line and count `service`/`severity`
/// pairs. Lines with fewer than three tokens are skipped. Invalid UTF-8 is
/// replaced rather than rejected; a line longer than `max_line_bytes` fails
/// the file.
///
/// Cancellation is checked before every line. The file handle lives only
/// inside this call and is released on every return path.
pub async fn tally_file(
    descriptor: &FileDescriptor,
    max_line_bytes: usize,
    cancel: &CancellationToken,
) -> Result<FileScanOutcome, IngestError> {
    let path = &descriptor.path;
    let file = File::open(path).await.map_err(|source| IngestError::Open {
        path: path.clone(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let mut scan = FileScan::default();
    let mut buf = Vec::with_capacity(256);
    // Room for a full `\r\n` terminator; anything longer that stops short of
    // a newline is still over the limit after trimming
    let read_limit = max_line_bytes.saturating_add(2) as u64;

    loop {
        if cancel.is_cancelled() {
            return Ok(FileScanOutcome::Cancelled);
        }

        buf.clear();
        let read = (&mut reader)
            .take(read_limit)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| IngestError::Read {
                path: path.clone(),
                source,
            })?;
        if read == 0 {
            break;
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > max_line_bytes {
            return Err(IngestError::LineTooLong {
                path: path.clone(),
                line: scan.lines + 1,
                limit: max_line_bytes,
            });
        }

        scan.lines += 1;
        let line = String::from_utf8_lossy(&buf);
        match parse_line(&line) {
            Some(parsed) => scan.tally.record(parsed.service, parsed.severity),
            None => scan.skipped += 1,
        }
    }

    Ok(FileScanOutcome::Complete(scan))
}
