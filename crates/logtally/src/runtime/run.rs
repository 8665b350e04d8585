//! Run — execute one pipeline run and print the report.

use std::io::Write;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::conf::{LogTallyConfig, ReportFormat};
use crate::pipeline::{Pipeline, PipelineSettings, RunOutcome, RunSummary};
use crate::report::{render_json, render_text};
use crate::runtime::stop::cancel_on_signal;

/// Run the pipeline against `config`, cancelling on SIGINT / SIGTERM, and
/// write the report to stdout. A cancelled run still prints its partial
/// report and is not an error.
pub async fn run(config: &LogTallyConfig) -> Result<RunSummary> {
    let pipeline = Pipeline::new(PipelineSettings::from(config))
        .context("Invalid pipeline settings")?;

    let cancel = CancellationToken::new();
    let signals = cancel_on_signal(cancel.clone());

    let summary = pipeline.run(cancel).await;
    signals.abort();

    log_summary(&summary);

    let rendered = match config.report.format {
        ReportFormat::Text => render_text(&summary.tally),
        ReportFormat::Json => {
            let mut json = render_json(&summary).context("Failed to serialize report")?;
            json.push('\n');
            json
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write report")?;

    Ok(summary)
}

fn log_summary(summary: &RunSummary) {
    let m = &summary.metrics;
    match summary.outcome {
        RunOutcome::Completed => info!(
            dirs_scanned = m.dirs_scanned,
            dirs_failed = m.dirs_failed,
            files_discovered = m.files_discovered,
            files_ingested = m.files_ingested,
            files_failed = m.files_failed,
            lines_scanned = m.lines_scanned,
            lines_skipped = m.lines_skipped,
            "Run complete"
        ),
        RunOutcome::Cancelled => warn!(
            files_discovered = m.files_discovered,
            files_ingested = m.files_ingested,
            lines_scanned = m.lines_scanned,
            "Run cancelled, reporting partial totals"
        ),
    }
    if summary.ingestion.workers_stopped > 0 {
        warn!(
            stopped = summary.ingestion.workers_stopped,
            "Some ingestion workers stopped early"
        );
    }
}
