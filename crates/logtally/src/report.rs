//! Report — render the final tally for humans or machines.

use std::fmt::Write;
use serde::Serialize;

use crate::metrics::MetricsSnapshot;
use crate::pipeline::{RunOutcome, RunSummary};
use crate::tally::Tally;

const SEPARATOR: &str = "---------------------";

/// Plain-text report: one block per service (sorted), one
/// `SEVERITY: count` line per severity, each block closed by a separator.
pub fn render_text(tally: &Tally) -> String {
    if tally.is_empty() {
        return "No log entries counted\n".to_string();
    }

    let mut out = String::new();
    for (service, severities) in tally.iter() {
        // Writing to a String never fails
        let _ = writeln!(out, "{} Error Counts", service);
        for (severity, count) in severities {
            let _ = writeln!(out, "{}: {}", severity, count);
        }
        let _ = writeln!(out, "{}", SEPARATOR);
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    outcome: RunOutcome,
    services: &'a Tally,
    metrics: &'a MetricsSnapshot,
}

/// JSON report including the run outcome and counters.
pub fn render_json(summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        outcome: summary.outcome,
        services: &summary.tally,
        metrics: &summary.metrics,
    })
}
