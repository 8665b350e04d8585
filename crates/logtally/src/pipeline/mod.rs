//! Pipeline — wire discovery, ingestion and aggregation through two bounded queues.
//!
//! ```text
//! dirs ─▶ discovery (K slots) ─▶ [descriptors] ─▶ ingestion (M workers) ─▶ [tallies] ─▶ reducer
//! ```
//!
//! Each queue is closed by the stage that produces into it, once all of that
//! stage's tasks have been joined. Cancellation is a single token shared by
//! every stage.

use std::path::PathBuf;
use std::sync::Arc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aggregate::aggregate;
use crate::conf::{FileErrorPolicy, LogTallyConfig};
use crate::discovery::{run_discovery, DiscoveryReport, DiscoverySettings};
use crate::ingest::{run_ingestion, IngestionReport, IngestionSettings};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::tally::Tally;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline needs at least one directory")]
    NoDirectories,
    #[error("log file suffix must not be empty")]
    EmptySuffix,
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Everything the pipeline needs from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub dirs: Vec<PathBuf>,
    pub suffix: String,
    pub discovery_workers: usize,
    pub ingestion_workers: usize,
    pub on_file_error: FileErrorPolicy,
    pub max_line_bytes: usize,
    pub discovered_capacity: usize,
    pub processed_capacity: usize,
}

impl From<&LogTallyConfig> for PipelineSettings {
    fn from(config: &LogTallyConfig) -> Self {
        Self {
            dirs: config.walker.log_dirs.clone(),
            suffix: config.walker.suffix.clone(),
            discovery_workers: config.walker.max_discovery_workers,
            ingestion_workers: config.ingestion.max_ingestion_workers,
            on_file_error: config.ingestion.on_file_error,
            max_line_bytes: config.ingestion.max_line_bytes,
            discovered_capacity: config.discovered_files_channel_size,
            processed_capacity: config.processed_log_count_channel_size,
        }
    }
}

impl PipelineSettings {
    /// Settings for `dirs` with the configuration defaults for everything else.
    pub fn for_dirs(dirs: Vec<PathBuf>) -> Self {
        let mut config = LogTallyConfig::default();
        config.walker.log_dirs = dirs;
        Self::from(&config)
    }

    /// Reject values the runtime cannot work with (zero-sized pools or
    /// queues would either panic or never make progress).
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.dirs.is_empty() {
            return Err(PipelineError::NoDirectories);
        }
        if self.suffix.is_empty() {
            return Err(PipelineError::EmptySuffix);
        }
        let counts = [
            ("discovery workers", self.discovery_workers),
            ("ingestion workers", self.ingestion_workers),
            ("max line bytes", self.max_line_bytes),
            ("discovered files channel size", self.discovered_capacity),
            ("processed log count channel size", self.processed_capacity),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(PipelineError::Zero(name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Result of one pipeline run. A cancelled run is still a valid summary:
/// `tally` holds everything merged before the token fired.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub tally: Tally,
    pub discovery: DiscoveryReport,
    pub ingestion: IngestionReport,
    pub metrics: MetricsSnapshot,
}

pub struct Pipeline {
    settings: PipelineSettings,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Result<Self, PipelineError> {
        settings.validate()?;
        Ok(Self {
            settings,
            metrics: Arc::new(PipelineMetrics::new()),
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Live counters, readable while a run is in progress.
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run all three stages until the data is exhausted or `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> RunSummary {
        let settings = &self.settings;
        info!(
            dirs = settings.dirs.len(),
            discovery_workers = settings.discovery_workers,
            ingestion_workers = settings.ingestion_workers,
            "Starting pipeline"
        );

        let (file_tx, file_rx) = mpsc::channel(settings.discovered_capacity);
        let (tally_tx, tally_rx) = mpsc::channel(settings.processed_capacity);

        // Stage 1: discovery
        let discovery = tokio::spawn(run_discovery(
            settings.dirs.clone(),
            DiscoverySettings {
                max_workers: settings.discovery_workers,
                suffix: settings.suffix.clone(),
            },
            file_tx,
            cancel.clone(),
            Arc::clone(&self.metrics),
        ));

        // Stage 2: ingestion
        let ingestion = tokio::spawn(run_ingestion(
            file_rx,
            tally_tx,
            IngestionSettings {
                workers: settings.ingestion_workers,
                on_file_error: settings.on_file_error,
                max_line_bytes: settings.max_line_bytes,
            },
            cancel.clone(),
            Arc::clone(&self.metrics),
        ));

        // Stage 3: aggregation runs on this task
        let aggregation = aggregate(tally_rx, cancel.clone()).await;

        let discovery = discovery.await.unwrap_or_else(|e| {
            error!("Discovery stage failed: {}", e);
            DiscoveryReport::default()
        });
        let ingestion = ingestion.await.unwrap_or_else(|e| {
            error!("Ingestion stage failed: {}", e);
            IngestionReport::default()
        });

        let outcome = if aggregation.cancelled || cancel.is_cancelled() {
            RunOutcome::Cancelled
        } else {
            RunOutcome::Completed
        };

        let summary = RunSummary {
            outcome,
            tally: aggregation.total,
            discovery,
            ingestion,
            metrics: self.metrics.snapshot(),
        };
        info!(
            outcome = ?summary.outcome,
            services = summary.tally.service_count(),
            files = summary.metrics.files_ingested,
            lines = summary.metrics.lines_scanned,
            "Pipeline finished"
        );
        summary
    }
}
