//! Boot — logging init and config load.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::conf::{LogFormat, LogTallyConfig, LoggingConfig};

/// Phase 1: thread-local subscriber so config loading can log.
/// Drop the guard before calling [`init_logging`].
pub fn init_logging_basic() -> tracing::subscriber::DefaultGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logtally=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: global subscriber from the loaded config.
/// `RUST_LOG` wins over `logging.level`.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Logs go to stderr so stdout carries only the report
    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

/// Resolve the config path, load and validate the config, then switch
/// logging over to the configured subscriber.
pub fn boot(config_path: Option<&str>) -> Result<LogTallyConfig> {
    let basic_tracing = init_logging_basic();

    info!("Starting logtally v{}", env!("CARGO_PKG_VERSION"));

    let path = LogTallyConfig::resolve_path(config_path);
    let config = LogTallyConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path))?;

    drop(basic_tracing);
    init_logging(&config.logging);

    info!(
        dirs = config.walker.log_dirs.len(),
        discovery_workers = config.walker.max_discovery_workers,
        ingestion_workers = config.ingestion.max_ingestion_workers,
        discovered_channel = config.discovered_files_channel_size,
        processed_channel = config.processed_log_count_channel_size,
        "Configuration loaded"
    );

    Ok(config)
}
