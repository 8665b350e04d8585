//! Model — LogTallyConfig and related structs.

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use super::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogTallyConfig {
    pub walker: WalkerConfig,
    pub ingestion: IngestionConfig,
    pub discovered_files_channel_size: usize,
    pub processed_log_count_channel_size: usize,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Directory discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    pub log_dirs: Vec<PathBuf>,
    pub max_discovery_workers: usize,
    pub suffix: String,
}

/// File ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub max_ingestion_workers: usize,
    pub on_file_error: FileErrorPolicy,
    pub max_line_bytes: usize,
}

/// What an ingestion worker does when a file cannot be opened or read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorPolicy {
    /// Log the failure and move on to the next descriptor.
    #[default]
    SkipFile,
    /// Log the failure and retire the worker for the rest of the run.
    StopWorker,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LogTallyConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            ingestion: IngestionConfig::default(),
            discovered_files_channel_size: 64,
            processed_log_count_channel_size: 64,
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            log_dirs: Vec::new(),
            max_discovery_workers: 4,
            suffix: ".log".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_ingestion_workers: 4,
            on_file_error: FileErrorPolicy::default(),
            max_line_bytes: 64 * 1024,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LogTallyConfig {
    /// Validate configuration values before the pipeline starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.walker.log_dirs.is_empty() {
            return Err(ConfigError::Invalid("log directories must not be empty".to_string()));
        }
        if self.walker.log_dirs.iter().any(|dir| dir.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid("log directories must not contain empty paths".to_string()));
        }
        if self.walker.max_discovery_workers == 0 {
            return Err(ConfigError::Invalid("max discovery workers must be greater than 0".to_string()));
        }
        if self.walker.suffix.is_empty() {
            return Err(ConfigError::Invalid("log file suffix must not be empty".to_string()));
        }
        if self.discovered_files_channel_size == 0 {
            return Err(ConfigError::Invalid("discovered files channel size must be greater than 0".to_string()));
        }
        if self.processed_log_count_channel_size == 0 {
            return Err(ConfigError::Invalid(
                "processed log count channel size must be greater than 0".to_string(),
            ));
        }
        self.ingestion.validate()
    }
}

impl IngestionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ingestion_workers == 0 {
            return Err(ConfigError::Invalid("max ingestion workers must be greater than 0".to_string()));
        }
        if self.max_line_bytes == 0 {
            return Err(ConfigError::Invalid("ingestion.max_line_bytes must be greater than 0".to_string()));
        }
        Ok(())
    }
}
