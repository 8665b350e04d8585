//! Conf module — configuration model, validation, and layered loading.

pub mod model;
pub mod load;

use thiserror::Error;

pub use model::{
    FileErrorPolicy, IngestionConfig, LogFormat, LogTallyConfig, LoggingConfig, ReportConfig,
    ReportFormat, WalkerConfig,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
