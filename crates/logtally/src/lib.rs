// Module structure for logtally.

// Core data model
pub mod tally;
pub mod metrics;

// Pipeline stages
pub mod discovery;
pub mod ingest;
pub mod aggregate;
pub mod pipeline;

// Surroundings
pub mod conf;
pub mod report;
pub mod runtime;

pub use pipeline::{Pipeline, PipelineSettings, RunOutcome, RunSummary};
pub use tally::Tally;
