use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Cannot access sample file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed sample file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Sample file {0} has no columns")]
    NoColumns(PathBuf),

    #[error("Insufficient data: {len} samples, at least {required} required")]
    InsufficientData { len: usize, required: usize },

    #[error("Degenerate statistics: {0}")]
    DegenerateStatistics(&'static str),

    #[error("Non-finite value at sample {index} after {stage}")]
    NonFinite { stage: &'static str, index: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Filter design failed: {0}")]
    Filter(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
