//! Error types for the metric sink.

use thiserror::Error;

/// Result type alias for metric sink operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register gauge {name}: {reason}")]
    Register { name: String, reason: String },

    #[error("gauge {name} already registered with labels {existing:?}, requested {requested:?}")]
    LabelMismatch {
        name: String,
        existing: Vec<String>,
        requested: Vec<String>,
    },

    #[error("failed to encode metrics: {0}")]
    Encode(String),
}
