//! Error types for the recommendation pipeline.
//!
//! The storage and command layers work with `anyhow::Result`; these enums
//! cover the failures the pipeline classifies and recovers from.

/// Unparseable monetary text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoneyError {
    #[error("Invalid monetary format: {0:?}")]
    InvalidMonetaryFormat(String),

    #[error("Monetary amount out of range: {0}")]
    OutOfRange(String),
}

/// Model output that could not be recovered as a JSON object.
#[derive(Debug, thiserror::Error)]
pub enum RepairError {
    #[error("Malformed model response: {source}. Preview: {preview}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
}

/// Failures reported by a model client, classified at the transport boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Model endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// A single recommendation field outside its allowed set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("recommendation has no resource_id")]
    MissingResourceId,

    #[error("invalid {field} value {value:?}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("{field} has the wrong type: {value}")]
    WrongType { field: &'static str, value: String },

    #[error("invalid estimated_savings: {0}")]
    InvalidSavings(#[from] MoneyError),
}
