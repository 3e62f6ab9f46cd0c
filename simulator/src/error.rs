//! Error types for emasim.

use thiserror::Error;

/// Result type alias for emasim operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or running a simulation.
#[derive(Debug, Error)]
pub enum Error {
    /// An array does not match the frame's scenario shape.
    #[error("{what}: shape {found:?} does not match scenario shape {expected:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// The attribute key set differs from the frame's attributes.
    #[error("attribute keys {found:?} do not match frame attributes {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The experiment layout is unusable.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Empty half-open record-count range.
    #[error("record count range [{min}, {max}) is empty")]
    InvalidRecordRange { min: usize, max: usize },

    /// Negative or non-finite inter-individual standard deviation.
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidSpread { name: &'static str, value: f64 },

    /// Malformed configuration value.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
