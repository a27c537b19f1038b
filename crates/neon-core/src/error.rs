//! Centralized error types for neon.

use thiserror::Error;

use crate::frames::EndpointRole;

/// Main error type for frame construction, encoding and reconciliation.
#[derive(Error, Debug)]
pub enum NeonError {
    #[error("Cannot conform {found} to {expected}")]
    TypeConformance { expected: &'static str, found: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} values but the table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Column index {index} is out of bounds for a table of width {width}")]
    IndexOutOfBounds { index: usize, width: usize },

    #[error("Must provide either a label column or static labels")]
    MissingLabelSpecification,

    #[error("Conflicting label input for {role} endpoint: shared labels and per-endpoint labels were both given")]
    ConflictingLabelInput { role: EndpointRole },

    #[error("No value column for identity key '{0}'")]
    MissingValueColumn(String),

    #[error("Endpoint column '{column}' is not resolved to a node at row {row}")]
    UnresolvedEndpoint { column: String, row: usize },

    #[error("Frame is not ready for upload: {0}")]
    UploadNotReady(String),

    #[error("Query execution failed: {0:#}")]
    Execution(anyhow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for neon operations.
pub type NeonResult<T> = Result<T, NeonError>;

impl NeonError {
    /// Create a type conformance error, describing the offending input.
    pub fn conformance(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        Self::TypeConformance {
            expected,
            found: format!("{:?}", found),
        }
    }

    /// Create a column not found error.
    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound(name.into())
    }

    /// Create an upload readiness error.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::UploadNotReady(msg.into())
    }
}
