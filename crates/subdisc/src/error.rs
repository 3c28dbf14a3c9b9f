//! Error types for subgroup discovery and validation.
//!
//! Errors are serializable so a front end can receive a stable `code` next to
//! the human-readable message.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::target::TargetType;

/// The main error type of the crate.
#[derive(Error, Debug)]
pub enum SubdiscError {
    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// Column index is outside the table.
    #[error("Column index {index} out of range (table has {count} columns)")]
    ColumnIndexOutOfRange { index: usize, count: usize },

    /// Invalid search or validation configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column does not have the attribute type an operation requires.
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    AttributeTypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// Columns of a table must all have the same length.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// The target concept cannot be evaluated by the search engine.
    #[error("Target type {0} is not supported by {1}")]
    UnsupportedTarget(TargetType, &'static str),

    /// There is no subgroup to compare baseline samples against.
    #[error("Subgroup set is empty")]
    EmptySubgroupSet,

    /// A validation run produced no baseline samples.
    #[error("No baseline qualities to compare against")]
    NoBaselineSamples,

    /// Swap randomization kept finding zero subgroups for one repetition.
    #[error("Swap randomization found no subgroups in repetition {repetition} after {attempts} attempts")]
    SwapRandomizationExhausted { repetition: usize, attempts: usize },

    /// Random description sampling never met the coverage constraints.
    #[error("No random description with coverage in [{minimum}, {rows}) after {attempts} attempts")]
    RandomDescriptionExhausted {
        minimum: usize,
        rows: usize,
        attempts: usize,
    },

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration validation error wrapper.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SubdiscError>,
    },
}

impl SubdiscError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SubdiscError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::ColumnIndexOutOfRange { .. } => "COLUMN_INDEX_OUT_OF_RANGE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::AttributeTypeMismatch { .. } => "ATTRIBUTE_TYPE_MISMATCH",
            Self::RowCountMismatch { .. } => "ROW_COUNT_MISMATCH",
            Self::UnsupportedTarget(..) => "UNSUPPORTED_TARGET",
            Self::EmptySubgroupSet => "EMPTY_SUBGROUP_SET",
            Self::NoBaselineSamples => "NO_BASELINE_SAMPLES",
            Self::SwapRandomizationExhausted { .. } => "SWAP_RANDOMIZATION_EXHAUSTED",
            Self::RandomDescriptionExhausted { .. } => "RANDOM_DESCRIPTION_EXHAUSTED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if the run can be retried with different settings.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidConfig(_)
            | Self::Config(_)
            | Self::SwapRandomizationExhausted { .. }
            | Self::RandomDescriptionExhausted { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for SubdiscError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SubdiscError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for subgroup discovery operations.
pub type Result<T> = std::result::Result<T, SubdiscError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SubdiscError::Polars(e).with_context(context))
    }
}
