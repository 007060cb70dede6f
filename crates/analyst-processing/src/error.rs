//! Error types for the profiling and cleaning engine.
//!
//! The engine itself only ever reports two kinds of failure:
//! [`AnalystError::Configuration`] and [`AnalystError::DataShape`]. The
//! remaining variants cover the IO boundary (CSV loading, preference files,
//! JSON rendering) used by the CLI and callers embedding the library.
//!
//! Errors are serializable as `{code, message}` so they can be forwarded to
//! whatever surface drives the pipeline.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the analyst processing crate.
#[derive(Error, Debug)]
pub enum AnalystError {
    /// The cleaning configuration is unusable for this dataset.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The dataset has no rows or no columns.
    #[error("Invalid dataset shape: {0}")]
    DataShape(String),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A preference file line could not be understood.
    #[error("Invalid preference on line {line}: {reason}")]
    Preferences { line: usize, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalystError>,
    },
}

impl AnalystError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalystError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::DataShape(_) => "DATA_SHAPE_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Preferences { .. } => "PREFERENCES_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by the configuration.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Configuration(_) | Self::Preferences { .. } => true,
            Self::WithContext { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// Check if this error was caused by an empty dataset.
    pub fn is_data_shape(&self) -> bool {
        match self {
            Self::DataShape(_) => true,
            Self::WithContext { source, .. } => source.is_data_shape(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for AnalystError {
    fn from(err: ConfigValidationError) -> Self {
        AnalystError::Configuration(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AnalystError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalystError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analyst operations.
pub type Result<T> = std::result::Result<T, AnalystError>;

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
        self.map_err(|e| AnalystError::Polars(e).with_context(context))
    }
}
