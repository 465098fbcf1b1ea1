//! Error types for the CircuitView ingestion pipeline.
//!
//! - [`DecodeError`] - the file could not be read as a table at all
//! - [`IngestError`] - the table was read but produced no usable dataset
//! - [`SummaryError`] - statistics requested for missing data
//! - [`PreferenceError`] - preference store IO
//! - [`ConfigError`] - invalid environment configuration
//! - [`SessionError`] - top-level wrapper used by the CLI
//!
//! Every message is meant to be shown to the user verbatim.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised while turning raw bytes into a header row plus data rows.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read file.
    #[error("Could not read the file: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing but whitespace in the upload.
    #[error("CSV file is empty or could not be parsed.")]
    EmptyFile,

    /// Header row present but without a single named column.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// The CSV reader gave up on a record.
    #[error("Parsing error on line {line}: {message}")]
    Malformed { line: u64, message: String },
}

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Fatal ingestion outcomes. Row-local problems never show up here; they are
/// reported as [`crate::transform::DroppedRow`] entries instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upstream decode failure.
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// No header contains "time", "timestamp" or "date".
    #[error("Could not find a time column. Please ensure a column is named 'time' or 'timestamp'.")]
    NoTimeColumn,

    /// Every row was dropped.
    #[error("No valid data rows could be parsed from the CSV. Check time format (DD/MM/YYYY HH:MM:SS) and numeric values.")]
    EmptyResult,

    /// Rows survived but no column carried a number.
    #[error("No valid numeric data columns could be found in the CSV file.")]
    NoNumericColumns,
}

// =============================================================================
// Summary Errors
// =============================================================================

/// Errors building a summary report.
#[derive(Debug, Error, PartialEq)]
pub enum SummaryError {
    #[error("No data to summarize")]
    NoData,

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Parameter '{0}' has no numeric values")]
    NoValues(String),
}

// =============================================================================
// Preference Errors
// =============================================================================

/// Errors from a preference store backend.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid delimiter '{0}': expected a single ASCII character")]
    InvalidDelimiter(String),

    #[error("Invalid vendor prefix pattern: {0}")]
    InvalidPrefix(#[from] regex::Error),
}

// =============================================================================
// Session Errors (top-level)
// =============================================================================

/// Top-level error wrapping everything a CLI command can hit.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Ingest(#[from] IngestError),

    #[error("{0}")]
    Summary(#[from] SummaryError),

    #[error("{0}")]
    Preference(#[from] PreferenceError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type DecodeResult<T> = Result<T, DecodeError>;

pub type IngestResult<T> = Result<T, IngestError>;

pub type SummaryResult<T> = Result<T, SummaryError>;

pub type PreferenceResult<T> = Result<T, PreferenceError>;

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let decode_err = DecodeError::EmptyFile;
        let ingest_err: IngestError = decode_err.into();
        assert!(ingest_err.to_string().contains("empty"));

        let session_err: SessionError = IngestError::NoTimeColumn.into();
        assert!(session_err.to_string().contains("time column"));
    }

    #[test]
    fn test_empty_result_guides_user() {
        let msg = IngestError::EmptyResult.to_string();
        assert!(msg.contains("time format"));
        assert!(msg.contains("numeric values"));
    }

    #[test]
    fn test_malformed_format() {
        let err = DecodeError::Malformed {
            line: 7,
            message: "unequal lengths".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("unequal lengths"));
    }
}
