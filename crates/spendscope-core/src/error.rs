use std::path::PathBuf;
use thiserror::Error;

use crate::models::CanonicalField;

/// Failures that invalidate a whole import, as opposed to a single bad row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The input grid has no rows at all.
    #[error("File must contain a header row")]
    MissingHeaderRow,

    /// The header row lacks a column for a required field.
    #[error(
        "File header must contain at least 'Date' and 'Amount' columns (unresolved: {})",
        join_fields(.missing)
    )]
    MissingRequiredColumns { missing: Vec<CanonicalField> },
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields
        .iter()
        .map(CanonicalField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// All errors produced by spendscope.
#[derive(Error, Debug)]
pub enum SpendError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spreadsheet or delimited-text file could not be decoded.
    #[error("Failed to decode {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// The file extension is not one of the supported import formats.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),

    /// The header row could not be mapped onto the canonical schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Every data row was rejected, or the file had none.
    #[error("No valid transactions found in {0}")]
    NoTransactions(PathBuf),

    /// The summarization service answered with an empty body.
    #[error("Received an empty response from the AI")]
    EmptyAiResponse,

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the spendscope crates.
pub type Result<T> = std::result::Result<T, SpendError>;
