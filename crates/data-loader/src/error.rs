//! Error types for the data-loader crate.
//!
//! Loading errors (`DataLoadError`) happen once at startup and abort it.
//! Encoding errors (`EncodingError`) happen per request when a caller asks
//! for an identifier that was never seen while the index was built.

use thiserror::Error;

/// Errors that can occur during data loading and parsing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// Record in a data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A required column is absent from the header row
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

/// Lookup failures against a built [`IdentifierIndex`](crate::IdentifierIndex).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The id was not observed in the rating dataset at build time
    #[error("Unknown {kind} identifier: {id}")]
    UnknownIdentifier { kind: IdentifierKind, id: String },
}

/// Which of the two encodings a lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    User,
    Item,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::User => f.write_str("user"),
            IdentifierKind::Item => f.write_str("item"),
        }
    }
}
