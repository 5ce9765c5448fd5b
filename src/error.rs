//! Error types for scrobble extraction
//!
//! Errors come in three tiers:
//!
//! - [`ParseError`] aborts a whole `parse` call (bad path, bad configuration,
//!   unreadable file, wrong document shape). No partial result is returned.
//! - [`ConfigError`] is raised by `validate()` on a mapping configuration.
//! - [`RecordError`] is scoped to a single row or array element. Parsers never
//!   propagate it; it is rendered into `FileParseResult::errors` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File path must not be empty.")]
    EmptyPath,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Delimiter '{0}' cannot be used with this file.")]
    DelimiterClash(String),

    #[error("Expected a JSON array at the root.")]
    RootNotArray,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Delimiter must not be empty.")]
    EmptyDelimiter,

    #[error("Encoding '{0}' is not supported.")]
    UnknownEncoding(String),

    #[error("{0} must be >= 0.")]
    NegativeIndex(&'static str),

    #[error("{0} field name must not be empty.")]
    EmptyFieldName(&'static str),

    #[error("MillisecondsPlayedThreshold must be > 0.")]
    NonPositiveThreshold,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Timestamp could not be parsed")]
    UnparsableTimestamp,

    #[error("Field name in configuration must not be empty.")]
    EmptyFieldName,

    #[error("Missing required field '{0}'.")]
    MissingField(String),

    #[error("Field '{0}' is empty.")]
    EmptyField(String),

    #[error("Field '{0}' is not a string.")]
    NotAString(String),

    #[error("Field '{0}' is not a valid integer.")]
    InvalidInteger(String),

    #[error("Field '{0}' is not a valid timestamp.")]
    InvalidTimestamp(String),

    #[error("Field '{0}' is not a valid unix timestamp.")]
    InvalidUnixTimestamp(String),

    #[error("Field '{0}' has an unsupported timestamp format.")]
    UnsupportedTimestampFormat(String),

    #[error("Track must not be empty.")]
    EmptyTrack,

    #[error("Artist must not be empty.")]
    EmptyArtist,
}
