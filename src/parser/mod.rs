//! File Parsers
//!
//! Each supported export format owns a mapping configuration and a parser:
//!
//! - [`csv`] - delimited text, fields located by column index
//! - [`json`] - a JSON array of objects, fields located by key
//!
//! Parsers implement [`FileParser`], whose associated configuration type implements
//! [`FileParserConfiguration`]. Callers that pick a format at runtime go through
//! [`ConfiguredParser`], a closed union of "format + validated configuration".
//!
//! ## Error isolation
//!
//! A parse call either fails as a whole with a [`ParseError`] (empty path, invalid
//! configuration, unreadable file, JSON root that is not an array) or returns a
//! [`FileParseResult`]. Everything that goes wrong inside a single row or element is
//! recorded as an error line in that result and parsing moves on.

pub mod csv;
pub mod json;

use crate::error::{ConfigError, ParseError};
use crate::models::{FileParseResult, ScrobbleMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use self::csv::{CsvConfigurationDraft, CsvFileParser, CsvFileParserConfiguration};
pub use self::json::{JsonConfigurationDraft, JsonFileParser, JsonFileParserConfiguration};

/// Precondition checks on a mapping configuration. Never inspects file contents.
pub trait FileParserConfiguration {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Turns one file into scrobbles under a mapping configuration.
pub trait FileParser {
    type Config: FileParserConfiguration;

    fn parse(
        &self,
        file: &Path,
        config: &Self::Config,
        mode: ScrobbleMode,
    ) -> Result<FileParseResult, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub const ALL: [FileFormat; 2] = [FileFormat::Csv, FileFormat::Json];

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Json => "JSON",
        }
    }

    pub fn supported_extensions(self) -> &'static [&'static str] {
        match self {
            FileFormat::Csv => &[".csv"],
            FileFormat::Json => &[".json"],
        }
    }

    /// Guess the format from a file's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let dotted = format!(".{}", extension);

        Self::ALL
            .into_iter()
            .find(|format| format.supported_extensions().contains(&dotted.as_str()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A format selected at runtime together with the configuration snapshot it parses with.
///
/// Adding a format means adding a variant here; existing parsers stay untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguredParser {
    Csv(CsvFileParserConfiguration),
    Json(JsonFileParserConfiguration),
}

impl ConfiguredParser {
    pub fn format(&self) -> FileFormat {
        match self {
            ConfiguredParser::Csv(_) => FileFormat::Csv,
            ConfiguredParser::Json(_) => FileFormat::Json,
        }
    }

    pub fn name(&self) -> &'static str {
        self.format().name()
    }

    pub fn supported_extensions(&self) -> &'static [&'static str] {
        self.format().supported_extensions()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ConfiguredParser::Csv(config) => config.validate(),
            ConfiguredParser::Json(config) => config.validate(),
        }
    }

    pub fn parse(&self, file: &Path, mode: ScrobbleMode) -> Result<FileParseResult, ParseError> {
        match self {
            ConfiguredParser::Csv(config) => CsvFileParser.parse(file, config, mode),
            ConfiguredParser::Json(config) => JsonFileParser.parse(file, config, mode),
        }
    }
}

/// Rejects empty and whitespace-only paths before any file access.
pub(crate) fn ensure_file_path(file: &Path) -> Result<(), ParseError> {
    if file.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(ParseError::EmptyPath);
    }
    Ok(())
}
