//! JSON-array scrobble parser
//!
//! The document root must be an array; anything else fails the whole call with
//! [`ParseError::RootNotArray`]. Each element is mapped to a scrobble through the
//! configured key names, and each failing element is recorded as
//! `"Object Number: <index> | Error: <message>"` with a 0-based index.

use super::{ensure_file_path, FileFormat, FileParser, FileParserConfiguration};
use crate::error::{ConfigError, ParseError, RecordError};
use crate::logging::parse_span;
use crate::models::{FileParseResult, RowOutcome, ScrobbleData, ScrobbleMode};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Immutable configuration snapshot for JSON parsing.
///
/// An empty optional key name means the field is not present in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileParserConfiguration {
    pub timestamp_field_name: String,
    pub track_field_name: String,
    pub artist_field_name: String,
    pub album_field_name: String,
    pub album_artist_field_name: String,
    pub filter_short_played_songs: bool,
    pub milliseconds_played_field_name: String,
    pub milliseconds_played_threshold: i32,
}

/// Key names of the extended streaming history export.
impl Default for JsonFileParserConfiguration {
    fn default() -> Self {
        Self {
            timestamp_field_name: "ts".to_string(),
            track_field_name: "master_metadata_track_name".to_string(),
            artist_field_name: "master_metadata_album_artist_name".to_string(),
            album_field_name: "master_metadata_album_album_name".to_string(),
            album_artist_field_name: "master_metadata_album_artist_name".to_string(),
            filter_short_played_songs: false,
            milliseconds_played_field_name: "ms_played".to_string(),
            milliseconds_played_threshold: 30_000,
        }
    }
}

impl FileParserConfiguration for JsonFileParserConfiguration {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_field_name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("Timestamp"));
        }
        if self.track_field_name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("Track"));
        }
        if self.artist_field_name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName("Artist"));
        }
        if self.filter_short_played_songs && self.milliseconds_played_threshold <= 0 {
            return Err(ConfigError::NonPositiveThreshold);
        }

        Ok(())
    }
}

/// Editable working copy of a [`JsonFileParserConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonConfigurationDraft {
    pub timestamp_field_name: String,
    pub track_field_name: String,
    pub artist_field_name: String,
    pub album_field_name: String,
    pub album_artist_field_name: String,
    pub filter_short_played_songs: bool,
    pub milliseconds_played_field_name: String,
    pub milliseconds_played_threshold: i32,
}

impl Default for JsonConfigurationDraft {
    fn default() -> Self {
        Self::from(&JsonFileParserConfiguration::default())
    }
}

impl From<&JsonFileParserConfiguration> for JsonConfigurationDraft {
    fn from(config: &JsonFileParserConfiguration) -> Self {
        Self {
            timestamp_field_name: config.timestamp_field_name.clone(),
            track_field_name: config.track_field_name.clone(),
            artist_field_name: config.artist_field_name.clone(),
            album_field_name: config.album_field_name.clone(),
            album_artist_field_name: config.album_artist_field_name.clone(),
            filter_short_played_songs: config.filter_short_played_songs,
            milliseconds_played_field_name: config.milliseconds_played_field_name.clone(),
            milliseconds_played_threshold: config.milliseconds_played_threshold,
        }
    }
}

impl JsonConfigurationDraft {
    /// Freeze the draft into a validated snapshot.
    pub fn to_configuration(&self) -> Result<JsonFileParserConfiguration, ConfigError> {
        let config = JsonFileParserConfiguration {
            timestamp_field_name: self.timestamp_field_name.clone(),
            track_field_name: self.track_field_name.clone(),
            artist_field_name: self.artist_field_name.clone(),
            album_field_name: self.album_field_name.clone(),
            album_artist_field_name: self.album_artist_field_name.clone(),
            filter_short_played_songs: self.filter_short_played_songs,
            milliseconds_played_field_name: self.milliseconds_played_field_name.clone(),
            milliseconds_played_threshold: self.milliseconds_played_threshold,
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileParser;

impl FileParser for JsonFileParser {
    type Config = JsonFileParserConfiguration;

    fn parse(
        &self,
        file: &Path,
        config: &Self::Config,
        mode: ScrobbleMode,
    ) -> Result<FileParseResult, ParseError> {
        ensure_file_path(file)?;
        config.validate()?;

        let span = parse_span(FileFormat::Json, file);
        let _enter = span.enter();

        let content = match String::from_utf8(fs::read(file)?) {
            Ok(content) => content,
            Err(e) => {
                warn!("File is not valid UTF-8; invalid byte sequences were replaced");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        let document: Value = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;

        let elements = document.as_array().ok_or(ParseError::RootNotArray)?;

        let result: FileParseResult = elements
            .iter()
            .enumerate()
            .map(|(index, element)| match read_element(element, config, mode) {
                Ok(Some(scrobble)) => RowOutcome::Accepted(scrobble),
                Ok(None) => {
                    debug!(index, "Skipping short play");
                    RowOutcome::Skipped
                }
                Err(e) => {
                    debug!(index, error = %e, "Rejecting element");
                    RowOutcome::Failed(format!("Object Number: {} | Error: {}", index, e))
                }
            })
            .collect();

        info!(
            elements = elements.len(),
            scrobbles = result.scrobbles().len(),
            errors = result.errors().len(),
            "Parsed JSON file"
        );

        Ok(result)
    }
}

/// `Ok(None)` means the element was dropped by the short-play filter.
fn read_element(
    element: &Value,
    config: &JsonFileParserConfiguration,
    mode: ScrobbleMode,
) -> Result<Option<ScrobbleData>, RecordError> {
    let timestamp: DateTime<FixedOffset> = match mode {
        ScrobbleMode::Import => Local::now().into(),
        ScrobbleMode::UseScrobbleTimestamp => {
            TimestampParser::from_json_field(element, &config.timestamp_field_name)?
        }
    };

    let track = read_required_string(element, &config.track_field_name)?;
    let artist = read_required_string(element, &config.artist_field_name)?;

    let album = read_optional_string(element, &config.album_field_name)
        .filter(|album| !album.trim().is_empty());
    let album_artist = read_optional_string(element, &config.album_artist_field_name)
        .filter(|album_artist| !album_artist.is_empty());

    if config.filter_short_played_songs {
        let played = read_optional_int(element, &config.milliseconds_played_field_name)?;
        if matches!(played, Some(ms) if ms < config.milliseconds_played_threshold) {
            return Ok(None);
        }
    }

    let scrobble = ScrobbleData::new(track, artist, timestamp)?
        .with_album(album)
        .with_album_artist(album_artist);

    Ok(Some(scrobble))
}

/// Look up `field_name`, treating a JSON `null` like a missing key.
fn lookup<'a>(element: &'a Value, field_name: &str) -> Option<&'a Value> {
    element.get(field_name).filter(|value| !value.is_null())
}

fn read_required_string(element: &Value, field_name: &str) -> Result<String, RecordError> {
    if field_name.trim().is_empty() {
        return Err(RecordError::EmptyFieldName);
    }

    let value = lookup(element, field_name)
        .ok_or_else(|| RecordError::MissingField(field_name.to_string()))?;

    let text = value
        .as_str()
        .ok_or_else(|| RecordError::NotAString(field_name.to_string()))?;

    if text.trim().is_empty() {
        return Err(RecordError::EmptyField(field_name.to_string()));
    }

    Ok(text.to_string())
}

fn read_optional_string(element: &Value, field_name: &str) -> Option<String> {
    if field_name.trim().is_empty() {
        return None;
    }

    lookup(element, field_name).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

fn read_optional_int(element: &Value, field_name: &str) -> Result<Option<i32>, RecordError> {
    if field_name.trim().is_empty() {
        return Ok(None);
    }

    let Some(value) = lookup(element, field_name) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<i32>().ok(),
        _ => None,
    };

    parsed
        .map(Some)
        .ok_or_else(|| RecordError::InvalidInteger(field_name.to_string()))
}
