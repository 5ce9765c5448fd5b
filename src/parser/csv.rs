//! Delimited-text (CSV-style) scrobble parser
//!
//! Rows are located purely by column index; a header row is never assumed. The
//! file is decoded with the configured text encoding (a byte-order mark wins),
//! blank lines are skipped and every field is trimmed.
//!
//! Per row, in order:
//!
//! 1. **Timestamp**: the mapped column must resolve through
//!    [`TimestampParser::try_parse`] in [`ScrobbleMode::UseScrobbleTimestamp`];
//!    [`ScrobbleMode::Import`] stamps the current time instead
//! 2. **Short-play filter**: a duration column that parses and is at or below the
//!    threshold drops the row silently; a value that does not parse keeps it
//! 3. **Record**: track/artist/album/album artist are copied from their columns and
//!    the timestamp is advanced by exactly one second
//!
//! Failing rows become `"CSV line <n>: <reason>"` errors, with `n` counting
//! non-blank rows from 1.

use super::{ensure_file_path, FileFormat, FileParser, FileParserConfiguration};
use crate::duration::parse_play_duration;
use crate::error::{ConfigError, ParseError, RecordError};
use crate::logging::parse_span;
use crate::models::{FileParseResult, RowOutcome, ScrobbleData, ScrobbleMode};
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Duration, FixedOffset, Local};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Index value meaning "this column is not present".
pub const NO_FIELD: i32 = -1;

/// Immutable configuration snapshot for CSV parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFileParserConfiguration {
    /// Encoding label understood by `encoding_rs` (e.g. `utf-16`, `utf-8`, `windows-1252`).
    pub encoding: String,
    /// Field delimiter; any non-empty string.
    pub delimiter: String,
    pub timestamp_field_index: i32,
    pub track_field_index: i32,
    pub artist_field_index: i32,
    pub album_field_index: i32,
    pub album_artist_field_index: i32,
    pub milliseconds_played_field_index: i32,
    pub filter_short_played_songs: bool,
    pub milliseconds_played_threshold: i32,
}

impl Default for CsvFileParserConfiguration {
    fn default() -> Self {
        Self {
            encoding: "utf-16".to_string(),
            delimiter: ";".to_string(),
            timestamp_field_index: 0,
            track_field_index: 1,
            artist_field_index: 2,
            album_field_index: NO_FIELD,
            album_artist_field_index: NO_FIELD,
            milliseconds_played_field_index: NO_FIELD,
            filter_short_played_songs: false,
            milliseconds_played_threshold: 30_000,
        }
    }
}

impl CsvFileParserConfiguration {
    pub fn text_encoding(&self) -> Result<&'static Encoding, ConfigError> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| ConfigError::UnknownEncoding(self.encoding.clone()))
    }

}

impl FileParserConfiguration for CsvFileParserConfiguration {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter);
        }
        self.text_encoding()?;

        if self.timestamp_field_index < 0 {
            return Err(ConfigError::NegativeIndex("TimestampFieldIndex"));
        }
        if self.track_field_index < 0 {
            return Err(ConfigError::NegativeIndex("TrackFieldIndex"));
        }
        if self.artist_field_index < 0 {
            return Err(ConfigError::NegativeIndex("ArtistFieldIndex"));
        }
        if self.filter_short_played_songs && self.milliseconds_played_threshold <= 0 {
            return Err(ConfigError::NonPositiveThreshold);
        }

        Ok(())
    }
}

/// Editable working copy of a [`CsvFileParserConfiguration`].
///
/// This is what settings files and settings screens hold. The parser only ever
/// sees the snapshot produced by [`CsvConfigurationDraft::to_configuration`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfigurationDraft {
    pub encoding: String,
    /// Delimiter as typed by the user; `\t`, `tab`, `\n` and `\r` are unescaped.
    pub delimiter: String,
    pub timestamp_field_index: i32,
    pub track_field_index: i32,
    pub artist_field_index: i32,
    pub album_field_index: i32,
    pub album_artist_field_index: i32,
    pub milliseconds_played_field_index: i32,
    pub filter_short_played_songs: bool,
    pub milliseconds_played_threshold: i32,
}

impl Default for CsvConfigurationDraft {
    fn default() -> Self {
        Self::from(&CsvFileParserConfiguration::default())
    }
}

impl From<&CsvFileParserConfiguration> for CsvConfigurationDraft {
    fn from(config: &CsvFileParserConfiguration) -> Self {
        Self {
            encoding: config.encoding.clone(),
            delimiter: config.delimiter.clone(),
            timestamp_field_index: config.timestamp_field_index,
            track_field_index: config.track_field_index,
            artist_field_index: config.artist_field_index,
            album_field_index: config.album_field_index,
            album_artist_field_index: config.album_artist_field_index,
            milliseconds_played_field_index: config.milliseconds_played_field_index,
            filter_short_played_songs: config.filter_short_played_songs,
            milliseconds_played_threshold: config.milliseconds_played_threshold,
        }
    }
}

impl CsvConfigurationDraft {
    /// Freeze the draft into a validated snapshot.
    pub fn to_configuration(&self) -> Result<CsvFileParserConfiguration, ConfigError> {
        let config = CsvFileParserConfiguration {
            encoding: self.encoding.trim().to_string(),
            delimiter: resolve_delimiter(&self.delimiter),
            timestamp_field_index: self.timestamp_field_index,
            track_field_index: self.track_field_index,
            artist_field_index: self.artist_field_index,
            album_field_index: self.album_field_index,
            album_artist_field_index: self.album_artist_field_index,
            milliseconds_played_field_index: self.milliseconds_played_field_index,
            filter_short_played_songs: self.filter_short_played_songs,
            milliseconds_played_threshold: self.milliseconds_played_threshold,
        };

        config.validate()?;
        Ok(config)
    }
}

fn resolve_delimiter(delimiter: &str) -> String {
    match delimiter {
        "\\t" | "tab" | "TAB" => "\t".to_string(),
        "\\n" => "\n".to_string(),
        "\\r" => "\r".to_string(),
        other => other.to_string(),
    }
}

/// Column positions resolved once per parse; `None` for absent columns.
struct ColumnMap {
    timestamp: Option<usize>,
    track: Option<usize>,
    artist: Option<usize>,
    album: Option<usize>,
    album_artist: Option<usize>,
    milliseconds_played: Option<usize>,
}

impl From<&CsvFileParserConfiguration> for ColumnMap {
    fn from(config: &CsvFileParserConfiguration) -> Self {
        let column = |index: i32| usize::try_from(index).ok();

        Self {
            timestamp: column(config.timestamp_field_index),
            track: column(config.track_field_index),
            artist: column(config.artist_field_index),
            album: column(config.album_field_index),
            album_artist: column(config.album_artist_field_index),
            milliseconds_played: column(config.milliseconds_played_field_index),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvFileParser;

impl FileParser for CsvFileParser {
    type Config = CsvFileParserConfiguration;

    fn parse(
        &self,
        file: &Path,
        config: &Self::Config,
        mode: ScrobbleMode,
    ) -> Result<FileParseResult, ParseError> {
        ensure_file_path(file)?;

        let span = parse_span(FileFormat::Csv, file);
        let _enter = span.enter();

        if config.delimiter.is_empty() {
            return Err(ConfigError::EmptyDelimiter.into());
        }
        let encoding = config.text_encoding()?;

        let bytes = fs::read(file)?;
        let (text, used_encoding, had_errors) = encoding.decode(&bytes);
        if had_errors {
            warn!(
                encoding = used_encoding.name(),
                "File contains byte sequences that are invalid for its encoding; they were replaced"
            );
        }

        let (text, delimiter) = single_byte_delimiter(text, &config.delimiter)?;

        let rows = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(text.as_bytes())
            .into_records()
            .collect::<Result<Vec<_>, _>>()?;

        let columns = ColumnMap::from(config);

        let result: FileParseResult = rows
            .iter()
            .filter(|row| !is_blank(row))
            .enumerate()
            .map(|(index, row)| {
                let line = index + 1;

                match read_row(row, &columns, config, mode) {
                    Ok(Some(scrobble)) => RowOutcome::Accepted(scrobble),
                    Ok(None) => {
                        debug!(line, "Skipping short play");
                        RowOutcome::Skipped
                    }
                    Err(e) => {
                        debug!(line, error = %e, "Rejecting row");
                        RowOutcome::Failed(format!("{} line {}: {}", FileFormat::Csv.name(), line, e))
                    }
                }
            })
            .collect();

        info!(
            scrobbles = result.scrobbles().len(),
            errors = result.errors().len(),
            "Parsed CSV file"
        );

        Ok(result)
    }
}

/// Control bytes that can stand in for a delimiter the `csv` reader cannot take.
const DELIMITER_STAND_INS: [char; 5] = ['\u{1f}', '\u{1e}', '\u{1d}', '\u{1c}', '\u{7f}'];

/// Hand back `text` together with a one-byte delimiter for the `csv` reader.
///
/// An ASCII delimiter is used as is. Any other delimiter is rewritten, outside of
/// quoted fields, into a control byte that does not occur in the text.
fn single_byte_delimiter<'a>(
    text: Cow<'a, str>,
    delimiter: &str,
) -> Result<(Cow<'a, str>, u8), ParseError> {
    if let [byte] = delimiter.as_bytes() {
        if byte.is_ascii() {
            return Ok((text, *byte));
        }
    }

    let stand_in = DELIMITER_STAND_INS
        .into_iter()
        .find(|c| !text.contains(*c))
        .ok_or_else(|| ParseError::DelimiterClash(delimiter.to_string()))?;

    let rewritten = replace_unquoted(&text, delimiter, stand_in);
    Ok((Cow::Owned(rewritten), stand_in as u8))
}

/// Replace every `delimiter` outside a quoted field with `stand_in`.
///
/// A quote only opens a field when it is the first character of that field, and
/// `""` inside a quoted field is an escaped quote, as in the `csv` reader.
fn replace_unquoted(text: &str, delimiter: &str, stand_in: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut in_quotes = false;
    let mut field_start = true;

    while let Some(c) = rest.chars().next() {
        if in_quotes {
            if c == '"' {
                if rest[1..].starts_with('"') {
                    out.push_str("\"\"");
                    rest = &rest[2..];
                    continue;
                }
                in_quotes = false;
            }
        } else if rest.starts_with(delimiter) {
            out.push(stand_in);
            rest = &rest[delimiter.len()..];
            field_start = true;
            continue;
        } else if c == '"' && field_start {
            in_quotes = true;
        }

        field_start = !in_quotes && (c == '\n' || c == '\r');
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// A line holding nothing but whitespace.
fn is_blank(row: &::csv::StringRecord) -> bool {
    row.len() <= 1 && row.iter().all(str::is_empty)
}

fn field(row: &::csv::StringRecord, column: Option<usize>) -> Option<&str> {
    column.and_then(|index| row.get(index))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn is_short_play(played: Duration, threshold_ms: i32) -> bool {
    match played.num_microseconds() {
        Some(micros) => micros <= i64::from(threshold_ms) * 1_000,
        None => played.num_milliseconds() <= i64::from(threshold_ms),
    }
}

/// `Ok(None)` means the row was dropped by the short-play filter.
fn read_row(
    row: &::csv::StringRecord,
    columns: &ColumnMap,
    config: &CsvFileParserConfiguration,
    mode: ScrobbleMode,
) -> Result<Option<ScrobbleData>, RecordError> {
    let played_at: DateTime<FixedOffset> = match mode {
        ScrobbleMode::Import => Local::now().into(),
        ScrobbleMode::UseScrobbleTimestamp => field(row, columns.timestamp)
            .and_then(TimestampParser::try_parse)
            .ok_or(RecordError::UnparsableTimestamp)?,
    };

    if config.filter_short_played_songs {
        let played = field(row, columns.milliseconds_played).and_then(parse_play_duration);
        if let Some(played) = played {
            if is_short_play(played, config.milliseconds_played_threshold) {
                return Ok(None);
            }
        }
    }

    let played_at = played_at
        .checked_add_signed(Duration::seconds(1))
        .ok_or(RecordError::UnparsableTimestamp)?;

    let scrobble = ScrobbleData::new(
        field(row, columns.track).unwrap_or_default(),
        field(row, columns.artist).unwrap_or_default(),
        played_at,
    )?
    .with_album(non_empty(field(row, columns.album)))
    .with_album_artist(non_empty(field(row, columns.album_artist)));

    Ok(Some(scrobble))
}
