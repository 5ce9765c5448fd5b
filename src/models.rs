//! Core Data Models
//!
//! This module defines the data that flows out of the parsers.
//!
//! ## Data Flow
//!
//! 1. **Per record**: each row or array element is turned into a [`RowOutcome`]
//!    (accepted scrobble, silently skipped, or failed with a message)
//! 2. **Aggregation**: the outcomes are folded, in input order, into a
//!    [`FileParseResult`] holding the accepted [`ScrobbleData`] and the error lines
//!
//! ## Core Types
//!
//! - [`ScrobbleData`] - One normalized play event
//! - [`ScrobbleMode`] - Where the timestamp of each record comes from
//! - [`FileParseResult`] - Outcome of parsing one file

use crate::error::RecordError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One normalized play event.
///
/// `track` and `artist` are never empty: [`ScrobbleData::new`] refuses to build
/// a record without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrobbleData {
    pub track: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(rename = "albumArtist", skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
}

impl ScrobbleData {
    pub fn new(
        track: impl Into<String>,
        artist: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Result<Self, RecordError> {
        let track = track.into();
        let artist = artist.into();

        if track.trim().is_empty() {
            return Err(RecordError::EmptyTrack);
        }
        if artist.trim().is_empty() {
            return Err(RecordError::EmptyArtist);
        }

        Ok(Self {
            track,
            artist,
            album: None,
            album_artist: None,
            timestamp,
        })
    }

    pub fn with_album(mut self, album: Option<String>) -> Self {
        self.album = album;
        self
    }

    pub fn with_album_artist(mut self, album_artist: Option<String>) -> Self {
        self.album_artist = album_artist;
        self
    }
}

/// Where the timestamp of each parsed record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrobbleMode {
    /// Ignore source timestamps and stamp every record with the current time.
    #[default]
    Import,
    /// Resolve the timestamp of every record from the source data.
    UseScrobbleTimestamp,
}

impl fmt::Display for ScrobbleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrobbleMode::Import => write!(f, "import"),
            ScrobbleMode::UseScrobbleTimestamp => write!(f, "use-scrobble-timestamp"),
        }
    }
}

/// What became of a single row or array element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(ScrobbleData),
    /// Dropped by the short-play filter; contributes to neither list.
    Skipped,
    Failed(String),
}

/// Scrobbles and per-record errors produced by one parse call, both in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileParseResult {
    scrobbles: Vec<ScrobbleData>,
    errors: Vec<String>,
}

impl FileParseResult {
    pub fn new(scrobbles: Vec<ScrobbleData>, errors: Vec<String>) -> Self {
        Self { scrobbles, errors }
    }

    pub fn scrobbles(&self) -> &[ScrobbleData] {
        &self.scrobbles
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl FromIterator<RowOutcome> for FileParseResult {
    fn from_iter<I: IntoIterator<Item = RowOutcome>>(iter: I) -> Self {
        let mut scrobbles = Vec::new();
        let mut errors = Vec::new();

        for outcome in iter {
            match outcome {
                RowOutcome::Accepted(scrobble) => scrobbles.push(scrobble),
                RowOutcome::Skipped => {}
                RowOutcome::Failed(message) => errors.push(message),
            }
        }

        Self { scrobbles, errors }
    }
}
