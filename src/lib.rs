//! Scrobble Parse Library
//!
//! Extracts scrobbles (play events) from exported listening histories under a
//! user-supplied field mapping. One malformed row or element never aborts a file:
//! it is reported as an error line while the rest of the file keeps parsing.
//!
//! ## Architecture Overview
//!
//! - [`models`] - [`ScrobbleData`], [`ScrobbleMode`] and [`FileParseResult`]
//! - [`parser`] - the CSV and JSON parsers, their mapping configurations and the
//!   [`ConfiguredParser`] union used for runtime format selection
//! - [`timestamp_parser`] - timestamp resolution for text and JSON values
//! - [`duration`] - play-duration parsing for the CSV short-play filter
//! - [`error`] - call-level, configuration and record-level error types
//! - [`config`] - application configuration (TOML file plus environment)
//! - [`logging`] - structured logging setup
//! - [`report`] - terminal/JSON rendering and error report files
//!
//! ## Example
//!
//! ```rust,no_run
//! use scrobble_parse::parser::{ConfiguredParser, JsonFileParserConfiguration};
//! use scrobble_parse::ScrobbleMode;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let parser = ConfiguredParser::Json(JsonFileParserConfiguration::default());
//! let result = parser.parse(Path::new("StreamingHistory.json"), ScrobbleMode::UseScrobbleTimestamp)?;
//!
//! for scrobble in result.scrobbles() {
//!     println!("{} - {}", scrobble.artist, scrobble.track);
//! }
//! for error in result.errors() {
//!     eprintln!("{}", error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod duration;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod report;
pub mod timestamp_parser;

pub use error::{ConfigError, ParseError, RecordError};
pub use models::*;
pub use parser::{ConfiguredParser, FileFormat, FileParser, FileParserConfiguration};
