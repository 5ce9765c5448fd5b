//! Output formatting for parse results
//!
//! Renders a [`FileParseResult`] either as a colored terminal listing or as JSON,
//! and persists the error list of a parse to a text file, one error per line.
//! Records that parsed are always shown, whatever the error count.

use crate::config::OutputConfig;
use crate::models::{FileParseResult, ScrobbleData};
use crate::parser::FileFormat;
use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub struct ReportDisplayManager {
    json_pretty: bool,
    timestamp_format: String,
}

impl Default for ReportDisplayManager {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}

impl ReportDisplayManager {
    pub fn new(output: &OutputConfig) -> Self {
        Self {
            json_pretty: output.json_pretty,
            timestamp_format: output.timestamp_format.clone(),
        }
    }

    pub fn render_json(&self, format: FileFormat, result: &FileParseResult) -> Result<String> {
        let output = serde_json::json!({
            "format": format,
            "scrobbles": result.scrobbles(),
            "errors": result.errors(),
        });

        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };

        Ok(rendered)
    }

    pub fn render_text(&self, file: &Path, format: FileFormat, result: &FileParseResult) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{} {} ({})\n",
            "Parsed".bold(),
            file.display(),
            format.name()
        ));

        for (position, scrobble) in result.scrobbles().iter().enumerate() {
            out.push_str(&format!("{:>5}  {}\n", position + 1, self.render_scrobble(scrobble)));
        }

        out.push_str(&format!(
            "\n{} scrobble{}",
            result.scrobbles().len().to_string().green().bold(),
            if result.scrobbles().len() == 1 { "" } else { "s" }
        ));

        if result.has_errors() {
            out.push_str(&format!(", {}", error_summary(result.errors().len()).yellow()));
        }
        out.push('\n');

        out
    }

    /// An invalid `timestamp_format` falls back to RFC 3339 instead of failing.
    fn format_timestamp(&self, scrobble: &ScrobbleData) -> String {
        let mut text = String::new();
        match write!(text, "{}", scrobble.timestamp.format(&self.timestamp_format)) {
            Ok(()) => text,
            Err(_) => scrobble.timestamp.to_rfc3339(),
        }
    }

    fn render_scrobble(&self, scrobble: &ScrobbleData) -> String {
        let mut line = format!(
            "{}  {} - {}",
            self.format_timestamp(scrobble).cyan(),
            scrobble.artist,
            scrobble.track.bold()
        );

        if let Some(album) = &scrobble.album {
            line.push_str(&format!(" [{}]", album));
        }
        if let Some(album_artist) = &scrobble.album_artist {
            if album_artist != &scrobble.artist {
                line.push_str(&format!(" ({})", album_artist.dimmed()));
            }
        }

        line
    }
}

/// The sentence shown when a parse produced record-level errors.
pub fn error_summary(count: usize) -> String {
    format!(
        "Parsing completed with {} error{}.",
        count,
        if count == 1 { "" } else { "s" }
    )
}

/// Write every error on its own line.
pub fn write_error_report(path: &Path, errors: &[String]) -> Result<()> {
    let mut content = errors.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write error report: {}", path.display()))
}
