#![allow(dead_code)]

use scrobble_parse::parser::CsvFileParserConfiguration;
use std::io::Write;
use tempfile::NamedTempFile;

pub fn create_temp_file(suffix: &str, bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("scrobble_parse_")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

pub fn create_temp_csv(content: &str) -> NamedTempFile {
    create_temp_file(".csv", content.as_bytes())
}

pub fn create_temp_json(content: &str) -> NamedTempFile {
    create_temp_file(".json", content.as_bytes())
}

/// UTF-16 little endian, optionally preceded by a byte-order mark.
pub fn utf16le_bytes(content: &str, with_bom: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    if with_bom {
        bytes.extend_from_slice(&[0xFF, 0xFE]);
    }
    for unit in content.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// Comma-separated UTF-8 layout: timestamp, track, artist, album, album artist, played.
pub fn csv_config() -> CsvFileParserConfiguration {
    CsvFileParserConfiguration {
        encoding: "utf-8".to_string(),
        delimiter: ",".to_string(),
        timestamp_field_index: 0,
        track_field_index: 1,
        artist_field_index: 2,
        album_field_index: 3,
        album_artist_field_index: 4,
        milliseconds_played_field_index: 5,
        filter_short_played_songs: false,
        milliseconds_played_threshold: 0,
    }
}

pub fn filtering_csv_config(threshold_ms: i32) -> CsvFileParserConfiguration {
    CsvFileParserConfiguration {
        filter_short_played_songs: true,
        milliseconds_played_threshold: threshold_ms,
        ..csv_config()
    }
}
