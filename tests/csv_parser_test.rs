//! Tests for the delimited-text parser

use chrono::{Local, NaiveDateTime};
use scrobble_parse::parser::{CsvFileParser, CsvFileParserConfiguration};
use scrobble_parse::{FileParser, ParseError, ScrobbleMode};
use std::path::Path;

mod common;

use common::{create_temp_csv, create_temp_file, csv_config, filtering_csv_config, utf16le_bytes};

fn naive(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn test_empty_path_fails_before_reading() {
    let result = CsvFileParser.parse(Path::new(""), &csv_config(), ScrobbleMode::UseScrobbleTimestamp);
    assert!(matches!(result, Err(ParseError::EmptyPath)));
}

#[test]
fn test_missing_file_is_fatal() {
    let result = CsvFileParser.parse(
        Path::new("/definitely/not/here.csv"),
        &csv_config(),
        ScrobbleMode::Import,
    );
    assert!(matches!(result, Err(ParseError::Io(_))));
}

#[test]
fn test_unknown_encoding_is_fatal() {
    let file = create_temp_csv("2025-01-02 03:04:05,Track,Artist\n");
    let config = CsvFileParserConfiguration {
        encoding: "not-an-encoding".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser.parse(file.path(), &config, ScrobbleMode::Import);
    assert!(matches!(result, Err(ParseError::InvalidConfiguration(_))));
}

#[test]
fn test_valid_timestamp_is_advanced_by_one_second() {
    let file = create_temp_csv("2025-01-02 03:04:05,Track B,Artist B,Album B,AlbumArtist B,00:10:00\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty());
    assert_eq!(result.scrobbles().len(), 1);

    let scrobble = &result.scrobbles()[0];
    assert_eq!(scrobble.track, "Track B");
    assert_eq!(scrobble.artist, "Artist B");
    assert_eq!(scrobble.album.as_deref(), Some("Album B"));
    assert_eq!(scrobble.album_artist.as_deref(), Some("AlbumArtist B"));
    assert_eq!(scrobble.timestamp.naive_local(), naive("2025-01-02 03:04:06"));
}

#[test]
fn test_timestamp_with_offset_keeps_offset() {
    let file = create_temp_csv("2025-01-02T03:04:05+02:00,Track,Artist\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    let scrobble = &result.scrobbles()[0];
    assert_eq!(scrobble.timestamp.offset().local_minus_utc(), 7200);
    assert_eq!(scrobble.timestamp.naive_local(), naive("2025-01-02 03:04:06"));
}

#[test]
fn test_fallback_timestamp_format() {
    let file = create_temp_csv("1/02/2025 3:04,Track,Artist\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(
        result.scrobbles()[0].timestamp.naive_local(),
        naive("2025-01-02 03:04:01")
    );
}

#[test]
fn test_blank_timestamp_adds_error_and_skips_row() {
    let file = create_temp_csv(",Track C,Artist C,Album C,AlbumArtist C,00:10:00\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.scrobbles().is_empty());
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("CSV line 1:"));
    assert!(result.errors()[0].contains("Timestamp could not be parsed"));
}

#[test]
fn test_invalid_timestamp_adds_error_and_skips_row() {
    let file = create_temp_csv("definitely-not-a-date,Track D,Artist D,Album D,AlbumArtist D,00:10:00\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.scrobbles().is_empty());
    assert_eq!(result.errors(), &["CSV line 1: Timestamp could not be parsed".to_string()]);
}

#[test]
fn test_import_mode_ignores_source_timestamp() {
    let file = create_temp_csv("definitely-not-a-date,Track,Artist\n");

    let before = Local::now();
    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::Import)
        .unwrap();
    let after = Local::now();

    assert!(result.errors().is_empty());
    let stamped = result.scrobbles()[0].timestamp;
    assert!(stamped >= before + chrono::Duration::seconds(1));
    assert!(stamped <= after + chrono::Duration::seconds(1));
}

#[test]
fn test_short_play_at_or_below_threshold_is_dropped() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05,Track E,Artist E,Album E,AlbumArtist E,00:00:01\n\
         2025-01-02 03:04:05,Track E2,Artist E2,,,00:00:00.5\n",
    );

    let result = CsvFileParser
        .parse(file.path(), &filtering_csv_config(1000), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty());
    assert!(result.scrobbles().is_empty());
}

#[test]
fn test_short_play_above_threshold_is_kept() {
    let file = create_temp_csv("2025-01-02 03:04:05,Track F,Artist F,Album F,AlbumArtist F,00:00:02\n");

    let result = CsvFileParser
        .parse(file.path(), &filtering_csv_config(1000), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty());
    assert_eq!(result.scrobbles().len(), 1);
}

#[test]
fn test_unparsable_duration_is_not_short() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05,Track G,Artist G,Album G,AlbumArtist G,not-a-timespan\n\
         2025-01-02 03:04:05,Track H,Artist H\n",
    );

    let result = CsvFileParser
        .parse(file.path(), &filtering_csv_config(1000), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty());
    assert_eq!(result.scrobbles().len(), 2);
}

#[test]
fn test_filter_disabled_keeps_short_plays() {
    let file = create_temp_csv("2025-01-02 03:04:05,Track,Artist,,,00:00:01\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles().len(), 1);
}

#[test]
fn test_uses_delimiter_from_config() {
    let file = create_temp_csv("2025-01-02 03:04:05;Track H;Artist H;Album H;AlbumArtist H;00:00:10\n");
    let config = CsvFileParserConfiguration {
        delimiter: ";".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser
        .parse(file.path(), &config, ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty());
    assert_eq!(result.scrobbles()[0].track, "Track H");
    assert_eq!(result.scrobbles()[0].artist, "Artist H");
}

#[test]
fn test_multi_character_delimiter() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05||Track|Pipe||Artist P||\"Quoted || Album\"\n\
         2025-01-02 03:10:00 || Track Q || Artist Q\n",
    );
    let config = CsvFileParserConfiguration {
        delimiter: "||".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser
        .parse(file.path(), &config, ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.scrobbles().len(), 2);

    let first = &result.scrobbles()[0];
    assert_eq!(first.track, "Track|Pipe");
    assert_eq!(first.artist, "Artist P");
    assert_eq!(first.album.as_deref(), Some("Quoted || Album"));

    assert_eq!(result.scrobbles()[1].track, "Track Q");
    assert_eq!(result.scrobbles()[1].artist, "Artist Q");
}

#[test]
fn test_non_ascii_delimiter() {
    let file = create_temp_csv("2025-01-02 03:04:05\u{a7}Caf\u{e9} Song\u{a7}Artist \u{c9}\n");
    let config = CsvFileParserConfiguration {
        delimiter: "\u{a7}".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser
        .parse(file.path(), &config, ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.scrobbles()[0].track, "Caf\u{e9} Song");
    assert_eq!(result.scrobbles()[0].artist, "Artist \u{c9}");
}

#[test]
fn test_reports_line_number_of_second_row() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05,Track I,Artist I,Album I,AlbumArtist I,00:00:10\n\
         bad-date,Track J,Artist J,Album J,AlbumArtist J,00:00:10\n",
    );

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles().len(), 1);
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("CSV line 2:"));
}

#[test]
fn test_blank_lines_are_not_counted() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05,Track,Artist\n\
         \n\
         \x20\x20\x20\n\
         bad-date,Track,Artist\n",
    );

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles().len(), 1);
    assert_eq!(result.errors(), &["CSV line 2: Timestamp could not be parsed".to_string()]);
}

#[test]
fn test_filtered_rows_keep_line_numbering() {
    let file = create_temp_csv(
        "2025-01-02 03:04:05,Short,Artist,,,00:00:01\n\
         bad-date,Track,Artist,,,00:10:00\n\
         2025-01-02 03:05:05,Long,Artist,,,00:10:00\n\
         also-bad,Track,Artist,,,00:10:00\n",
    );

    let result = CsvFileParser
        .parse(file.path(), &filtering_csv_config(30_000), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles().len(), 1);
    assert_eq!(result.scrobbles()[0].track, "Long");
    assert_eq!(
        result.errors(),
        &[
            "CSV line 2: Timestamp could not be parsed".to_string(),
            "CSV line 4: Timestamp could not be parsed".to_string(),
        ]
    );
    assert!(result.scrobbles().len() + result.errors().len() <= 4);
}

#[test]
fn test_missing_track_column_becomes_row_error() {
    let file = create_temp_csv("2025-01-02 03:04:05\n2025-01-02 03:04:05,,Artist\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.scrobbles().is_empty());
    assert_eq!(
        result.errors(),
        &[
            "CSV line 1: Track must not be empty.".to_string(),
            "CSV line 2: Track must not be empty.".to_string(),
        ]
    );
}

#[test]
fn test_short_rows_leave_optional_fields_empty() {
    let file = create_temp_csv("2025-01-02 03:04:05,Track,Artist\n");

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    let scrobble = &result.scrobbles()[0];
    assert!(scrobble.album.is_none());
    assert!(scrobble.album_artist.is_none());
}

#[test]
fn test_fields_are_trimmed_and_quotes_respected() {
    let file = create_temp_csv(
        "  2025-01-02 03:04:05 ,\"Track, with comma\", Artist K ,  Album K  \n",
    );

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert!(result.errors().is_empty(), "{:?}", result.errors());
    let scrobble = &result.scrobbles()[0];
    assert_eq!(scrobble.track, "Track, with comma");
    assert_eq!(scrobble.artist, "Artist K");
    assert_eq!(scrobble.album.as_deref(), Some("Album K"));
}

#[test]
fn test_duplicates_are_kept_in_order() {
    let row = "2025-01-02 03:04:05,Same,Artist\n";
    let file = create_temp_csv(&row.repeat(3));

    let result = CsvFileParser
        .parse(file.path(), &csv_config(), ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles().len(), 3);
    assert!(result.scrobbles().iter().all(|s| s.track == "Same"));
}

#[test]
fn test_default_configuration_reads_utf16() {
    let content = "2025-01-02 03:04:05;Trąck;Ärtist\r\n2025-01-02 03:09:05;Second;Artist\r\n";

    for with_bom in [true, false] {
        let file = create_temp_file(".csv", &utf16le_bytes(content, with_bom));

        let result = CsvFileParser
            .parse(
                file.path(),
                &CsvFileParserConfiguration::default(),
                ScrobbleMode::UseScrobbleTimestamp,
            )
            .unwrap();

        assert!(result.errors().is_empty(), "{:?}", result.errors());
        assert_eq!(result.scrobbles().len(), 2);
        assert_eq!(result.scrobbles()[0].track, "Trąck");
        assert_eq!(result.scrobbles()[0].artist, "Ärtist");
    }
}

#[test]
fn test_bom_overrides_configured_encoding() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("2025-01-02 03:04:05,Café,Artist\n".as_bytes());
    let file = create_temp_file(".csv", &bytes);

    let config = CsvFileParserConfiguration {
        encoding: "windows-1252".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser
        .parse(file.path(), &config, ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles()[0].track, "Café");
}

#[test]
fn test_single_byte_encoding() {
    let file = create_temp_file(".csv", b"2025-01-02 03:04:05,Caf\xE9,Artist\n");
    let config = CsvFileParserConfiguration {
        encoding: "windows-1252".to_string(),
        ..csv_config()
    };

    let result = CsvFileParser
        .parse(file.path(), &config, ScrobbleMode::UseScrobbleTimestamp)
        .unwrap();

    assert_eq!(result.scrobbles()[0].track, "Café");
}
