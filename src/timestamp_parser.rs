use crate::error::RecordError;
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Date-time layouts accepted by the general parse, most specific first.
const GENERAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const GENERAL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Explicit layouts tried once the general parse has given up (`M/dd/yyyy h:mm`).
const FALLBACK_FORMATS: &[&str] = &["%m/%d/%Y %H:%M"];

/// Handles parsing timestamps out of exported play histories
pub struct TimestampParser;

impl TimestampParser {
    /// Resolve a text timestamp, trying the general parse first and the
    /// explicit fallback layouts after it.
    ///
    /// Strings carrying an offset keep it; naive strings are read as local time.
    /// Returns `None` only when every strategy fails.
    pub fn try_parse(text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(dt) = Self::parse_with_offset(text) {
            return Some(dt);
        }

        if let Some(naive) = Self::parse_naive(text) {
            return Some(Self::assume_local(naive));
        }

        FALLBACK_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(Self::assume_local)
    }

    /// Resolve the timestamp stored under `field_name` in a JSON object.
    ///
    /// Strings are read as ISO-8601 and normalized to UTC (naive strings are
    /// assumed to be UTC already), whole numbers are Unix seconds.
    pub fn from_json_field(
        element: &Value,
        field_name: &str,
    ) -> Result<DateTime<FixedOffset>, RecordError> {
        let value = match element.get(field_name) {
            None | Some(Value::Null) => {
                return Err(RecordError::MissingField(field_name.to_string()))
            }
            Some(value) => value,
        };

        match value {
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Err(RecordError::EmptyField(field_name.to_string()));
                }

                Self::parse_iso8601_utc(s)
                    .ok_or_else(|| RecordError::InvalidTimestamp(field_name.to_string()))
            }
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .map(Into::into)
                .ok_or_else(|| RecordError::InvalidUnixTimestamp(field_name.to_string())),
            _ => Err(RecordError::UnsupportedTimestampFormat(
                field_name.to_string(),
            )),
        }
    }

    fn parse_iso8601_utc(text: &str) -> Option<DateTime<FixedOffset>> {
        if let Some(dt) = Self::parse_with_offset(text) {
            return Some(dt.with_timezone(&Utc).into());
        }

        Self::parse_naive(text)
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into())
    }

    fn parse_with_offset(text: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_rfc2822(text))
            .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f %:z"))
            .ok()
    }

    fn parse_naive(text: &str) -> Option<NaiveDateTime> {
        GENERAL_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                GENERAL_DATE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    }

    fn assume_local(naive: NaiveDateTime) -> DateTime<FixedOffset> {
        // Wall-clock times skipped by a DST jump fall back to UTC.
        match Local.from_local_datetime(&naive).earliest() {
            Some(local) => local.into(),
            None => DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into(),
        }
    }
}
