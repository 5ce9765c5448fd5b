//! Best-effort parsing of play-duration columns.
//!
//! Accepted shapes are `[-]d`, `[-][d.]h:m`, `[-][d.]h:m:s[.fraction]` and
//! `[-]d:h:m:s[.fraction]`, with hours below 24, minutes and seconds below 60
//! and at most seven fractional digits. Anything else is "not a duration",
//! which callers treat as "unknown" rather than "short".

use chrono::Duration;

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;

pub fn parse_play_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let micros = if body.contains(':') {
        parse_clock(body)?
    } else {
        parse_component(body, None)?.checked_mul(MICROS_PER_DAY)?
    };

    Some(Duration::microseconds(if negative { -micros } else { micros }))
}

fn parse_clock(body: &str) -> Option<i64> {
    let parts: Vec<&str> = body.split(':').collect();

    let (days, hours, minutes, seconds) = match parts.as_slice() {
        [head, minutes] => {
            let (days, hours) = split_days(head)?;
            (days, hours, *minutes, None)
        }
        [head, minutes, seconds] => {
            let (days, hours) = split_days(head)?;
            (days, hours, *minutes, Some(*seconds))
        }
        [days, hours, minutes, seconds] => {
            (parse_component(days, None)?, *hours, *minutes, Some(*seconds))
        }
        _ => return None,
    };

    let hours = parse_component(hours, Some(23))?;
    let minutes = parse_component(minutes, Some(59))?;
    let seconds = match seconds {
        Some(seconds) => parse_seconds(seconds)?,
        None => 0,
    };

    days.checked_mul(MICROS_PER_DAY)?
        .checked_add(hours * MICROS_PER_HOUR)?
        .checked_add(minutes * MICROS_PER_MINUTE)?
        .checked_add(seconds)
}

/// Splits an optional `d.` prefix off the hour component.
fn split_days(head: &str) -> Option<(i64, &str)> {
    match head.split_once('.') {
        Some((days, hours)) => Some((parse_component(days, None)?, hours)),
        None => Some((0, head)),
    }
}

fn parse_seconds(text: &str) -> Option<i64> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };

    let seconds = parse_component(whole, Some(59))? * MICROS_PER_SECOND;

    let fraction_micros = match fraction {
        None => 0,
        Some(digits) => {
            if digits.is_empty() || digits.len() > 7 || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Scale to 100ns ticks, then down to microseconds.
            let ticks: i64 = format!("{:0<7}", digits).parse().ok()?;
            ticks / 10
        }
    };

    Some(seconds + fraction_micros)
}

fn parse_component(text: &str, max: Option<i64>) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: i64 = text.parse().ok()?;
    match max {
        Some(max) if value > max => None,
        _ => Some(value),
    }
}
