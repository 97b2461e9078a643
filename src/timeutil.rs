//! Datetime parsing and formatting shared by the resolver, the snapshot
//! selector and report naming. Control-plane timestamps are converted to local
//! wall-clock time here and nowhere else.

use chrono::{Local, NaiveDateTime, ParseError, TimeZone, Timelike};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const FILENAME_FORMAT: &str = "%Y%m%d%H%M%S";

const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT)
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub fn filename_stamp(value: NaiveDateTime) -> String {
    value.format(FILENAME_FORMAT).to_string()
}

pub fn now_local() -> NaiveDateTime {
    truncate_subsec(Local::now().naive_local())
}

pub fn truncate_subsec(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

pub fn truncate_to_hour(value: NaiveDateTime) -> NaiveDateTime {
    value
        .date()
        .and_hms_opt(value.hour(), 0, 0)
        .unwrap_or(value)
}

/// Convert a control-plane UTC timestamp (`2023-01-01T08:00:00.123Z`) to
/// wall-clock time in `tz`.
pub fn utc_to_local_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Result<NaiveDateTime, ParseError> {
    let naive = parse_utc(raw)?;
    Ok(tz.from_utc_datetime(&naive).naive_local())
}

fn parse_utc(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = raw.trim();
    let whole_seconds = trimmed.split('.').next().unwrap_or(trimmed);
    let whole_seconds = whole_seconds.trim_end_matches('Z').replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&whole_seconds, UTC_FORMAT)
}
