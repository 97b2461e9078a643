//! Time window resolution for a gather session.

use chrono::{NaiveDateTime, TimeDelta};

use crate::constants::{MIN_SINCE_SECONDS, WIDEN_SLACK_MINUTES};
use crate::error::WindowError;
use crate::timeutil::{format_datetime, parse_datetime, truncate_to_hour};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct WindowOptions {
    pub from: Option<String>,
    pub to: Option<String>,
    pub since: Option<String>,
}

impl TimeWindow {
    pub fn duration(&self) -> TimeDelta {
        self.to - self.from
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from <= instant && instant <= self.to
    }

    /// Windows shorter than an hour may hold no snapshot at all, so they are
    /// re-anchored on the top of the `from` hour and stretched to 1h plus slack.
    pub fn widened(self) -> Self {
        if self.duration() >= TimeDelta::hours(1) {
            return self;
        }
        let from = truncate_to_hour(self.from);
        Self {
            from,
            to: from + TimeDelta::hours(1) + TimeDelta::minutes(WIDEN_SLACK_MINUTES),
        }
    }

    pub fn from_time_str(&self) -> String {
        format_datetime(self.from)
    }

    pub fn to_time_str(&self) -> String {
        format_datetime(self.to)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from_time_str(), self.to_time_str())
    }
}

pub fn resolve(options: &WindowOptions, now: NaiveDateTime) -> Result<TimeWindow, WindowError> {
    if let (Some(from_raw), Some(to_raw)) = (&options.from, &options.to) {
        let invalid_format = || WindowError::InvalidTimeFormat {
            from: from_raw.clone(),
            to: to_raw.clone(),
        };
        let from = parse_datetime(from_raw).map_err(|_| invalid_format())?;
        let to = parse_datetime(to_raw).map_err(|_| invalid_format())?;
        if to <= from {
            return Err(WindowError::InvalidTimeRange {
                from: from_raw.clone(),
                to: to_raw.clone(),
            });
        }
        return Ok(TimeWindow { from, to });
    }

    let Some(since_raw) = &options.since else {
        return Err(WindowError::MissingTimeSpec);
    };
    let out_of_range = || WindowError::InvalidSince(since_raw.clone());
    let since_seconds = parse_since(since_raw)?.max(MIN_SINCE_SECONDS);
    let lookback = TimeDelta::try_seconds(since_seconds).ok_or_else(out_of_range)?;
    let from = now.checked_sub_signed(lookback).ok_or_else(out_of_range)?;
    let to = now
        .checked_add_signed(TimeDelta::minutes(1))
        .ok_or_else(out_of_range)?;
    Ok(TimeWindow { from, to })
}

/// Parse `<n><m|h|d>` into seconds.
pub fn parse_since(raw: &str) -> Result<i64, WindowError> {
    let invalid = || WindowError::InvalidSince(raw.to_string());
    let trimmed = raw.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let multiplier = match unit {
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return Err(invalid()),
    };
    let digits = &trimmed[..trimmed.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: i64 = digits.parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}
