// ABOUTME: Date-only normalization, weekday indexing and inclusive date ranges
// ABOUTME: Every boundary (query input, ledger write, aggregation) converts dates through here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Calendar Dates
//!
//! Habit scheduling works on calendar days, never on instants. Inputs that
//! carry a time of day are converted into the caller's timezone and truncated
//! exactly once, at the boundary, so that no comparison downstream ever mixes
//! timezone-aware and date-only values.
//!
//! Weekdays are indexed ISO style: Monday = 0 through Sunday = 6, matching the
//! order of the seven frequency fields of a programme habit.

use crate::constants::{DATE_FORMAT, DAYS_PER_WEEK, MAX_SUPPORTED_YEAR, MIN_SUPPORTED_YEAR};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

/// Index of `date`'s weekday into a seven-slot frequency array (Monday = 0)
#[must_use]
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Weekday for a frequency array slot, the inverse of [`weekday_index`]
#[must_use]
pub fn weekday_at(index: usize) -> Weekday {
    match index % DAYS_PER_WEEK {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Render a date in the wire and storage format (`yyyy-MM-dd`)
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a stored or wire `yyyy-MM-dd` value
///
/// # Errors
///
/// Returns `InvalidFormat` when the text is not a valid calendar date
pub fn parse_date(text: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| AppError::invalid_format(format!("Invalid date '{text}': {e}")))
        .and_then(supported_date)
}

/// Reject dates whose year has no four-digit `yyyy-MM-dd` form
///
/// # Errors
///
/// Returns `ValueOutOfRange` outside years 1..=9999
pub fn supported_date(date: NaiveDate) -> AppResult<NaiveDate> {
    if (MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(AppError::out_of_range(format!(
            "Date {date} is outside years {MIN_SUPPORTED_YEAR}..={MAX_SUPPORTED_YEAR}"
        )))
    }
}

/// Normalize a boundary input to a calendar date
///
/// Accepts either a plain `yyyy-MM-dd` date, kept as is, or an RFC 3339
/// instant, which is converted into `tz` before the time of day is dropped.
///
/// # Errors
///
/// Returns `InvalidFormat` when the text is neither form
pub fn parse_date_input(text: &str, tz: Tz) -> AppResult<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::missing_field("date"));
    }
    if trimmed.len() == 10 {
        return parse_date(trimmed);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|instant| normalize_instant(instant.with_timezone(&Utc), tz))
        .map_err(|e| AppError::invalid_format(format!("Invalid date '{text}': {e}")))
        .and_then(supported_date)
}

/// Calendar date of `instant` as observed in `tz`
#[must_use]
pub fn normalize_instant(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Today's date in `tz`
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    normalize_instant(Utc::now(), tz)
}

/// Parse an IANA timezone name
///
/// # Errors
///
/// Returns `InvalidFormat` for unknown zone names
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| AppError::invalid_format(format!("Unknown timezone '{name}': {e}")))
}

/// First instant of `date` in `tz`
///
/// Midnight does not exist on some DST transition days; the first valid
/// local hour is used instead.
#[must_use]
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<FixedOffset> {
    (0..4)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| tz.from_local_datetime(&date.and_time(time)).earliest())
        .map_or_else(
            || Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).fixed_offset(),
            |start| start.fixed_offset(),
        )
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    begin: NaiveDate,
    finish: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `finish < begin`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the range is inverted
    pub fn new(begin: NaiveDate, finish: NaiveDate) -> AppResult<Self> {
        if finish < begin {
            return Err(AppError::invalid_input(format!(
                "Invalid date range: finish {} is before begin {}",
                format_date(finish),
                format_date(begin)
            )));
        }
        Ok(Self { begin, finish })
    }

    /// Single-day range
    #[must_use]
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            begin: day,
            finish: day,
        }
    }

    /// Create a range and reject it when longer than `max_days`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for inverted ranges and `ValueOutOfRange` for long ones
    pub fn bounded(begin: NaiveDate, finish: NaiveDate, max_days: u32) -> AppResult<Self> {
        let range = Self::new(begin, finish)?;
        if range.len_days() > i64::from(max_days) {
            return Err(AppError::out_of_range(format!(
                "Date range spans {} days; at most {max_days} are allowed",
                range.len_days()
            ))
            .with_details(serde_json::json!({ "max_days": max_days })));
        }
        Ok(range)
    }

    /// First day of the range
    #[must_use]
    pub const fn begin(&self) -> NaiveDate {
        self.begin
    }

    /// Last day of the range
    #[must_use]
    pub const fn finish(&self) -> NaiveDate {
        self.finish
    }

    /// Number of days covered, counting both ends
    #[must_use]
    pub fn len_days(&self) -> i64 {
        (self.finish - self.begin).num_days() + 1
    }

    /// Whether `date` falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin <= date && date <= self.finish
    }

    /// Every day from `begin` through `finish`
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let begin = self.begin;
        (0..self.len_days()).map(move |offset| begin + TimeDelta::days(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> NaiveDate {
        parse_date(text).unwrap()
    }

    #[test]
    fn test_weekday_index_matches_weekday_names() {
        // 2025-09-01 is a Monday
        let monday = date("2025-09-01");
        for offset in 0..70 {
            let day = monday + TimeDelta::days(offset);
            let index = weekday_index(day);
            assert_eq!(index, (offset % 7) as usize);
            assert_eq!(weekday_at(index), day.weekday());
        }
        assert_eq!(weekday_index(date("2025-09-07")), 6, "Sunday is the last slot");
    }

    #[test]
    fn test_parse_date_input_plain_date() {
        let tz = parse_timezone("Pacific/Auckland").unwrap();
        assert_eq!(parse_date_input("2025-01-07", tz).unwrap(), date("2025-01-07"));
    }

    #[test]
    fn test_parse_date_input_instant_uses_timezone() {
        let instant = "2025-01-07T23:30:00Z";
        let utc = parse_timezone("UTC").unwrap();
        let auckland = parse_timezone("Pacific/Auckland").unwrap();
        let los_angeles = parse_timezone("America/Los_Angeles").unwrap();

        assert_eq!(parse_date_input(instant, utc).unwrap(), date("2025-01-07"));
        assert_eq!(parse_date_input(instant, auckland).unwrap(), date("2025-01-08"));
        assert_eq!(parse_date_input(instant, los_angeles).unwrap(), date("2025-01-07"));
    }

    #[test]
    fn test_parse_date_input_rejects_garbage() {
        let utc = parse_timezone("UTC").unwrap();
        assert!(parse_date_input("2025-13-01", utc).is_err());
        assert!(parse_date_input("yesterday", utc).is_err());
        assert!(parse_date_input("   ", utc).is_err());
    }

    #[test]
    fn test_years_outside_four_digits_rejected() {
        let utc = parse_timezone("UTC").unwrap();
        assert_eq!(date("0001-01-01"), NaiveDate::from_ymd_opt(1, 1, 1).unwrap());
        assert_eq!(date("9999-12-31"), NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
        assert_eq!(
            supported_date(NaiveDate::MIN).unwrap_err().code,
            crate::errors::ErrorCode::ValueOutOfRange
        );
        assert!(supported_date(NaiveDate::from_ymd_opt(0, 12, 31).unwrap()).is_err());
        assert!(supported_date(NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap()).is_err());
        assert!(parse_date_input("0000-12-31T12:00:00Z", utc).is_err());
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn test_date_range_days_inclusive() {
        let range = DateRange::new(date("2025-09-01"), date("2025-09-07")).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days.first(), Some(&date("2025-09-01")));
        assert_eq!(days.last(), Some(&date("2025-09-07")));
        assert!(range.contains(date("2025-09-07")));
        assert!(!range.contains(date("2025-09-08")));
    }

    #[test]
    fn test_date_range_rejects_inverted_and_long_ranges() {
        assert!(DateRange::new(date("2025-09-02"), date("2025-09-01")).is_err());
        assert!(DateRange::bounded(date("2025-01-01"), date("2025-01-31"), 30).is_err());
        assert!(DateRange::bounded(date("2025-01-01"), date("2025-01-30"), 30).is_ok());
    }

    #[test]
    fn test_start_of_day_in_zone() {
        let london = parse_timezone("Europe/London").unwrap();
        let summer = start_of_day(date("2025-07-01"), london);
        assert_eq!(summer.to_rfc3339(), "2025-07-01T00:00:00+01:00");
    }
}
