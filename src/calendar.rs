// ABOUTME: Week and month calendar views composed from day summaries
// ABOUTME: Also owns the edit-window rule deciding which days a client may still change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::aggregation::DaySummary;
use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Months, NaiveDate, TimeDelta};
use habit_core::constants::{DAYS_PER_WEEK, MAX_SUPPORTED_YEAR, MIN_SUPPORTED_YEAR};
use habit_core::dates::{weekday_index, DateRange};
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a client may still change completions for `day`
///
/// Today and the `window_days` days before it are editable; future days never are.
#[must_use]
pub fn is_editable(day: NaiveDate, today: NaiveDate, window_days: u32) -> bool {
    day <= today && (today - day).num_days() <= i64::from(window_days)
}

/// Monday of the ISO week containing `date`
///
/// # Errors
///
/// Returns `InvalidInput` when that Monday precedes the earliest representable date
pub fn week_start(date: NaiveDate) -> AppResult<NaiveDate> {
    date.checked_sub_signed(TimeDelta::days(i64::from(date.weekday().num_days_from_monday())))
        .ok_or_else(|| AppError::invalid_input(format!("No Monday on or before {date}")))
}

/// One Monday-first week of summaries
#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    /// Monday of the week
    pub week_start: NaiveDate,
    /// Seven slots, Monday first; `None` where the requested range does not reach
    pub days: Vec<Option<DaySummary>>,
}

/// Slice summaries into ISO weeks, earliest first
///
/// # Errors
///
/// Returns `InvalidInput` when a summary's week has no representable Monday
pub fn week_views(summaries: &[DaySummary]) -> AppResult<Vec<WeekView>> {
    let mut weeks: BTreeMap<NaiveDate, Vec<Option<DaySummary>>> = BTreeMap::new();
    for summary in summaries {
        let slots = weeks
            .entry(week_start(summary.date)?)
            .or_insert_with(|| vec![None; DAYS_PER_WEEK]);
        slots[weekday_index(summary.date)] = Some(summary.clone());
    }
    Ok(weeks
        .into_iter()
        .map(|(week_start, days)| WeekView { week_start, days })
        .collect())
}

/// Days shown by a month grid: Monday on or before the 1st to Sunday on or after the last day
///
/// # Errors
///
/// Returns `InvalidInput` when `year`/`month` is not a calendar month of years 1..=9999
pub fn month_grid_range(year: i32, month: u32) -> AppResult<DateRange> {
    if !(MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&year) {
        return Err(AppError::invalid_input(format!(
            "Year {year} is outside {MIN_SUPPORTED_YEAR}..={MAX_SUPPORTED_YEAR}"
        )));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::invalid_input(format!("Invalid month {year}-{month:02}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AppError::invalid_input(format!("Month {year}-{month:02} is out of range")))?;
    let begin = week_start(first)?;
    let finish = week_start(last)?
        .checked_add_signed(TimeDelta::days(6))
        .ok_or_else(|| AppError::invalid_input(format!("Month {year}-{month:02} is out of range")))?;
    DateRange::new(begin, finish)
}

/// One cell of a month grid
#[derive(Debug, Clone, Serialize)]
pub struct MonthCell {
    /// Calendar day
    pub date: NaiveDate,
    /// Whether the day belongs to the displayed month rather than a neighbour
    pub is_current_month: bool,
    /// Whether the day is today in the viewer's timezone
    pub is_today: bool,
    /// Whether completions for the day may still be changed
    pub is_editable: bool,
    /// Aggregated state, absent when no summary covered the day
    pub summary: Option<DaySummary>,
}

/// A month laid out as Monday-first weeks
#[derive(Debug, Clone, Serialize)]
pub struct MonthView {
    /// Displayed year
    pub year: i32,
    /// Displayed month, 1-based
    pub month: u32,
    /// Rows of seven cells
    pub weeks: Vec<Vec<MonthCell>>,
}

/// Lay out summaries as a month grid with per-cell display flags
///
/// # Errors
///
/// Returns `InvalidInput` when `year`/`month` is not a calendar month
pub fn month_view(
    year: i32,
    month: u32,
    summaries: &[DaySummary],
    today: NaiveDate,
    window_days: u32,
) -> AppResult<MonthView> {
    let grid = month_grid_range(year, month)?;
    let by_date: BTreeMap<NaiveDate, &DaySummary> =
        summaries.iter().map(|summary| (summary.date, summary)).collect();

    let cells: Vec<MonthCell> = grid
        .days()
        .map(|date| MonthCell {
            date,
            is_current_month: date.year() == year && date.month() == month,
            is_today: date == today,
            is_editable: is_editable(date, today, window_days),
            summary: by_date.get(&date).map(|summary| (*summary).clone()),
        })
        .collect();

    Ok(MonthView {
        year,
        month,
        weeks: cells
            .chunks(DAYS_PER_WEEK)
            .map(<[MonthCell]>::to_vec)
            .collect(),
    })
}
