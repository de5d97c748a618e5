// ABOUTME: Day aggregator merging the programme catalog and completion ledger into day summaries
// ABOUTME: Pure and deterministic; all I/O happens before it is called
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Day Aggregation
//!
//! For every day of an inclusive range, decide which habit assignments were
//! due, which were done, and derive the completion rate and display tier.
//!
//! Assignments are counted, not templates: two programmes attaching the same
//! template on the same day contribute two required habits.

mod tiers;

pub use tiers::CompletionTier;

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use chrono_tz::Tz;
use habit_core::dates::{start_of_day, weekday_at, weekday_index, DateRange};
use habit_core::models::{is_done, CompletionRecord, ProgrammeHabitView, ProgrammeView};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// One scheduled habit assignment on one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitDayStatus {
    /// Programme habit identifier
    pub programme_habit_id: Uuid,
    /// Owning programme
    pub programme_id: Uuid,
    /// Template title
    pub title: String,
    /// Required repetitions on this weekday
    pub required: u32,
    /// Repetitions recorded, zero when no ledger row exists
    pub times_done: u32,
    /// `times_done >= required`
    pub done: bool,
}

/// Aggregated completion state of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    /// Calendar day
    pub date: NaiveDate,
    /// Weekday of `date`
    pub weekday: Weekday,
    /// First instant of the day in the request's timezone
    pub starts_at: DateTime<FixedOffset>,
    /// Whether any enrolled programme runs on this day
    pub is_programme_day: bool,
    /// Scheduled habit assignments
    pub required_count: u32,
    /// Scheduled habit assignments that are done
    pub completed_count: u32,
    /// `completed_count / required_count`, or 0 when nothing is scheduled
    pub completion_rate: f64,
    /// Display band of `completion_rate`
    pub tier: CompletionTier,
    /// Display color of `tier`
    pub color: &'static str,
    /// Every scheduled assignment in catalog order
    pub habits: Vec<HabitDayStatus>,
}

/// Ratio with the zero-denominator convention
#[must_use]
pub fn completion_rate(completed: u32, required: u32) -> f64 {
    if required == 0 {
        0.0
    } else {
        f64::from(completed) / f64::from(required)
    }
}

/// Build one summary per day of `range`
///
/// `programmes` need not be sorted and may include programmes outside the
/// range; `completions` may include rows for habits that are no longer in the
/// catalog, which are ignored. Identical inputs produce identical output.
#[must_use]
pub fn compute_day_summaries(
    range: &DateRange,
    programmes: &[ProgrammeView],
    completions: &[CompletionRecord],
    tz: Tz,
) -> Vec<DaySummary> {
    let catalog = ordered_catalog(programmes);

    let mut ledger: HashMap<(NaiveDate, Uuid), &CompletionRecord> =
        HashMap::with_capacity(completions.len());
    for record in completions {
        ledger.insert(
            (record.entry.habit_date, record.entry.programme_habit_id),
            record,
        );
    }

    range
        .days()
        .map(|date| summarize_day(date, &catalog, &ledger, tz))
        .collect()
}

/// Programmes by start date then id, habits by title then id
fn ordered_catalog(programmes: &[ProgrammeView]) -> Vec<(&ProgrammeView, Vec<&ProgrammeHabitView>)> {
    let mut catalog: Vec<_> = programmes
        .iter()
        .map(|programme| {
            let mut habits: Vec<_> = programme.habits.iter().collect();
            habits.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
            (programme, habits)
        })
        .collect();
    catalog.sort_by(|(a, _), (b, _)| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
    catalog
}

fn summarize_day(
    date: NaiveDate,
    catalog: &[(&ProgrammeView, Vec<&ProgrammeHabitView>)],
    ledger: &HashMap<(NaiveDate, Uuid), &CompletionRecord>,
    tz: Tz,
) -> DaySummary {
    let weekday = weekday_index(date);
    let mut is_programme_day = false;
    let mut habits = Vec::new();

    for (programme, programme_habits) in catalog {
        if !programme.is_active_on(date) {
            continue;
        }
        is_programme_day = true;

        for habit in programme_habits {
            let required = habit.frequency.slots()[weekday];
            if required == 0 {
                continue;
            }
            let times_done = ledger
                .get(&(date, habit.id))
                .map_or(0, |record| record.entry.effective_times_done(required));
            habits.push(HabitDayStatus {
                programme_habit_id: habit.id,
                programme_id: programme.id,
                title: habit.title.clone(),
                required,
                times_done,
                done: is_done(times_done, required),
            });
        }
    }

    let required_count = u32::try_from(habits.len()).unwrap_or(u32::MAX);
    let completed_count =
        u32::try_from(habits.iter().filter(|habit| habit.done).count()).unwrap_or(u32::MAX);
    let completion_rate = completion_rate(completed_count, required_count);
    let tier = CompletionTier::for_rate(completion_rate);

    DaySummary {
        date,
        weekday: weekday_at(weekday),
        starts_at: start_of_day(date, tz),
        is_programme_day,
        required_count,
        completed_count,
        completion_rate,
        tier,
        color: tier.color(),
        habits,
    }
}
