// ABOUTME: Criterion benchmarks for the day aggregator and the calendar composers
// ABOUTME: Measures summary throughput over a year of days with overlapping programmes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for habit aggregation.
//!
//! Builds a synthetic catalog (several overlapping programmes with a handful
//! of habits each) and a dense completion ledger, then measures the pure
//! aggregation and calendar layout functions.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

use chrono::{NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use habit_coach_server::aggregation::compute_day_summaries;
use habit_coach_server::calendar::{month_view, week_views};
use habit_core::dates::DateRange;
use habit_core::models::{
    ClientHabit, ClientId, CompletionRecord, ProgrammeHabitView, ProgrammeView, WeeklyFrequency,
};
use uuid::Uuid;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

/// Programmes starting a month apart, each running for a quarter
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn generate_catalog(programmes: usize, habits_per_programme: usize) -> Vec<ProgrammeView> {
    (0..programmes)
        .map(|p| {
            let id = Uuid::new_v4();
            let start = base_date() + TimeDelta::days(p as i64 * 30);
            let habits = (0..habits_per_programme)
                .map(|h| {
                    let mut slots = [0_u32; 7];
                    for (day, slot) in slots.iter_mut().enumerate() {
                        *slot = ((day + h + p) % 3) as u32;
                    }
                    ProgrammeHabitView {
                        id: Uuid::new_v4(),
                        programme_id: id,
                        habit_id: Uuid::new_v4(),
                        title: format!("Habit {p}-{h}"),
                        frequency: WeeklyFrequency::new(slots),
                        notes: None,
                    }
                })
                .collect();
            ProgrammeView {
                id,
                human_id: format!("PRG-{p:03}"),
                name: format!("Programme {p}"),
                start_date: start,
                end_date: (p % 2 == 0).then(|| start + TimeDelta::days(90)),
                habits,
            }
        })
        .collect()
}

/// One ledger row per scheduled habit-day, with a mix of full and partial counts
#[allow(clippy::cast_possible_truncation)]
fn generate_ledger(catalog: &[ProgrammeView], range: &DateRange) -> Vec<CompletionRecord> {
    let client = ClientId::parse("bench-client").unwrap();
    let now = Utc::now();
    let mut records = Vec::new();
    for (index, day) in range.days().enumerate() {
        for programme in catalog.iter().filter(|p| p.is_active_on(day)) {
            for habit in &programme.habits {
                let required = habit.required_on(day);
                if required == 0 {
                    continue;
                }
                let times_done = if index % 4 == 0 { required - 1 } else { required };
                let entry = ClientHabit {
                    id: Uuid::new_v4(),
                    programme_habit_id: habit.id,
                    client_id: client.clone(),
                    habit_date: day,
                    times_done: Some(times_done),
                    completed: times_done >= required,
                    created_at: now,
                    updated_at: now,
                };
                records.push(CompletionRecord::new(entry, required));
            }
        }
    }
    records
}

fn bench_day_summaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_summaries");

    for days in [7_i64, 31, 370] {
        let range = DateRange::new(base_date(), base_date() + TimeDelta::days(days - 1)).unwrap();
        let catalog = generate_catalog(12, 5);
        let ledger = generate_ledger(&catalog, &range);

        group.throughput(Throughput::Elements(days.unsigned_abs()));
        group.bench_with_input(BenchmarkId::new("days", days), &range, |b, range| {
            b.iter(|| {
                compute_day_summaries(
                    black_box(range),
                    black_box(&catalog),
                    black_box(&ledger),
                    Tz::Europe__London,
                )
            });
        });
    }

    group.finish();
}

fn bench_calendar_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("calendar_views");

    let range = DateRange::new(base_date(), base_date() + TimeDelta::days(369)).unwrap();
    let catalog = generate_catalog(12, 5);
    let ledger = generate_ledger(&catalog, &range);
    let summaries = compute_day_summaries(&range, &catalog, &ledger, Tz::UTC);
    let today = base_date() + TimeDelta::days(40);

    group.bench_function("week_views_year", |b| {
        b.iter(|| week_views(black_box(&summaries)).unwrap());
    });

    group.bench_function("month_view", |b| {
        b.iter(|| month_view(2025, 2, black_box(&summaries), today, 3).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_day_summaries, bench_calendar_views);
criterion_main!(benches);
