// ABOUTME: Programme, habit template, programme habit and enrolment models
// ABOUTME: Owns the date-interval rules that decide whether a programme is active on a day
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{ClientId, WeeklyFrequency};
use crate::dates::format_date;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reusable habit template
///
/// Its frequencies are only defaults copied into a programme habit when the
/// template is attached; aggregation never reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier
    pub id: Uuid,
    /// Title shown to clients
    pub title: String,
    /// Coaching notes
    pub notes: Option<String>,
    /// Default per-weekday targets
    pub default_frequency: WeeklyFrequency,
    /// Whether the template may still be attached
    pub current: bool,
}

/// A coached plan with a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Programme {
    /// Unique identifier
    pub id: Uuid,
    /// Human-readable identifier such as `PRG-0007`
    pub human_id: String,
    /// Programme name
    pub name: String,
    /// First active day
    pub start_date: NaiveDate,
    /// Last active day, `None` for ongoing programmes
    pub end_date: Option<NaiveDate>,
    /// Enrolment cap
    pub max_clients: Option<u32>,
    /// Price in minor currency units
    pub cost_cents: Option<i64>,
    /// Freeform notes
    pub notes: Option<String>,
    /// Freeform structured data
    pub adhoc_data: Option<serde_json::Value>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Programme {
    /// Whether the programme runs on `date` (both ends inclusive)
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        is_active_on(self.start_date, self.end_date, date)
    }
}

/// Whether the interval `[start, end]` contains `date`; `end = None` is unbounded
#[must_use]
pub fn is_active_on(start: NaiveDate, end: Option<NaiveDate>, date: NaiveDate) -> bool {
    start <= date && end.map_or(true, |end| date <= end)
}

/// Input for creating a programme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgramme {
    /// Human-readable identifier, unique across programmes
    pub human_id: String,
    /// Programme name
    pub name: String,
    /// First active day
    pub start_date: NaiveDate,
    /// Last active day, `None` for ongoing
    pub end_date: Option<NaiveDate>,
    /// Enrolment cap
    pub max_clients: Option<u32>,
    /// Price in minor currency units
    pub cost_cents: Option<i64>,
    /// Freeform notes
    pub notes: Option<String>,
    /// Freeform structured data
    pub adhoc_data: Option<serde_json::Value>,
}

impl NewProgramme {
    /// Check identifiers and the date interval
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank names or `end_date < start_date`
    pub fn validate(&self) -> AppResult<()> {
        if self.human_id.trim().is_empty() {
            return Err(AppError::missing_field("human_id"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::invalid_input(format!(
                    "Programme end date {} is before start date {}",
                    format_date(end),
                    format_date(self.start_date)
                )));
            }
        }
        if self.cost_cents.is_some_and(|cost| cost < 0) {
            return Err(AppError::out_of_range("Programme cost must be non-negative"));
        }
        Ok(())
    }
}

/// One habit's assignment within a programme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeHabit {
    /// Unique identifier
    pub id: Uuid,
    /// Owning programme
    pub programme_id: Uuid,
    /// Template this assignment was created from
    pub habit_id: Uuid,
    /// Programme-specific per-weekday targets
    pub frequency: WeeklyFrequency,
    /// Assignment notes
    pub notes: Option<String>,
    /// Whether the assignment is active
    pub current: bool,
}

/// Link between a client and a programme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeEnrolment {
    /// Unique identifier
    pub id: Uuid,
    /// Enrolled client
    pub client_id: ClientId,
    /// Programme enrolled in
    pub programme_id: Uuid,
    /// Enrolment-specific notes
    pub notes: Option<String>,
    /// Enrolment-specific structured data
    pub adhoc_data: Option<serde_json::Value>,
    /// Enrolment timestamp
    pub enrolled_at: DateTime<Utc>,
}

/// Catalog view of a programme habit, joined with its template title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammeHabitView {
    /// Programme habit identifier
    pub id: Uuid,
    /// Owning programme
    pub programme_id: Uuid,
    /// Template identifier
    pub habit_id: Uuid,
    /// Template title
    pub title: String,
    /// Programme-specific per-weekday targets
    pub frequency: WeeklyFrequency,
    /// Assignment notes
    pub notes: Option<String>,
}

impl ProgrammeHabitView {
    /// Required repetitions on `date`
    #[must_use]
    pub fn required_on(&self, date: NaiveDate) -> u32 {
        self.frequency.for_date(date)
    }
}

/// Catalog view of a programme with its active habits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammeView {
    /// Programme identifier
    pub id: Uuid,
    /// Human-readable identifier
    pub human_id: String,
    /// Programme name
    pub name: String,
    /// First active day
    pub start_date: NaiveDate,
    /// Last active day, `None` for ongoing
    pub end_date: Option<NaiveDate>,
    /// Active habit assignments
    pub habits: Vec<ProgrammeHabitView>,
}

impl ProgrammeView {
    /// Whether the programme runs on `date`
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        is_active_on(self.start_date, self.end_date, date)
    }
}
