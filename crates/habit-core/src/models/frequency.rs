// ABOUTME: Weekday-indexed target frequencies for habit templates and programme habits
// ABOUTME: One seven-slot array replaces per-weekday fields and per-field switch statements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::{DAYS_PER_WEEK, MAX_DAILY_FREQUENCY};
use crate::dates::{weekday_at, weekday_index};
use crate::errors::{AppError, AppResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Target number of repetitions per weekday, Monday first
///
/// A zero slot means the habit is not scheduled on that weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyFrequency([u32; DAYS_PER_WEEK]);

impl WeeklyFrequency {
    /// Build from slots ordered Monday..Sunday
    #[must_use]
    pub const fn new(slots: [u32; DAYS_PER_WEEK]) -> Self {
        Self(slots)
    }

    /// Same target every day of the week
    #[must_use]
    pub const fn daily(times: u32) -> Self {
        Self([times; DAYS_PER_WEEK])
    }

    /// Build from storage columns, rejecting negative values
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` when a stored column is negative or too large
    pub fn from_columns(columns: [i64; DAYS_PER_WEEK]) -> AppResult<Self> {
        let mut slots = [0_u32; DAYS_PER_WEEK];
        for (index, value) in columns.into_iter().enumerate() {
            slots[index] = u32::try_from(value).map_err(|_| {
                AppError::out_of_range(format!(
                    "Frequency for {} must be non-negative, got {value}",
                    weekday_at(index)
                ))
            })?;
        }
        let frequency = Self(slots);
        frequency.validate()?;
        Ok(frequency)
    }

    /// Reject slots above the supported maximum
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` naming the first offending weekday
    pub fn validate(&self) -> AppResult<()> {
        if let Some(index) = self.0.iter().position(|times| *times > MAX_DAILY_FREQUENCY) {
            return Err(AppError::out_of_range(format!(
                "Frequency for {} exceeds {MAX_DAILY_FREQUENCY}",
                weekday_at(index)
            )));
        }
        Ok(())
    }

    /// Slots as storage column values, Monday first
    #[must_use]
    pub fn to_columns(self) -> [i64; DAYS_PER_WEEK] {
        self.0.map(i64::from)
    }

    /// Required repetitions on `date`'s weekday
    #[must_use]
    pub fn for_date(&self, date: NaiveDate) -> u32 {
        self.0[weekday_index(date)]
    }

    /// Slots ordered Monday..Sunday
    #[must_use]
    pub const fn slots(&self) -> &[u32; DAYS_PER_WEEK] {
        &self.0
    }
}
