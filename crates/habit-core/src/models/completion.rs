// ABOUTME: Completion ledger rows, upsert requests and interactive completion steps
// ABOUTME: times_done is authoritative; the completed flag is recomputed on every read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ClientId;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day's completion record for one client against one programme habit
///
/// `(programme_habit_id, client_id, habit_date)` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientHabit {
    /// Row identifier
    pub id: Uuid,
    /// Programme habit this completion counts against
    pub programme_habit_id: Uuid,
    /// Client who performed the habit
    pub client_id: ClientId,
    /// Calendar day, date-only
    pub habit_date: NaiveDate,
    /// Repetitions performed; `None` only on rows written before counts were tracked
    pub times_done: Option<u32>,
    /// Stored completion flag, a cache of `times_done >= required`
    pub completed: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last write timestamp
    pub updated_at: DateTime<Utc>,
}

impl ClientHabit {
    /// Repetitions to use for threshold checks
    ///
    /// Rows without a count fall back to the stored flag: completed counts as
    /// exactly `required`, not completed as zero.
    #[must_use]
    pub fn effective_times_done(&self, required: u32) -> u32 {
        self.times_done
            .unwrap_or(if self.completed { required } else { 0 })
    }

    /// Whether the habit counts as done for a day requiring `required` repetitions
    #[must_use]
    pub fn is_done(&self, required: u32) -> bool {
        is_done(self.effective_times_done(required), required)
    }
}

/// Completion threshold: done iff `times_done >= required`
#[must_use]
pub const fn is_done(times_done: u32, required: u32) -> bool {
    times_done >= required
}

/// A ledger row annotated with the day's requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// The stored row
    #[serde(flatten)]
    pub entry: ClientHabit,
    /// Required repetitions on the row's weekday
    pub required_frequency: u32,
    /// Recomputed completion state
    pub done: bool,
}

impl CompletionRecord {
    /// Annotate a row with its weekday requirement and recompute `done`
    #[must_use]
    pub fn new(entry: ClientHabit, required_frequency: u32) -> Self {
        let done = entry.is_done(required_frequency);
        Self {
            entry,
            required_frequency,
            done,
        }
    }
}

/// Natural key of a ledger row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletionKey {
    /// Programme habit
    pub programme_habit_id: Uuid,
    /// Client
    pub client_id: ClientId,
    /// Calendar day
    pub habit_date: NaiveDate,
}

/// Create-or-update request for a ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCompletion {
    /// Row key
    pub key: CompletionKey,
    /// Repetitions performed; stored as given, without an upper bound
    pub times_done: u32,
    /// Flag to persist alongside the count
    pub completed: bool,
}

impl UpsertCompletion {
    /// Build from caller input, deriving `completed` when the caller omits it
    ///
    /// # Errors
    ///
    /// Returns `ValueOutOfRange` for negative counts
    pub fn from_request(
        key: CompletionKey,
        times_done: i64,
        completed: Option<bool>,
        required: u32,
    ) -> AppResult<Self> {
        let times_done = u32::try_from(times_done).map_err(|_| {
            AppError::out_of_range(format!("times_done must be a non-negative count, got {times_done}"))
        })?;
        Ok(Self {
            key,
            times_done,
            completed: completed.unwrap_or_else(|| is_done(times_done, required)),
        })
    }
}

/// Interactive adjustment applied atomically by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStep {
    /// One more repetition, not above the requirement
    Increment,
    /// One fewer repetition, not below zero
    Decrement,
    /// Done becomes zero, anything else becomes the requirement
    Toggle,
}

impl CompletionStep {
    /// Count after applying the step to `current`
    ///
    /// An existing over-completion is left untouched by `Increment`.
    #[must_use]
    pub const fn apply(self, current: u32, required: u32) -> u32 {
        match self {
            Self::Increment => {
                if current >= required {
                    current
                } else {
                    current + 1
                }
            }
            Self::Decrement => current.saturating_sub(1),
            Self::Toggle => {
                if current >= required {
                    0
                } else {
                    required
                }
            }
        }
    }

    /// Stable name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Toggle => "toggle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(times_done: Option<u32>, completed: bool) -> ClientHabit {
        ClientHabit {
            id: Uuid::new_v4(),
            programme_habit_id: Uuid::new_v4(),
            client_id: ClientId::parse("c-1").unwrap(),
            habit_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            times_done,
            completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_times_done_is_authoritative_over_flag() {
        assert!(!row(Some(0), true).is_done(1));
        assert!(!row(Some(1), true).is_done(2));
        assert!(row(Some(2), false).is_done(2));
        assert!(row(Some(5), false).is_done(2));
    }

    #[test]
    fn test_legacy_rows_use_flag() {
        assert!(row(None, true).is_done(3));
        assert_eq!(row(None, true).effective_times_done(3), 3);
        assert!(!row(None, false).is_done(3));
        assert_eq!(row(None, false).effective_times_done(3), 0);
    }

    #[test]
    fn test_record_recomputes_done() {
        let record = CompletionRecord::new(row(Some(0), true), 1);
        assert!(!record.done);
        assert_eq!(record.required_frequency, 1);
    }

    #[test]
    fn test_upsert_request_derives_flag() {
        let key = CompletionKey {
            programme_habit_id: Uuid::new_v4(),
            client_id: ClientId::parse("c-1").unwrap(),
            habit_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        };
        let derived = UpsertCompletion::from_request(key.clone(), 2, None, 2).unwrap();
        assert!(derived.completed);
        let explicit = UpsertCompletion::from_request(key.clone(), 0, Some(true), 2).unwrap();
        assert!(explicit.completed);
        assert!(UpsertCompletion::from_request(key, -1, None, 2).is_err());
    }

    #[test]
    fn test_completion_steps() {
        assert_eq!(CompletionStep::Increment.apply(0, 2), 1);
        assert_eq!(CompletionStep::Increment.apply(2, 2), 2);
        assert_eq!(CompletionStep::Increment.apply(4, 2), 4);
        assert_eq!(CompletionStep::Decrement.apply(0, 2), 0);
        assert_eq!(CompletionStep::Decrement.apply(4, 2), 3);
        assert_eq!(CompletionStep::Toggle.apply(0, 3), 3);
        assert_eq!(CompletionStep::Toggle.apply(1, 3), 3);
        assert_eq!(CompletionStep::Toggle.apply(3, 3), 0);
    }
}
