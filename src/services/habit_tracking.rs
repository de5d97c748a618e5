// ABOUTME: Client-facing habit tracking: catalog and ledger reads, day summaries, ledger writes
// ABOUTME: Store calls run under a deadline and ledger writes retry on concurrency conflicts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::aggregation::{compute_day_summaries, DaySummary};
use crate::auth::Session;
use crate::calendar::{is_editable, month_grid_range, month_view, week_views, MonthView, WeekView};
use crate::config::HabitSettings;
use crate::database::{AssignedHabit, HabitStore};
use crate::errors::{AppError, AppResult, DatabaseError};
use chrono::NaiveDate;
use chrono_tz::Tz;
use habit_core::dates::{format_date, parse_timezone, today_in, DateRange};
use habit_core::models::{
    ClientId, CompletionKey, CompletionRecord, CompletionStep, ProgrammeView, UpsertCompletion,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Habit tracking operations for one deployment
#[derive(Clone)]
pub struct HabitTrackingService {
    store: Arc<dyn HabitStore>,
    settings: HabitSettings,
}

impl HabitTrackingService {
    /// Create a service over any store implementation
    #[must_use]
    pub fn new(store: Arc<dyn HabitStore>, settings: HabitSettings) -> Self {
        Self { store, settings }
    }

    /// Active settings
    #[must_use]
    pub const fn settings(&self) -> &HabitSettings {
        &self.settings
    }

    /// Timezone named by the request, or the configured default
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for unknown zone names
    pub fn resolve_timezone(&self, name: Option<&str>) -> AppResult<Tz> {
        match name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => parse_timezone(name),
            None => Ok(self.settings.default_timezone),
        }
    }

    /// Range bounded by the configured maximum length
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for inverted ranges and `ValueOutOfRange` for long ones
    pub fn range(&self, begin: NaiveDate, finish: NaiveDate) -> AppResult<DateRange> {
        DateRange::bounded(begin, finish, self.settings.max_range_days)
    }

    /// Programmes the client is enrolled in overlapping `[begin, finish]`
    ///
    /// Without `finish`, only programmes active on `begin` are returned.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown clients and `ResourceUnavailable`
    /// when the store does not answer in time
    pub async fn programme_habits_for_client(
        &self,
        session: &Session,
        client_id: &ClientId,
        begin: NaiveDate,
        finish: Option<NaiveDate>,
    ) -> AppResult<Vec<ProgrammeView>> {
        session.authorize_for(client_id)?;
        if let Some(finish) = finish {
            self.range(begin, finish)?;
        }
        self.with_deadline(
            "programme catalog",
            self.store.programmes_for_client(client_id, begin, finish),
        )
        .await
    }

    /// Ledger rows for the client in the range, ascending by day
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown clients and `ResourceUnavailable`
    /// when the store does not answer in time
    pub async fn completions_for_client(
        &self,
        session: &Session,
        client_id: &ClientId,
        range: &DateRange,
    ) -> AppResult<Vec<CompletionRecord>> {
        session.authorize_for(client_id)?;
        self.check_range(range)?;
        self.with_deadline(
            "completion ledger",
            self.store.completions_in_range(client_id, range),
        )
        .await
    }

    /// Day summaries for the range
    ///
    /// The catalog and ledger are read concurrently; if either fails or times
    /// out the whole call fails and no summaries are produced.
    ///
    /// # Errors
    ///
    /// Returns the first read failure
    pub async fn day_summaries(
        &self,
        session: &Session,
        client_id: &ClientId,
        range: &DateRange,
        tz: Tz,
    ) -> AppResult<Vec<DaySummary>> {
        session.authorize_for(client_id)?;
        self.check_range(range)?;

        let (programmes, completions) = tokio::try_join!(
            self.with_deadline(
                "programme catalog",
                self.store
                    .programmes_for_client(client_id, range.begin(), Some(range.finish())),
            ),
            self.with_deadline(
                "completion ledger",
                self.store.completions_in_range(client_id, range),
            ),
        )?;

        let summaries = compute_day_summaries(range, &programmes, &completions, tz);
        debug!(
            client.id = %client_id,
            days = summaries.len(),
            programmes = programmes.len(),
            completions = completions.len(),
            "Computed day summaries"
        );
        Ok(summaries)
    }

    /// Day summaries sliced into Monday-first weeks
    ///
    /// # Errors
    ///
    /// Same as [`Self::day_summaries`]
    pub async fn week_views(
        &self,
        session: &Session,
        client_id: &ClientId,
        range: &DateRange,
        tz: Tz,
    ) -> AppResult<Vec<WeekView>> {
        let summaries = self.day_summaries(session, client_id, range, tz).await?;
        week_views(&summaries)
    }

    /// Month grid for `year`/`month` with today and editability marked for `tz`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid month, otherwise as [`Self::day_summaries`]
    pub async fn month_view(
        &self,
        session: &Session,
        client_id: &ClientId,
        year: i32,
        month: u32,
        tz: Tz,
    ) -> AppResult<MonthView> {
        let grid = month_grid_range(year, month)?;
        let summaries = self.day_summaries(session, client_id, &grid, tz).await?;
        month_view(
            year,
            month,
            &summaries,
            today_in(tz),
            self.settings.edit_window_days,
        )
    }

    /// Create or overwrite the client's ledger row for one habit and day
    ///
    /// `required` is the habit's weekday slot for `habit_date`, the same
    /// annotation range reads apply, even on days outside the programme's
    /// dates. `completed` defaults to `times_done >= required` when omitted.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired`/`PermissionDenied` before touching the store,
    /// `ValueOutOfRange` for negative counts and `ResourceNotFound` when the
    /// habit is not part of the client's programmes
    pub async fn upsert_completion(
        &self,
        session: &Session,
        client_id: &ClientId,
        programme_habit_id: Uuid,
        habit_date: NaiveDate,
        times_done: i64,
        completed: Option<bool>,
    ) -> AppResult<CompletionRecord> {
        session.authorize_for(client_id)?;
        if times_done < 0 {
            return Err(AppError::out_of_range(format!(
                "times_done must be a non-negative count, got {times_done}"
            )));
        }

        let assigned = self.assigned_habit(client_id, programme_habit_id).await?;
        let required = assigned.habit.required_on(habit_date);
        let key = CompletionKey {
            programme_habit_id,
            client_id: client_id.clone(),
            habit_date,
        };
        let request = UpsertCompletion::from_request(key, times_done, completed, required)?;

        let entry = self
            .with_retries("upsert completion", || self.store.upsert_completion(&request))
            .await?;

        info!(
            actor = %session.actor(),
            client.id = %client_id,
            habit.id = %programme_habit_id,
            habit.date = %format_date(habit_date),
            times_done = request.times_done,
            "Completion upserted"
        );
        Ok(CompletionRecord::new(entry, required))
    }

    /// Apply an increment, decrement or toggle to one habit on one day
    ///
    /// The day must be scheduled for the habit and inside the edit window
    /// relative to today in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for unscheduled days or retired habits and
    /// `ResourceLocked` for days outside the edit window
    pub async fn apply_step(
        &self,
        session: &Session,
        client_id: &ClientId,
        programme_habit_id: Uuid,
        habit_date: NaiveDate,
        step: CompletionStep,
        tz: Tz,
    ) -> AppResult<CompletionRecord> {
        session.authorize_for(client_id)?;

        let assigned = self.assigned_habit(client_id, programme_habit_id).await?;
        if !assigned.current {
            return Err(AppError::invalid_input(format!(
                "Habit '{}' is no longer part of the programme",
                assigned.habit.title
            )));
        }
        let required = assigned.required_on(habit_date);
        if required == 0 {
            return Err(AppError::invalid_input(format!(
                "Habit '{}' is not scheduled on {}",
                assigned.habit.title,
                format_date(habit_date)
            )));
        }

        let today = today_in(tz);
        if !is_editable(habit_date, today, self.settings.edit_window_days) {
            return Err(AppError::locked(format!(
                "{} can no longer be edited; only today and the previous {} days can",
                format_date(habit_date),
                self.settings.edit_window_days
            ))
            .with_details(serde_json::json!({
                "today": format_date(today),
                "edit_window_days": self.settings.edit_window_days,
            })));
        }

        let key = CompletionKey {
            programme_habit_id,
            client_id: client_id.clone(),
            habit_date,
        };
        let entry = self
            .with_retries("completion step", || {
                self.store.apply_completion_step(&key, step, required)
            })
            .await?;

        info!(
            actor = %session.actor(),
            client.id = %client_id,
            habit.id = %programme_habit_id,
            habit.date = %format_date(habit_date),
            step = step.as_str(),
            times_done = ?entry.times_done,
            "Completion step applied"
        );
        Ok(CompletionRecord::new(entry, required))
    }

    /// Whether the store answers within the deadline
    ///
    /// # Errors
    ///
    /// Returns `ResourceUnavailable` when it does not
    pub async fn ready(&self) -> AppResult<()> {
        self.with_deadline("readiness probe", self.store.ping()).await
    }

    async fn assigned_habit(
        &self,
        client_id: &ClientId,
        programme_habit_id: Uuid,
    ) -> AppResult<AssignedHabit> {
        self.with_deadline(
            "programme habit lookup",
            self.store.assigned_habit(client_id, programme_habit_id),
        )
        .await?
        .ok_or_else(|| {
            AppError::not_found("Programme habit").with_resource_id(programme_habit_id.to_string())
        })
    }

    fn check_range(&self, range: &DateRange) -> AppResult<()> {
        self.range(range.begin(), range.finish()).map(|_| ())
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, future: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match timeout(self.settings.store_timeout, future).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(deadline_exceeded(operation, self.settings.store_timeout)),
        }
    }

    async fn with_retries<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DatabaseError>>,
    {
        let attempts = self.settings.upsert_retries.max(1);
        let mut tried = 1;
        loop {
            match timeout(self.settings.store_timeout, attempt()).await {
                Err(_) => return Err(deadline_exceeded(operation, self.settings.store_timeout)),
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_retryable() && tried < attempts => {
                    warn!(operation, attempt = tried, error = %err, "Retrying ledger write");
                    tried += 1;
                }
                Ok(Err(err)) => return Err(err.into()),
            }
        }
    }
}

fn deadline_exceeded(operation: &str, limit: Duration) -> AppError {
    let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
    warn!(operation, timeout_ms, "Store call timed out");
    AppError::unavailable(format!(
        "Unable to load habits: {operation} did not respond within {timeout_ms}ms"
    ))
}
