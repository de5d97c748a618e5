// ABOUTME: Completion ledger table with atomic upserts keyed on (habit, client, day)
// ABOUTME: Writes use INSERT .. ON CONFLICT .. RETURNING so concurrent taps never lose updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{frequency_from_row, parse_stored_date, parse_timestamp, parse_uuid, to_count, Database, FREQUENCY_COLUMNS};
use crate::errors::DatabaseError;
use chrono::Utc;
use habit_core::dates::{format_date, DateRange};
use habit_core::models::{
    is_done, ClientHabit, ClientId, CompletionKey, CompletionRecord, CompletionStep,
    UpsertCompletion,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;
use uuid::Uuid;

const LEDGER_COLUMNS: &str =
    "id, programme_habit_id, client_id, habit_date, times_done, completed, created_at, updated_at";

impl Database {
    pub(super) async fn migrate_completions(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS client_habits (
                id TEXT PRIMARY KEY,
                programme_habit_id TEXT NOT NULL REFERENCES programme_habits(id) ON DELETE CASCADE,
                client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                habit_date TEXT NOT NULL,
                times_done INTEGER CHECK (times_done IS NULL OR times_done >= 0),
                completed BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(programme_habit_id, client_id, habit_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_client_habits_client_date ON client_habits(client_id, habit_date)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create or overwrite the ledger row for the request's key
    ///
    /// Last write wins; the stored count is not capped.
    ///
    /// # Errors
    ///
    /// Returns `ForeignKeyViolation` when the programme habit or client is missing
    pub async fn upsert_completion(
        &self,
        request: &UpsertCompletion,
    ) -> Result<ClientHabit, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let key = &request.key;
        let row = sqlx::query(&format!(
            r"
            INSERT INTO client_habits ({LEDGER_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(programme_habit_id, client_id, habit_date) DO UPDATE SET
                times_done = excluded.times_done,
                completed = excluded.completed,
                updated_at = excluded.updated_at
            RETURNING {LEDGER_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(key.programme_habit_id.to_string())
        .bind(key.client_id.as_str())
        .bind(format_date(key.habit_date))
        .bind(i64::from(request.times_done))
        .bind(request.completed)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        row_to_client_habit(&row)
    }

    /// Apply an increment, decrement or toggle to the ledger row in one statement
    ///
    /// Rows without a count are read as `required` when flagged completed and
    /// zero otherwise before the step is applied.
    ///
    /// # Errors
    ///
    /// Returns `ForeignKeyViolation` when the programme habit or client is missing
    pub async fn apply_completion_step(
        &self,
        key: &CompletionKey,
        step: CompletionStep,
        required: u32,
    ) -> Result<ClientHabit, DatabaseError> {
        let required_value = i64::from(required);
        let initial = step.apply(0, required);
        let now = Utc::now().to_rfc3339();

        let mut builder: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("INSERT INTO client_habits ({LEDGER_COLUMNS}) VALUES ("));
        let mut values = builder.separated(", ");
        values
            .push_bind(Uuid::new_v4().to_string())
            .push_bind(key.programme_habit_id.to_string())
            .push_bind(key.client_id.as_str().to_owned())
            .push_bind(format_date(key.habit_date))
            .push_bind(i64::from(initial))
            .push_bind(is_done(initial, required))
            .push_bind(now.clone())
            .push_bind(now.clone());
        builder.push(
            ") ON CONFLICT(programme_habit_id, client_id, habit_date) DO UPDATE SET times_done = ",
        );
        push_next_count(&mut builder, step, required_value);
        builder.push(", completed = (");
        push_next_count(&mut builder, step, required_value);
        builder
            .push(") >= ")
            .push_bind(required_value)
            .push(", updated_at = ")
            .push_bind(now)
            .push(format!(" RETURNING {LEDGER_COLUMNS}"));

        let row = builder.build().fetch_one(&self.pool).await?;

        let entry = row_to_client_habit(&row)?;
        debug!(
            client.id = %key.client_id,
            habit.id = %key.programme_habit_id,
            habit.date = %key.habit_date,
            step = step.as_str(),
            times_done = ?entry.times_done,
            "Applied completion step"
        );
        Ok(entry)
    }

    /// Ledger rows for the client within the range, oldest day first
    ///
    /// Each row carries the requirement of its programme habit for that weekday.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the client does not exist
    pub async fn completions_in_range(
        &self,
        client_id: &ClientId,
        range: &DateRange,
    ) -> Result<Vec<CompletionRecord>, DatabaseError> {
        self.ensure_client(client_id).await?;

        let frequencies = FREQUENCY_COLUMNS
            .iter()
            .map(|column| format!("ph.{column} AS ph_{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            r"
            SELECT ch.id, ch.programme_habit_id, ch.client_id, ch.habit_date, ch.times_done,
                   ch.completed, ch.created_at, ch.updated_at, {frequencies}
            FROM client_habits ch
            JOIN programme_habits ph ON ph.id = ch.programme_habit_id
            WHERE ch.client_id = ? AND ch.habit_date >= ? AND ch.habit_date <= ?
            ORDER BY ch.habit_date ASC, ch.programme_habit_id ASC
            "
        );

        let rows = sqlx::query(&query)
            .bind(client_id.as_str())
            .bind(format_date(range.begin()))
            .bind(format_date(range.finish()))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let entry = row_to_client_habit(row)?;
                let required = frequency_from_row(row, "ph_")?.for_date(entry.habit_date);
                Ok(CompletionRecord::new(entry, required))
            })
            .collect()
    }
}

/// Stored count, with legacy rows read through their completed flag
fn push_current_count(builder: &mut QueryBuilder<'_, Sqlite>, required: i64) {
    builder
        .push("COALESCE(client_habits.times_done, CASE WHEN client_habits.completed THEN ")
        .push_bind(required)
        .push(" ELSE 0 END)");
}

/// SQL expression for the count after `step`, mirroring `CompletionStep::apply`
fn push_next_count(builder: &mut QueryBuilder<'_, Sqlite>, step: CompletionStep, required: i64) {
    match step {
        CompletionStep::Increment => {
            builder.push("CASE WHEN ");
            push_current_count(builder, required);
            builder.push(" >= ").push_bind(required).push(" THEN ");
            push_current_count(builder, required);
            builder.push(" ELSE ");
            push_current_count(builder, required);
            builder.push(" + 1 END");
        }
        CompletionStep::Decrement => {
            builder.push("CASE WHEN ");
            push_current_count(builder, required);
            builder.push(" > 0 THEN ");
            push_current_count(builder, required);
            builder.push(" - 1 ELSE 0 END");
        }
        CompletionStep::Toggle => {
            builder.push("CASE WHEN ");
            push_current_count(builder, required);
            builder
                .push(" >= ")
                .push_bind(required)
                .push(" THEN 0 ELSE ")
                .push_bind(required)
                .push(" END");
        }
    }
}

fn row_to_client_habit(row: &SqliteRow) -> Result<ClientHabit, DatabaseError> {
    let id: String = row.try_get("id")?;
    let programme_habit_id: String = row.try_get("programme_habit_id")?;
    let client_id: String = row.try_get("client_id")?;
    let habit_date: String = row.try_get("habit_date")?;
    let times_done: Option<i64> = row.try_get("times_done")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(ClientHabit {
        id: parse_uuid("client_habits.id", &id)?,
        programme_habit_id: parse_uuid("client_habits.programme_habit_id", &programme_habit_id)?,
        client_id: ClientId::parse(&client_id).map_err(|e| DatabaseError::InvalidData {
            field: "client_habits.client_id",
            reason: e.message,
        })?,
        habit_date: parse_stored_date("client_habits.habit_date", &habit_date)?,
        times_done: times_done
            .map(|count| to_count("client_habits.times_done", count))
            .transpose()?,
        completed: row.try_get("completed")?,
        created_at: parse_timestamp("client_habits.created_at", &created_at)?,
        updated_at: parse_timestamp("client_habits.updated_at", &updated_at)?,
    })
}
