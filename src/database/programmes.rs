// ABOUTME: Programme catalog tables: habit templates, programmes, assignments and enrolments
// ABOUTME: Serves the overlap-filtered catalog query and the trainer maintenance operations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{
    frequency_column_definitions, frequency_from_row, parse_json, parse_stored_date,
    parse_timestamp, parse_uuid, to_count, Database, FREQUENCY_COLUMNS,
};
use crate::errors::DatabaseError;
use chrono::{NaiveDate, Utc};
use habit_core::dates::format_date;
use habit_core::models::{
    is_active_on, ClientId, Habit, NewProgramme, Programme, ProgrammeEnrolment,
    ProgrammeHabit, ProgrammeHabitView, ProgrammeView, WeeklyFrequency,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

/// A programme habit the client can log against, with its programme's dates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedHabit {
    /// The assignment with its template title
    pub habit: ProgrammeHabitView,
    /// Whether the assignment is still active
    pub current: bool,
    /// Programme's first day
    pub programme_start: NaiveDate,
    /// Programme's last day, `None` for ongoing
    pub programme_end: Option<NaiveDate>,
}

impl AssignedHabit {
    /// Required repetitions on `date`, zero when the programme is not running
    #[must_use]
    pub fn required_on(&self, date: NaiveDate) -> u32 {
        if is_active_on(self.programme_start, self.programme_end, date) {
            self.habit.required_on(date)
        } else {
            0
        }
    }
}

/// Result of an enrolment attempt
#[derive(Debug, Clone)]
pub enum EnrolmentOutcome {
    /// A new enrolment was created
    Enrolled(ProgrammeEnrolment),
    /// The client was already enrolled; the existing row is returned
    AlreadyEnrolled(ProgrammeEnrolment),
    /// The programme has reached its client cap
    Full {
        /// The cap that was reached
        max_clients: u32,
    },
}

fn frequency_columns(prefix: &str) -> String {
    FREQUENCY_COLUMNS
        .iter()
        .map(|column| format!("{prefix}{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn aliased_frequency_columns(table: &str, alias_prefix: &str) -> String {
    FREQUENCY_COLUMNS
        .iter()
        .map(|column| format!("{table}.{column} AS {alias_prefix}{column}"))
        .collect::<Vec<_>>()
        .join(", ")
}

const PROGRAMME_COLUMNS: &str = "id, human_id, name, start_date, end_date, max_clients, cost_cents, notes, adhoc_data, created_at";

impl Database {
    pub(super) async fn migrate_programmes(&self) -> Result<(), sqlx::Error> {
        let frequencies = frequency_column_definitions();

        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS habits (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                notes TEXT,
                {frequencies},
                current BOOLEAN NOT NULL DEFAULT 1
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS programmes (
                id TEXT PRIMARY KEY,
                human_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                max_clients INTEGER CHECK (max_clients IS NULL OR max_clients >= 0),
                cost_cents INTEGER CHECK (cost_cents IS NULL OR cost_cents >= 0),
                notes TEXT,
                adhoc_data TEXT,
                created_at TEXT NOT NULL,
                CHECK (end_date IS NULL OR start_date <= end_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS programme_habits (
                id TEXT PRIMARY KEY,
                programme_id TEXT NOT NULL REFERENCES programmes(id) ON DELETE CASCADE,
                habit_id TEXT NOT NULL REFERENCES habits(id),
                {frequencies},
                notes TEXT,
                current BOOLEAN NOT NULL DEFAULT 1
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS programme_enrolments (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
                programme_id TEXT NOT NULL REFERENCES programmes(id) ON DELETE CASCADE,
                notes TEXT,
                adhoc_data TEXT,
                enrolled_at TEXT NOT NULL,
                UNIQUE(client_id, programme_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_programmes_dates ON programmes(start_date, end_date)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_programme_habits_programme ON programme_habits(programme_id, current)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_enrolments_client ON programme_enrolments(client_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Programmes the client is enrolled in that overlap `[begin, finish]`
    ///
    /// `finish = None` restricts the result to programmes active on `begin`.
    /// Only current habit assignments are included; a programme with none
    /// still appears with an empty habit list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the client does not exist
    pub async fn programmes_for_client(
        &self,
        client_id: &ClientId,
        begin: NaiveDate,
        finish: Option<NaiveDate>,
    ) -> Result<Vec<ProgrammeView>, DatabaseError> {
        self.ensure_client(client_id).await?;

        let window_end = finish.unwrap_or(begin);
        let query = format!(
            r"
            SELECT p.id, p.human_id, p.name, p.start_date, p.end_date,
                   ph.id AS ph_id, ph.habit_id AS ph_habit_id, ph.notes AS ph_notes,
                   {}, h.title AS habit_title
            FROM programme_enrolments e
            JOIN programmes p ON p.id = e.programme_id
            LEFT JOIN programme_habits ph ON ph.programme_id = p.id AND ph.current = 1
            LEFT JOIN habits h ON h.id = ph.habit_id
            WHERE e.client_id = ?
              AND p.start_date <= ?
              AND (p.end_date IS NULL OR p.end_date >= ?)
            ORDER BY p.start_date, p.id, h.title, ph.id
            ",
            aliased_frequency_columns("ph", "ph_")
        );

        let rows = sqlx::query(&query)
            .bind(client_id.as_str())
            .bind(format_date(window_end))
            .bind(format_date(begin))
            .fetch_all(&self.pool)
            .await?;

        let mut programmes: Vec<ProgrammeView> = Vec::new();
        for row in &rows {
            let programme_id = parse_uuid("programmes.id", &row.try_get::<String, _>("id")?)?;
            if programmes.last().map(|p| p.id) != Some(programme_id) {
                programmes.push(row_to_programme_view(row, programme_id)?);
            }
            let Some(ph_id) = row.try_get::<Option<String>, _>("ph_id")? else {
                continue;
            };
            let habit = row_to_habit_view(row, programme_id, &ph_id)?;
            if let Some(view) = programmes.last_mut() {
                view.habits.push(habit);
            }
        }

        debug!(
            client.id = %client_id,
            begin = %begin,
            finish = ?finish,
            programmes = programmes.len(),
            "Loaded programme catalog"
        );
        Ok(programmes)
    }

    /// Look up a programme habit through one of the client's enrolments
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn assigned_habit(
        &self,
        client_id: &ClientId,
        programme_habit_id: Uuid,
    ) -> Result<Option<AssignedHabit>, DatabaseError> {
        let query = format!(
            r"
            SELECT p.start_date, p.end_date,
                   ph.id AS ph_id, ph.programme_id, ph.habit_id AS ph_habit_id,
                   ph.notes AS ph_notes, ph.current AS ph_current,
                   {}, h.title AS habit_title
            FROM programme_habits ph
            JOIN programmes p ON p.id = ph.programme_id
            JOIN habits h ON h.id = ph.habit_id
            JOIN programme_enrolments e ON e.programme_id = p.id AND e.client_id = ?
            WHERE ph.id = ?
            ",
            aliased_frequency_columns("ph", "ph_")
        );

        let row = sqlx::query(&query)
            .bind(client_id.as_str())
            .bind(programme_habit_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let programme_id =
            parse_uuid("programme_habits.programme_id", &row.try_get::<String, _>("programme_id")?)?;
        let start: String = row.try_get("start_date")?;
        let end: Option<String> = row.try_get("end_date")?;
        Ok(Some(AssignedHabit {
            habit: row_to_habit_view(&row, programme_id, &programme_habit_id.to_string())?,
            current: row.try_get("ph_current")?,
            programme_start: parse_stored_date("programmes.start_date", &start)?,
            programme_end: end
                .map(|end| parse_stored_date("programmes.end_date", &end))
                .transpose()?,
        }))
    }

    /// Create a habit template
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_habit(
        &self,
        title: &str,
        notes: Option<&str>,
        default_frequency: WeeklyFrequency,
    ) -> Result<Habit, DatabaseError> {
        let id = Uuid::new_v4();
        let [mon, tue, wed, thu, fri, sat, sun] = default_frequency.to_columns();
        sqlx::query(&format!(
            "INSERT INTO habits (id, title, notes, {}, current) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
            frequency_columns("")
        ))
        .bind(id.to_string())
        .bind(title)
        .bind(notes)
        .bind(mon)
        .bind(tue)
        .bind(wed)
        .bind(thu)
        .bind(fri)
        .bind(sat)
        .bind(sun)
        .execute(&self.pool)
        .await?;

        Ok(Habit {
            id,
            title: title.to_owned(),
            notes: notes.map(str::to_owned),
            default_frequency,
            current: true,
        })
    }

    /// Fetch a habit template
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_habit(&self, id: Uuid) -> Result<Option<Habit>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT id, title, notes, {}, current FROM habits WHERE id = ?",
            frequency_columns("")
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Habit {
                id,
                title: row.try_get("title")?,
                notes: row.try_get("notes")?,
                default_frequency: frequency_from_row(&row, "")?,
                current: row.try_get("current")?,
            })
        })
        .transpose()
    }

    /// Create a programme; the caller validates the input
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` when the human-readable id is taken
    pub async fn create_programme(&self, input: &NewProgramme) -> Result<Programme, DatabaseError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let adhoc_data = input.adhoc_data.as_ref().map(ToString::to_string);

        sqlx::query(&format!(
            "INSERT INTO programmes ({PROGRAMME_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(id.to_string())
        .bind(&input.human_id)
        .bind(&input.name)
        .bind(format_date(input.start_date))
        .bind(input.end_date.map(format_date))
        .bind(input.max_clients.map(i64::from))
        .bind(input.cost_cents)
        .bind(&input.notes)
        .bind(adhoc_data)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::ConcurrencyConflict { .. } => DatabaseError::Duplicate {
                entity_type: "programme",
                key: input.human_id.clone(),
            },
            other => other,
        })?;

        Ok(Programme {
            id,
            human_id: input.human_id.clone(),
            name: input.name.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            max_clients: input.max_clients,
            cost_cents: input.cost_cents,
            notes: input.notes.clone(),
            adhoc_data: input.adhoc_data.clone(),
            created_at: now,
        })
    }

    /// Fetch a programme
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_programme(&self, id: Uuid) -> Result<Option<Programme>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT {PROGRAMME_COLUMNS} FROM programmes WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_programme).transpose()
    }

    /// Attach a habit template to a programme with the given frequencies
    ///
    /// # Errors
    ///
    /// Returns `ForeignKeyViolation` when the programme or template is missing
    pub async fn attach_habit(
        &self,
        programme_id: Uuid,
        habit_id: Uuid,
        frequency: WeeklyFrequency,
        notes: Option<&str>,
    ) -> Result<ProgrammeHabit, DatabaseError> {
        let id = Uuid::new_v4();
        let [mon, tue, wed, thu, fri, sat, sun] = frequency.to_columns();
        sqlx::query(&format!(
            "INSERT INTO programme_habits (id, programme_id, habit_id, {}, notes, current) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
            frequency_columns("")
        ))
        .bind(id.to_string())
        .bind(programme_id.to_string())
        .bind(habit_id.to_string())
        .bind(mon)
        .bind(tue)
        .bind(wed)
        .bind(thu)
        .bind(fri)
        .bind(sat)
        .bind(sun)
        .bind(notes)
        .execute(&self.pool)
        .await?;

        Ok(ProgrammeHabit {
            id,
            programme_id,
            habit_id,
            frequency,
            notes: notes.map(str::to_owned),
            current: true,
        })
    }

    /// Retire or reactivate a programme habit
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no assignment has this id
    pub async fn set_programme_habit_current(
        &self,
        programme_habit_id: Uuid,
        current: bool,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE programme_habits SET current = ? WHERE id = ?")
            .bind(current)
            .bind(programme_habit_id.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound {
                entity_type: "programme habit",
                entity_id: programme_habit_id.to_string(),
            });
        }
        Ok(())
    }

    /// Enrol a client, respecting the programme's client cap
    ///
    /// The cap check and insert share one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the client or programme does not exist
    pub async fn enrol_client(
        &self,
        client_id: &ClientId,
        programme_id: Uuid,
        notes: Option<&str>,
        adhoc_data: Option<&serde_json::Value>,
    ) -> Result<EnrolmentOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let client: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE id = ?")
            .bind(client_id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        if client.is_none() {
            return Err(DatabaseError::NotFound {
                entity_type: "client",
                entity_id: client_id.to_string(),
            });
        }

        let max_clients: Option<Option<i64>> =
            sqlx::query_scalar("SELECT max_clients FROM programmes WHERE id = ?")
                .bind(programme_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(max_clients) = max_clients else {
            return Err(DatabaseError::NotFound {
                entity_type: "programme",
                entity_id: programme_id.to_string(),
            });
        };

        let existing = sqlx::query(
            "SELECT id, client_id, programme_id, notes, adhoc_data, enrolled_at FROM programme_enrolments WHERE client_id = ? AND programme_id = ?",
        )
        .bind(client_id.as_str())
        .bind(programme_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(row) = existing {
            return Ok(EnrolmentOutcome::AlreadyEnrolled(row_to_enrolment(&row)?));
        }

        if let Some(max_clients) = max_clients {
            let enrolled: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM programme_enrolments WHERE programme_id = ?")
                    .bind(programme_id.to_string())
                    .fetch_one(&mut *tx)
                    .await?;
            if enrolled >= max_clients {
                return Ok(EnrolmentOutcome::Full {
                    max_clients: to_count("programmes.max_clients", max_clients)?,
                });
            }
        }

        let enrolment = ProgrammeEnrolment {
            id: Uuid::new_v4(),
            client_id: client_id.clone(),
            programme_id,
            notes: notes.map(str::to_owned),
            adhoc_data: adhoc_data.cloned(),
            enrolled_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO programme_enrolments (id, client_id, programme_id, notes, adhoc_data, enrolled_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(enrolment.id.to_string())
        .bind(client_id.as_str())
        .bind(programme_id.to_string())
        .bind(notes)
        .bind(adhoc_data.map(ToString::to_string))
        .bind(enrolment.enrolled_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(EnrolmentOutcome::Enrolled(enrolment))
    }
}

fn row_to_programme_view(row: &SqliteRow, id: Uuid) -> Result<ProgrammeView, DatabaseError> {
    let start: String = row.try_get("start_date")?;
    let end: Option<String> = row.try_get("end_date")?;
    Ok(ProgrammeView {
        id,
        human_id: row.try_get("human_id")?,
        name: row.try_get("name")?,
        start_date: parse_stored_date("programmes.start_date", &start)?,
        end_date: end
            .map(|end| parse_stored_date("programmes.end_date", &end))
            .transpose()?,
        habits: Vec::new(),
    })
}

fn row_to_habit_view(
    row: &SqliteRow,
    programme_id: Uuid,
    ph_id: &str,
) -> Result<ProgrammeHabitView, DatabaseError> {
    let habit_id: String = row.try_get("ph_habit_id")?;
    let title: Option<String> = row.try_get("habit_title")?;
    Ok(ProgrammeHabitView {
        id: parse_uuid("programme_habits.id", ph_id)?,
        programme_id,
        habit_id: parse_uuid("programme_habits.habit_id", &habit_id)?,
        title: title.ok_or_else(|| DatabaseError::InvalidData {
            field: "habits.title",
            reason: format!("programme habit {ph_id} references a missing template"),
        })?,
        frequency: frequency_from_row(row, "ph_")?,
        notes: row.try_get("ph_notes")?,
    })
}

fn row_to_programme(row: &SqliteRow) -> Result<Programme, DatabaseError> {
    let id: String = row.try_get("id")?;
    let start: String = row.try_get("start_date")?;
    let end: Option<String> = row.try_get("end_date")?;
    let max_clients: Option<i64> = row.try_get("max_clients")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Programme {
        id: parse_uuid("programmes.id", &id)?,
        human_id: row.try_get("human_id")?,
        name: row.try_get("name")?,
        start_date: parse_stored_date("programmes.start_date", &start)?,
        end_date: end
            .map(|end| parse_stored_date("programmes.end_date", &end))
            .transpose()?,
        max_clients: max_clients
            .map(|max| to_count("programmes.max_clients", max))
            .transpose()?,
        cost_cents: row.try_get("cost_cents")?,
        notes: row.try_get("notes")?,
        adhoc_data: parse_json("programmes.adhoc_data", row.try_get("adhoc_data")?)?,
        created_at: parse_timestamp("programmes.created_at", &created_at)?,
    })
}

fn row_to_enrolment(row: &SqliteRow) -> Result<ProgrammeEnrolment, DatabaseError> {
    let id: String = row.try_get("id")?;
    let client_id: String = row.try_get("client_id")?;
    let programme_id: String = row.try_get("programme_id")?;
    let enrolled_at: String = row.try_get("enrolled_at")?;
    Ok(ProgrammeEnrolment {
        id: parse_uuid("programme_enrolments.id", &id)?,
        client_id: ClientId::parse(&client_id).map_err(|e| DatabaseError::InvalidData {
            field: "programme_enrolments.client_id",
            reason: e.message,
        })?,
        programme_id: parse_uuid("programme_enrolments.programme_id", &programme_id)?,
        notes: row.try_get("notes")?,
        adhoc_data: parse_json("programme_enrolments.adhoc_data", row.try_get("adhoc_data")?)?,
        enrolled_at: parse_timestamp("programme_enrolments.enrolled_at", &enrolled_at)?,
    })
}
