// ABOUTME: SQLite persistence for clients, the programme catalog and the completion ledger
// ABOUTME: Owns the connection pool, schema migrations and row decoding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! `Database` wraps a `SQLite` pool. Each submodule adds an `impl Database`
//! block with the migrations and queries for its tables.

mod clients;
mod completions;
mod programmes;

/// Store trait consumed by the service layer, implemented by `Database`
pub mod store;

pub use programmes::{AssignedHabit, EnrolmentOutcome};
pub use store::HabitStore;

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::errors::DatabaseError;
use chrono::{DateTime, NaiveDate, Utc};
use habit_core::constants::DATE_FORMAT;
use habit_core::models::WeeklyFrequency;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

/// Database manager for the habit catalog and completion ledger
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect using the given configuration, running migrations when enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let memory = config.url.is_memory();
        if let DatabaseUrl::SQLite { path } = &config.url {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Unavailable {
                    context: format!("cannot create {}: {e}", parent.display()),
                })?;
            }
        }
        let mut options = SqliteConnectOptions::from_str(&config.url.to_connection_string())?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);
        if !memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every in-memory connection is its own database, so the pool keeps exactly one alive
        let pool_options = if memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };
        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        if config.auto_migrate {
            db.migrate().await?;
        }
        info!(database = %config.url, "Database connected");
        Ok(db)
    }

    /// Create a migrated database from a URL with default pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection fails
    pub async fn new(database_url: &str) -> Result<Self, DatabaseError> {
        let url = DatabaseUrl::parse_url(database_url).map_err(|e| DatabaseError::InvalidData {
            field: "database_url",
            reason: e.message,
        })?;
        Self::connect(&DatabaseConfig {
            url,
            auto_migrate: true,
            ..DatabaseConfig::default()
        })
        .await
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if any statement fails
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        self.migrate_clients().await.map_err(migration_error)?;
        self.migrate_programmes().await.map_err(migration_error)?;
        self.migrate_completions().await.map_err(migration_error)?;
        debug!("Database schema is up to date");
        Ok(())
    }

    /// Round-trip a trivial query, used by readiness checks
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` when no connection can be acquired
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn migration_error(err: sqlx::Error) -> DatabaseError {
    DatabaseError::MigrationError {
        context: err.to_string(),
    }
}

/// Seven frequency columns, Monday first
pub(crate) const FREQUENCY_COLUMNS: [&str; 7] = [
    "mon_frequency",
    "tue_frequency",
    "wed_frequency",
    "thu_frequency",
    "fri_frequency",
    "sat_frequency",
    "sun_frequency",
];

/// Column definitions for the seven frequency columns
pub(crate) fn frequency_column_definitions() -> String {
    FREQUENCY_COLUMNS
        .iter()
        .map(|column| {
            format!("{column} INTEGER NOT NULL DEFAULT 0 CHECK ({column} >= 0)")
        })
        .collect::<Vec<_>>()
        .join(",\n                ")
}

/// Decode the frequency columns of a row; `prefix` selects aliased columns
pub(crate) fn frequency_from_row(row: &SqliteRow, prefix: &str) -> Result<WeeklyFrequency, DatabaseError> {
    let mut columns = [0_i64; 7];
    for (slot, column) in columns.iter_mut().zip(FREQUENCY_COLUMNS) {
        *slot = row.try_get(format!("{prefix}{column}").as_str())?;
    }
    WeeklyFrequency::from_columns(columns).map_err(|e| DatabaseError::InvalidData {
        field: "frequency",
        reason: e.message,
    })
}

pub(crate) fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::InvalidData {
        field,
        reason: format!("'{value}' is not a UUID: {e}"),
    })
}

pub(crate) fn parse_stored_date(field: &'static str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| DatabaseError::InvalidData {
        field,
        reason: format!("'{value}' is not a yyyy-MM-dd date: {e}"),
    })
}

pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidData {
            field,
            reason: format!("'{value}' is not an RFC 3339 timestamp: {e}"),
        })
}

pub(crate) fn parse_json(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<serde_json::Value>, DatabaseError> {
    value
        .map(|text| {
            serde_json::from_str(&text).map_err(|e| DatabaseError::InvalidData {
                field,
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Stored count columns are `INTEGER`; negative values are corrupt
pub(crate) fn to_count(field: &'static str, value: i64) -> Result<u32, DatabaseError> {
    u32::try_from(value).map_err(|_| DatabaseError::InvalidData {
        field,
        reason: format!("{value} is not a valid count"),
    })
}
