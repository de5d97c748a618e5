// ABOUTME: Client table migrations and queries
// ABOUTME: Client existence is what separates NotFound from an empty catalog or ledger read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_timestamp, Database};
use crate::errors::DatabaseError;
use chrono::Utc;
use habit_core::models::{Client, ClientId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_clients(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_clients_email ON clients(email) WHERE email IS NOT NULL")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Register a client
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` when the identifier or email is already taken
    pub async fn create_client(
        &self,
        id: &ClientId,
        name: &str,
        email: Option<&str>,
    ) -> Result<Client, DatabaseError> {
        let now = Utc::now();
        sqlx::query("INSERT INTO clients (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.as_str())
            .bind(name)
            .bind(email)
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::ConcurrencyConflict { .. } => DatabaseError::Duplicate {
                    entity_type: "client",
                    key: id.to_string(),
                },
                other => other,
            })?;

        Ok(Client {
            id: id.clone(),
            name: name.to_owned(),
            email: email.map(str::to_owned),
            created_at: now,
        })
    }

    /// Fetch a client by identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be decoded
    pub async fn get_client(&self, id: &ClientId) -> Result<Option<Client>, DatabaseError> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM clients WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_client).transpose()
    }

    /// Whether the client exists
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn client_exists(&self, id: &ClientId) -> Result<bool, DatabaseError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Fail with `NotFound` unless the client exists
    pub(super) async fn ensure_client(&self, id: &ClientId) -> Result<(), DatabaseError> {
        if self.client_exists(id).await? {
            Ok(())
        } else {
            Err(DatabaseError::NotFound {
                entity_type: "client",
                entity_id: id.to_string(),
            })
        }
    }
}

fn row_to_client(row: &SqliteRow) -> Result<Client, DatabaseError> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Client {
        id: ClientId::parse(&id).map_err(|e| DatabaseError::InvalidData {
            field: "clients.id",
            reason: e.message,
        })?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: parse_timestamp("clients.created_at", &created_at)?,
    })
}
