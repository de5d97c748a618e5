// ABOUTME: Structured error types for the relational store behind the habit ledger
// ABOUTME: Classifies driver failures so the service can retry, report not-found, or fail cleanly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{AppError, ErrorCode};
use thiserror::Error;

/// Errors produced by store operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A referenced row does not exist
    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity_type: &'static str,
        /// Identifier that was looked up
        entity_id: String,
    },

    /// A row with the same natural key already exists
    #[error("Duplicate {entity_type}: {key}")]
    Duplicate {
        /// Kind of entity being written
        entity_type: &'static str,
        /// Natural key that collided
        key: String,
    },

    /// A foreign key pointed at a missing row
    #[error("Referenced row missing: {context}")]
    ForeignKeyViolation {
        /// What was being written
        context: String,
    },

    /// A unique-constraint race surfaced by the store
    #[error("Concurrent write conflict: {context}")]
    ConcurrencyConflict {
        /// What was being written
        context: String,
    },

    /// The store could not be reached (pool exhausted, closed, IO failure, timeout)
    #[error("Store unavailable: {context}")]
    Unavailable {
        /// Underlying failure
        context: String,
    },

    /// A stored value could not be mapped into a domain type
    #[error("Invalid stored data in {field}: {reason}")]
    InvalidData {
        /// Column or field that failed to decode
        field: &'static str,
        /// Why it failed
        reason: String,
    },

    /// Schema creation failed
    #[error("Migration failed: {context}")]
    MigrationError {
        /// Underlying failure
        context: String,
    },

    /// Any other query failure
    #[error("Query failed: {context}")]
    QueryError {
        /// Underlying failure
        context: String,
    },
}

impl DatabaseError {
    /// Whether retrying the same write may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity_type: "row",
                entity_id: String::new(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
                Self::Unavailable {
                    context: error.to_string(),
                }
            }
            sqlx::Error::Io(ref io) => Self::Unavailable {
                context: io.to_string(),
            },
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                Self::ConcurrencyConflict {
                    context: db_error.message().to_owned(),
                }
            }
            sqlx::Error::Database(ref db_error) if db_error.is_foreign_key_violation() => {
                Self::ForeignKeyViolation {
                    context: db_error.message().to_owned(),
                }
            }
            other => Self::QueryError {
                context: other.to_string(),
            },
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(error: DatabaseError) -> Self {
        let code = match &error {
            DatabaseError::NotFound { .. } | DatabaseError::ForeignKeyViolation { .. } => {
                ErrorCode::ResourceNotFound
            }
            DatabaseError::Duplicate { .. } => ErrorCode::ResourceAlreadyExists,
            DatabaseError::Unavailable { .. } => ErrorCode::ResourceUnavailable,
            DatabaseError::ConcurrencyConflict { .. }
            | DatabaseError::InvalidData { .. }
            | DatabaseError::MigrationError { .. }
            | DatabaseError::QueryError { .. } => ErrorCode::DatabaseError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}
