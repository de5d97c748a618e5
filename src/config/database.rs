// ABOUTME: Database configuration types for SQLite connections
// ABOUTME: Parses DATABASE_URL and holds pool and busy-timeout settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::environment::parse_env;
use crate::constants::{defaults, env_keys};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::time::Duration;

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for URLs naming a database other than `SQLite`
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.strip_prefix("//").unwrap_or(path_str);
            if path_str == ":memory:" || path_str.is_empty() {
                Ok(Self::Memory)
            } else {
                Ok(Self::SQLite {
                    path: PathBuf::from(path_str),
                })
            }
        } else if s.contains("://") {
            Err(AppError::config_invalid(format!(
                "Unsupported database URL scheme in '{s}'; only sqlite: is supported"
            )))
        } else if s.is_empty() {
            Err(AppError::config_invalid("DATABASE_URL is empty"))
        } else {
            // Fallback: treat as SQLite file path
            Ok(Self::SQLite {
                path: PathBuf::from(s),
            })
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/habits.db"),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database connection and management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Run schema migrations on startup
    pub auto_migrate: bool,
    /// Pool size for file databases; in-memory databases always use one connection
    pub max_connections: u32,
    /// How long `SQLite` waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            auto_migrate: true,
            max_connections: defaults::DATABASE_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(defaults::DATABASE_BUSY_TIMEOUT_MS),
        }
    }
}

impl DatabaseConfig {
    /// In-memory configuration used by tests and demos
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: DatabaseUrl::Memory,
            ..Self::default()
        }
    }

    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if database environment variables are invalid
    pub fn from_env() -> AppResult<Self> {
        let url = match env::var(env_keys::DATABASE_URL) {
            Ok(value) => DatabaseUrl::parse_url(&value)?,
            Err(_) => DatabaseUrl::parse_url(defaults::DATABASE_URL)?,
        };
        let max_connections: u32 = parse_env(
            env_keys::DATABASE_MAX_CONNECTIONS,
            defaults::DATABASE_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(AppError::config_invalid(
                "DATABASE_MAX_CONNECTIONS must be at least 1",
            ));
        }
        Ok(Self {
            url,
            auto_migrate: parse_env(env_keys::AUTO_MIGRATE, true)?,
            max_connections,
            busy_timeout: Duration::from_millis(parse_env(
                env_keys::DATABASE_BUSY_TIMEOUT_MS,
                defaults::DATABASE_BUSY_TIMEOUT_MS,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite_urls() {
        assert_eq!(DatabaseUrl::parse_url("sqlite::memory:").unwrap(), DatabaseUrl::Memory);
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:./data/habits.db").unwrap(),
            DatabaseUrl::SQLite {
                path: PathBuf::from("./data/habits.db")
            }
        );
        assert_eq!(
            DatabaseUrl::parse_url("sqlite:///tmp/h.db").unwrap().to_connection_string(),
            "sqlite:/tmp/h.db"
        );
        assert_eq!(
            DatabaseUrl::parse_url("habits.db").unwrap(),
            DatabaseUrl::SQLite {
                path: PathBuf::from("habits.db")
            }
        );
    }

    #[test]
    fn test_rejects_other_databases() {
        assert!(DatabaseUrl::parse_url("postgres://localhost/habits").is_err());
        assert!(DatabaseUrl::parse_url("  ").is_err());
    }
}
