// ABOUTME: Environment-based server configuration loaded from process variables and .env
// ABOUTME: Combines HTTP, database and habit settings with validation and a printable summary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::database::DatabaseConfig;
use super::habits::HabitSettings;
use crate::constants::{defaults, env_keys};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind address
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Habit tracking settings
    pub habits: HabitSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            database: DatabaseConfig::default(),
            habits: HabitSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` when a variable is set but cannot be parsed
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = Self {
            host: env_var_or(env_keys::HOST, defaults::HOST),
            http_port: parse_env(env_keys::HTTP_PORT, defaults::HTTP_PORT)?,
            request_timeout: Duration::from_secs(parse_env(
                env_keys::REQUEST_TIMEOUT_SECS,
                defaults::REQUEST_TIMEOUT_SECS,
            )?),
            database: DatabaseConfig::from_env()?,
            habits: HabitSettings::from_env()?,
        };
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for a zero port or zero request timeout
    pub fn validate(&self) -> AppResult<()> {
        if self.http_port == 0 {
            return Err(AppError::config_invalid("HTTP_PORT must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::config_invalid("REQUEST_TIMEOUT_SECS must be positive"));
        }
        self.habits.validate()
    }

    /// Socket address string for the HTTP listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// Human-readable configuration summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Habit Coach Server Configuration:\n\
             - HTTP: {}\n\
             - Request Timeout: {}s\n\
             - Database: {}\n\
             - Auto Migrate: {}\n\
             - Edit Window: {} days\n\
             - Default Timezone: {}\n\
             - Max Range: {} days\n\
             - Store Timeout: {}ms\n\
             - Upsert Attempts: {}",
            self.bind_address(),
            self.request_timeout.as_secs(),
            self.database.url,
            self.database.auto_migrate,
            self.habits.edit_window_days,
            self.habits.default_timezone,
            self.habits.max_range_days,
            self.habits.store_timeout.as_millis(),
            self.habits.upsert_retries,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
///
/// # Errors
///
/// Returns `ConfigInvalid` naming the variable when it is set but unparsable
pub(crate) fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e| {
            AppError::config_invalid(format!("Invalid {key} value '{value}': {e}"))
        }),
        Err(_) => Ok(default),
    }
}
