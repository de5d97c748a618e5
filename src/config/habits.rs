// ABOUTME: Habit tracking settings: edit window, default timezone, range and store limits
// ABOUTME: Consumed by the tracking service and the calendar view composer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::environment::parse_env;
use crate::constants::{defaults, env_keys, DEFAULT_EDIT_WINDOW_DAYS, DEFAULT_MAX_RANGE_DAYS};
use crate::errors::{AppError, AppResult};
use chrono_tz::Tz;
use habit_core::dates::parse_timezone;
use std::env;
use std::time::Duration;

/// Settings governing reads, writes and editability of habit completions
#[derive(Debug, Clone)]
pub struct HabitSettings {
    /// Days before today a client may still edit; future days never are
    pub edit_window_days: u32,
    /// Timezone applied when a request does not name one
    pub default_timezone: Tz,
    /// Widest inclusive range accepted by a single read
    pub max_range_days: u32,
    /// Deadline for each store call
    pub store_timeout: Duration,
    /// Attempts for a ledger write that hits a concurrency conflict
    pub upsert_retries: u32,
}

impl Default for HabitSettings {
    fn default() -> Self {
        Self {
            edit_window_days: DEFAULT_EDIT_WINDOW_DAYS,
            default_timezone: Tz::UTC,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            store_timeout: Duration::from_millis(defaults::STORE_TIMEOUT_MS),
            upsert_retries: defaults::UPSERT_RETRIES,
        }
    }
}

impl HabitSettings {
    /// Load habit settings from environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for unparsable values, an unknown timezone or zero limits
    pub fn from_env() -> AppResult<Self> {
        let default_timezone = match env::var(env_keys::HABIT_DEFAULT_TIMEZONE) {
            Ok(name) => parse_timezone(&name).map_err(|_| {
                AppError::config_invalid(format!(
                    "{} names an unknown timezone: {name}",
                    env_keys::HABIT_DEFAULT_TIMEZONE
                ))
            })?,
            Err(_) => Tz::UTC,
        };

        let settings = Self {
            edit_window_days: parse_env(env_keys::HABIT_EDIT_WINDOW_DAYS, DEFAULT_EDIT_WINDOW_DAYS)?,
            default_timezone,
            max_range_days: parse_env(env_keys::HABIT_MAX_RANGE_DAYS, DEFAULT_MAX_RANGE_DAYS)?,
            store_timeout: Duration::from_millis(parse_env(
                env_keys::HABIT_STORE_TIMEOUT_MS,
                defaults::STORE_TIMEOUT_MS,
            )?),
            upsert_retries: parse_env(env_keys::HABIT_UPSERT_RETRIES, defaults::UPSERT_RETRIES)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject limits that would make every request fail
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the offending setting
    pub fn validate(&self) -> AppResult<()> {
        if self.max_range_days == 0 {
            return Err(AppError::config_invalid("HABIT_MAX_RANGE_DAYS must be at least 1"));
        }
        if self.store_timeout.is_zero() {
            return Err(AppError::config_invalid("HABIT_STORE_TIMEOUT_MS must be positive"));
        }
        if self.upsert_retries == 0 {
            return Err(AppError::config_invalid("HABIT_UPSERT_RETRIES must be at least 1"));
        }
        Ok(())
    }
}
