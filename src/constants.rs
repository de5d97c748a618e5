// ABOUTME: Server-wide constants: service names, environment variable keys and defaults
// ABOUTME: Domain defaults shared with the core crate are re-exported from habit_core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Hardcoded constants and the names of the environment variables that
//! override them.

pub use habit_core::constants::{
    DEFAULT_EDIT_WINDOW_DAYS, DEFAULT_MAX_RANGE_DAYS, DEFAULT_TIMEZONE, MAX_DAILY_FREQUENCY,
};

/// Service names used in logs and health responses
pub mod service_names {
    /// Server service name
    pub const HABIT_COACH_SERVER: &str = "habit-coach-server";
}

/// Environment variable names
pub mod env_keys {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// HTTP bind address
    pub const HOST: &str = "HOST";
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Pool size for file databases
    pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
    /// `SQLite` busy timeout in milliseconds
    pub const DATABASE_BUSY_TIMEOUT_MS: &str = "DATABASE_BUSY_TIMEOUT_MS";
    /// Run schema migrations on startup
    pub const AUTO_MIGRATE: &str = "AUTO_MIGRATE";
    /// Days in the past a client may still edit
    pub const HABIT_EDIT_WINDOW_DAYS: &str = "HABIT_EDIT_WINDOW_DAYS";
    /// Timezone used when a request carries none
    pub const HABIT_DEFAULT_TIMEZONE: &str = "HABIT_DEFAULT_TIMEZONE";
    /// Widest range a single read may cover
    pub const HABIT_MAX_RANGE_DAYS: &str = "HABIT_MAX_RANGE_DAYS";
    /// Deadline for a single store call in milliseconds
    pub const HABIT_STORE_TIMEOUT_MS: &str = "HABIT_STORE_TIMEOUT_MS";
    /// Attempts for a ledger write hitting a concurrency conflict
    pub const HABIT_UPSERT_RETRIES: &str = "HABIT_UPSERT_RETRIES";
    /// Whole-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
}

/// Default values for server settings
pub mod defaults {
    /// HTTP listen port
    pub const HTTP_PORT: u16 = 8081;
    /// HTTP bind address
    pub const HOST: &str = "127.0.0.1";
    /// Database URL
    pub const DATABASE_URL: &str = "sqlite:./data/habits.db";
    /// Pool size for file databases
    pub const DATABASE_MAX_CONNECTIONS: u32 = 5;
    /// `SQLite` busy timeout in milliseconds
    pub const DATABASE_BUSY_TIMEOUT_MS: u64 = 5_000;
    /// Store call deadline in milliseconds
    pub const STORE_TIMEOUT_MS: u64 = 5_000;
    /// Ledger write attempts
    pub const UPSERT_RETRIES: u32 = 3;
    /// Whole-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Identity headers set by the upstream authentication proxy
pub mod identity_headers {
    /// Authenticated client identifier
    pub const CLIENT: &str = "x-authenticated-client";
    /// Authenticated staff user identifier
    pub const STAFF: &str = "x-authenticated-staff";
    /// Role of the authenticated staff user
    pub const ROLE: &str = "x-authenticated-role";
}
