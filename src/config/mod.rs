// ABOUTME: Configuration management module for server, database and habit settings
// ABOUTME: Everything is loaded from environment variables with documented defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the habit coaching server
//!
//! - **Environment**: HTTP listener and request timeout
//! - **Database**: `SQLite` location, pool size and busy timeout
//! - **Habits**: edit window, default timezone and store limits

/// Database connection settings
pub mod database;
/// Environment and server configuration
pub mod environment;
/// Habit tracking settings
pub mod habits;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::ServerConfig;
pub use habits::HabitSettings;
