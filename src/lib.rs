// ABOUTME: Main library entry point for the programme habit tracking service
// ABOUTME: Exposes the store, day aggregation, calendar views and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Habit Coach Server
//!
//! Tracks coached clients' daily habits. Clients are enrolled in programmes,
//! each programme assigns habits with a target count per weekday, and clients
//! record how often they performed each habit on each day.
//!
//! ## Architecture
//!
//! - **database**: SQLite catalog of programmes and the completion ledger
//! - **aggregation**: pure merge of catalog and ledger into day summaries
//! - **calendar**: week and month views plus the edit-window rule
//! - **services**: authorization, deadlines and retries around the store
//! - **routes**: JSON HTTP surface built on axum
//! - **config**: environment-driven configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use habit_coach_server::config::environment::ServerConfig;
//! use habit_coach_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Habit server configured for {}", config.bind_address());
//!     Ok(())
//! }
//! ```

/// Day summaries computed from the catalog and the ledger
pub mod aggregation;

/// Caller identity and authorization
pub mod auth;

/// Week and month views and the edit window
pub mod calendar;

/// Environment-driven configuration
pub mod config;

/// Application constants, environment keys and defaults
pub mod constants;

/// SQLite store for the catalog and completion ledger
pub mod database;

/// Unified error handling re-exported from `habit_core`
pub mod errors;

/// Structured logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// HTTP route groups
pub mod routes;

/// Service layer between routes and the store
pub mod services;
