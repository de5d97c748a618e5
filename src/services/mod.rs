// ABOUTME: Domain service layer between HTTP handlers and the SQLite store
// ABOUTME: Applies authorization, validation, timeouts and retries around store calls
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Services take already-normalized dates and an authenticated `Session`, and
//! return `AppResult` so handlers only translate between JSON and calls.

/// Trainer/admin catalog maintenance: templates, programmes, assignments, enrolments
pub mod catalog;

/// Client-facing reads, day summaries and ledger writes
pub mod habit_tracking;

pub use catalog::CatalogService;
pub use habit_tracking::HabitTrackingService;
