// ABOUTME: Core types for the programme habit tracking service
// ABOUTME: Foundation crate with error handling, domain models, and date normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Habit Core
//!
//! Foundation crate providing shared types for the programme habit tracking
//! service. It holds everything that the storage, aggregation and HTTP layers
//! agree on, and is designed to change infrequently.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `DatabaseError`
//! - **dates**: The one place where calendar dates are parsed, normalized and indexed
//! - **models**: Clients, habit templates, programmes, enrolments and completion rows
//! - **constants**: Limits and defaults shared across crates

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Date-only normalization, weekday indexing and inclusive date ranges
pub mod dates;

/// Domain models for programmes, habits and the completion ledger
pub mod models;

/// Shared limits and defaults
pub mod constants;
