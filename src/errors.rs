// ABOUTME: Error types for the habit coaching server
// ABOUTME: Re-exports the unified error system defined in habit-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! `AppError` carries an `ErrorCode` that fixes the HTTP status and the
//! machine-readable code of the JSON error body. Store code returns
//! `DatabaseError`, which converts into `AppError` at the service boundary.

pub use habit_core::errors::{
    AppError, AppResult, DatabaseError, ErrorCode, ErrorContext, ErrorResponse,
    ErrorResponseDetails,
};
