// ABOUTME: HTTP middleware shared by every route group
// ABOUTME: Provides request ID generation and per-request tracing spans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Request correlation identifiers
pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
