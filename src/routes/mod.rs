// ABOUTME: HTTP route groups and the assembled application router
// ABOUTME: Wires health and habit routes behind request ID, tracing and timeout layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Routes
//!
//! Each route group is a unit struct exposing `routes(context) -> Router`,
//! and [`build_router`] merges them into the application.
//!
//! - **health**: liveness and store readiness
//! - **habits**: programme catalog, completion ledger and calendar views

/// Habit catalog, ledger and calendar routes
pub mod habits;
/// Health and readiness routes
pub mod health;

pub use habits::HabitRoutes;
pub use health::HealthRoutes;

use crate::middleware::request_id_middleware;
use crate::services::HabitTrackingService;
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared state handed to every route group
#[derive(Clone)]
pub struct AppContext {
    /// Habit tracking service
    pub tracking: HabitTrackingService,
}

impl AppContext {
    /// Wrap the tracking service
    #[must_use]
    pub fn new(tracking: HabitTrackingService) -> Self {
        Self { tracking }
    }
}

/// Assemble all route groups with the shared middleware stack
///
/// Requests that run longer than `request_timeout` are answered with
/// `408 Request Timeout`.
pub fn build_router(context: AppContext, request_timeout: Duration) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(context.clone()))
        .merge(HabitRoutes::routes(context))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
