// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness always answers; readiness probes the habit store within its deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::AppContext;
use crate::constants::service_names;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(context: AppContext) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(Arc::new(context))
    }

    /// GET /health - process is up
    async fn handle_health() -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "service": service_names::HABIT_COACH_SERVER,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    /// GET /ready - store answers within the deadline
    async fn handle_ready(State(context): State<Arc<AppContext>>) -> impl IntoResponse {
        match context.tracking.ready().await {
            Ok(()) => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "status": "ready",
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            ),
            Err(err) => {
                warn!(error = %err, "Readiness probe failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(serde_json::json!({
                        "status": "unavailable",
                        "reason": err.message,
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                )
            }
        }
    }
}
