// ABOUTME: Request ID middleware tagging every HTTP request with a correlation identifier
// ABOUTME: Reuses an incoming x-request-id or generates a UUID, and echoes it on the response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderValue;
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Header carrying the correlation identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation identifier stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attach a [`RequestId`] to the request, run the rest of the stack inside a
/// span carrying it and return it in the `x-request-id` response header
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map_or_else(RequestId::generate, |value| RequestId(value.to_owned()));

    request.extensions_mut().insert(request_id.clone());

    let span = info_span!(
        "http_request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
