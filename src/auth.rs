// ABOUTME: Caller identity as established by the upstream session layer
// ABOUTME: Decides whether a session may read or write a given client's habit data
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Identity
//!
//! Authentication happens upstream; this server only trusts the identity
//! headers the session proxy sets on every forwarded request.

use crate::constants::identity_headers;
use crate::errors::{AppError, AppResult};
use axum::async_trait;
use axum::extract::FromRequestParts;
use habit_core::models::ClientId;
use http::request::Parts;
use http::HeaderMap;
use std::fmt;
use std::str::FromStr;

/// Staff roles that may act on behalf of clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffRole {
    /// Coach responsible for clients
    Trainer,
    /// Platform administrator
    Admin,
}

impl FromStr for StaffRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trainer" => Ok(Self::Trainer),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::auth_invalid(format!("Unknown staff role '{other}'"))),
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trainer => f.write_str("trainer"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Who is making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No verified identity
    Anonymous,
    /// A client acting for themselves
    Client(ClientId),
    /// A trainer or admin acting on behalf of clients
    Staff {
        /// Staff user identifier
        user_id: String,
        /// Staff role
        role: StaffRole,
    },
}

/// Source of the authenticated client identifier
pub trait IdentityProvider {
    /// The client this identity speaks for, `None` when unauthenticated or staff
    fn current_client_id(&self) -> Option<ClientId>;
}

impl IdentityProvider for Session {
    fn current_client_id(&self) -> Option<ClientId> {
        match self {
            Self::Client(id) => Some(id.clone()),
            Self::Anonymous | Self::Staff { .. } => None,
        }
    }
}

impl Session {
    /// Read the identity headers set by the session proxy
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for malformed or conflicting identity headers
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let header = |name: &str| -> AppResult<Option<String>> {
            headers
                .get(name)
                .map(|value| {
                    value
                        .to_str()
                        .map(|text| text.trim().to_owned())
                        .map_err(|_| AppError::auth_invalid(format!("Header {name} is not valid text")))
                })
                .transpose()
        };

        let client = header(identity_headers::CLIENT)?.filter(|value| !value.is_empty());
        let staff = header(identity_headers::STAFF)?.filter(|value| !value.is_empty());

        match (client, staff) {
            (Some(_), Some(_)) => Err(AppError::auth_invalid(
                "A request cannot carry both client and staff identities",
            )),
            (Some(client), None) => Ok(Self::Client(ClientId::parse(client)?)),
            (None, Some(user_id)) => {
                let role = header(identity_headers::ROLE)?
                    .ok_or_else(|| AppError::auth_invalid("Staff identity is missing its role"))?
                    .parse()?;
                Ok(Self::Staff { user_id, role })
            }
            (None, None) => Ok(Self::Anonymous),
        }
    }

    /// Check that this session may act on `client_id`'s data
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` for anonymous sessions and `PermissionDenied`
    /// when a client targets someone else
    pub fn authorize_for(&self, client_id: &ClientId) -> AppResult<()> {
        match self {
            Self::Anonymous => Err(AppError::auth_required()),
            Self::Staff { .. } => Ok(()),
            Self::Client(own) if own == client_id => Ok(()),
            Self::Client(_) => Err(AppError::permission_denied(
                "Clients may only access their own habits",
            )),
        }
    }

    /// Identifier used in logs
    #[must_use]
    pub fn actor(&self) -> String {
        match self {
            Self::Anonymous => "anonymous".to_owned(),
            Self::Client(id) => format!("client:{id}"),
            Self::Staff { user_id, role } => format!("{role}:{user_id}"),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
