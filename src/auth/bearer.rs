// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization header parsing.
//!
//! Two schemes share one contract:
//!
//! - `Authorization: Bearer <token>` for user session tokens
//! - `Authorization: ApiKey <key>` for service-to-service calls
//!
//! The value must start with the scheme and a single space. The credential
//! is the second whitespace-delimited segment; anything after it is ignored.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Scheme prefix for session tokens.
pub const BEARER_SCHEME: &str = "Bearer ";

/// Scheme prefix for service API keys.
pub const API_KEY_SCHEME: &str = "ApiKey ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("authorization header is missing")]
    Missing,
    #[error("authorization header must have the form '{scheme}<credential>'")]
    Malformed { scheme: &'static str },
}

/// Extract a bearer token from the `Authorization` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_with_scheme(headers, BEARER_SCHEME)
}

/// Extract a service API key from the `Authorization` header.
pub fn extract_api_key(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_with_scheme(headers, API_KEY_SCHEME)
}

fn extract_with_scheme<'h>(
    headers: &'h HeaderMap,
    scheme: &'static str,
) -> Result<&'h str, CredentialError> {
    let malformed = CredentialError::Malformed { scheme };

    let value = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialError::Missing)?
        .to_str()
        .map_err(|_| malformed.clone())?;

    if !value.starts_with(scheme) {
        return Err(malformed);
    }

    value.split_whitespace().nth(1).ok_or(malformed)
}
