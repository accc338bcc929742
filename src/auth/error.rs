// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Variants keep the precise internal cause for tests and logs. The HTTP
//! response collapses them: every token failure is a plain 401
//! `unauthorized`, and infrastructure failures are a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::access_token::TokenError;
use super::bearer::CredentialError;
use super::password::PasswordError;
use super::refresh_token::RefreshTokenError;
use crate::storage::StoreError;

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("authorization header is required")]
    MissingCredential,
    /// Authorization header does not match the expected scheme
    #[error("invalid authorization header: {0}")]
    MalformedCredential(CredentialError),
    /// Unknown email or wrong password
    #[error("incorrect email or password")]
    IncorrectCredentials,
    /// Access token rejected
    #[error("invalid access token: {0}")]
    InvalidToken(TokenError),
    /// Service API key does not match the configured key
    #[error("service API key is invalid")]
    InvalidApiKey,
    /// Refresh token unknown, expired or revoked
    #[error("refresh token rejected: {0}")]
    RefreshToken(RefreshTokenError),
    /// Request payload failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),
    /// Row store failure or timeout
    #[error("storage failure: {0}")]
    Storage(StoreError),
    /// Password hashing failure or corrupt stored hash
    #[error("password hashing failure: {0}")]
    Hashing(PasswordError),
    /// Access token could not be signed
    #[error("token signing failure: {0}")]
    Signing(String),
    /// CSPRNG failure while minting a refresh token
    #[error("entropy source failure")]
    Entropy,
    /// Token expiry does not fit the clock range
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    /// Background task panicked or was cancelled
    #[error("internal task failure: {0}")]
    Task(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the client-facing error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_auth_header",
            AuthError::MalformedCredential(_) => "invalid_auth_header",
            AuthError::IncorrectCredentials => "incorrect_credentials",
            AuthError::InvalidToken(_) | AuthError::InvalidApiKey | AuthError::RefreshToken(_) => {
                "unauthorized"
            }
            AuthError::InvalidInput(_) => "invalid_input",
            AuthError::Conflict(_) => "conflict",
            AuthError::Storage(_)
            | AuthError::Hashing(_)
            | AuthError::Signing(_)
            | AuthError::Entropy
            | AuthError::ExpiryOutOfRange
            | AuthError::Task(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential(_)
            | AuthError::IncorrectCredentials
            | AuthError::InvalidToken(_)
            | AuthError::InvalidApiKey
            | AuthError::RefreshToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Storage(_)
            | AuthError::Hashing(_)
            | AuthError::Signing(_)
            | AuthError::Entropy
            | AuthError::ExpiryOutOfRange
            | AuthError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client.
    ///
    /// Never says whether an email exists, why a token was rejected, or
    /// anything about hashes and signatures.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::MissingCredential => "Authorization header is required".to_string(),
            AuthError::MalformedCredential(e) => e.to_string(),
            AuthError::IncorrectCredentials => "Incorrect email or password".to_string(),
            AuthError::InvalidToken(_) | AuthError::InvalidApiKey | AuthError::RefreshToken(_) => {
                "Unauthorized".to_string()
            }
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::Conflict(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::Missing => AuthError::MissingCredential,
            malformed @ CredentialError::Malformed { .. } => AuthError::MalformedCredential(malformed),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(msg) => AuthError::Signing(msg),
            other => AuthError::InvalidToken(other),
        }
    }
}

impl From<RefreshTokenError> for AuthError {
    fn from(e: RefreshTokenError) -> Self {
        match e {
            RefreshTokenError::Storage(store) => AuthError::Storage(store),
            RefreshTokenError::Entropy => AuthError::Entropy,
            RefreshTokenError::ExpiryOutOfRange => AuthError::ExpiryOutOfRange,
            lifecycle => AuthError::RefreshToken(lifecycle),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        AuthError::Hashing(e)
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Storage(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication request failed");
        } else {
            tracing::debug!(error = %self, "Authentication rejected");
        }

        let body = Json(AuthErrorBody {
            error: self.client_message(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
