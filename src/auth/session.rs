// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session orchestration: registration, login, refresh, revoke and
//! protected-access checks.
//!
//! ```text
//! Anonymous --login--> Authenticated --refresh--> Refreshed
//!                           |                        |
//!                           +--------revoke----------+--> Revoked
//! ```
//!
//! Login is the only place a refresh token is minted. Refresh never rotates
//! the refresh token; the same token stays valid until it expires or is
//! revoked.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::access_token::AccessTokenCodec;
use super::bearer::extract_bearer;
use super::error::AuthError;
use super::password::{hash_password, verify_password_or_dummy};
use super::refresh_token::RefreshTokenStore;
use crate::storage::{StoreError, StoreHandle, StoredUser};

/// Tokens handed to a client after a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: StoredUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Entry point used by request handlers for every authentication flow.
#[derive(Clone)]
pub struct SessionService {
    store: StoreHandle,
    access_tokens: AccessTokenCodec,
    refresh_tokens: RefreshTokenStore,
}

impl SessionService {
    pub fn new(
        store: StoreHandle,
        access_tokens: AccessTokenCodec,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            store,
            access_tokens,
            refresh_tokens,
        }
    }

    pub fn access_tokens(&self) -> &AccessTokenCodec {
        &self.access_tokens
    }

    /// Create a user with a hashed password.
    pub async fn register(&self, email: &str, password: &str) -> Result<StoredUser, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput("missing email field".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("missing password field".to_string()));
        }

        let hashed = run_blocking({
            let password = password.to_string();
            move || hash_password(&password)
        })
        .await??;

        let user = StoredUser::new(email, hashed);
        let row = user.clone();
        self.store
            .call("create_user", move |s| s.create_user(&row))
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists(_) => {
                    AuthError::Conflict("email is already registered".to_string())
                }
                other => AuthError::Storage(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Verify email + password and mint an access/refresh token pair.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let lookup_email = email.trim().to_string();
        let user = self
            .store
            .call("get_user_by_email", move |s| s.get_user_by_email(&lookup_email))
            .await?;

        // Unknown emails still pay for one Argon2 run.
        let verified = run_blocking({
            let password = password.to_string();
            let stored = user.as_ref().map(|u| u.hashed_password.clone());
            move || verify_password_or_dummy(&password, stored.as_deref())
        })
        .await??;

        let user = match user {
            Some(user) if verified => user,
            Some(user) => {
                tracing::info!(user_id = %user.id, "Login rejected");
                return Err(AuthError::IncorrectCredentials);
            }
            None => {
                tracing::info!("Login rejected for unknown email");
                return Err(AuthError::IncorrectCredentials);
            }
        };

        let access_token = self.access_tokens.issue(user.id)?;
        let refresh_token = self.refresh_tokens.issue(user.id).await?;

        tracing::info!(user_id = %user.id, "Login succeeded");
        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange the bearer refresh token for a new access token.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = extract_bearer(headers)?;
        let record = self.refresh_tokens.lookup(token).await?;
        let user_id = self.refresh_tokens.validate_active(&record)?;

        let access_token = self.access_tokens.issue(user_id)?;
        tracing::debug!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the bearer refresh token.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = extract_bearer(headers)?;
        self.refresh_tokens.revoke(token).await?;
        Ok(())
    }

    /// Validate the bearer access token and return its user id.
    pub fn require_valid_access_token(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers)?;
        Ok(self.access_tokens.validate(token)?)
    }

    /// Remove all users, refresh tokens and chirps.
    pub async fn reset(&self) -> Result<(), AuthError> {
        self.store.call("reset", |s| s.reset()).await?;
        Ok(())
    }
}

/// Run CPU-heavy password work off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Task(e.to_string()))
}
