// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Opaque, persisted, revocable refresh tokens.
//!
//! A refresh token is 32 bytes from the system CSPRNG, hex-encoded to 64
//! characters. The token string itself is the row key. Collisions are not
//! checked here; the store rejects duplicate keys.
//!
//! Lifecycle: issued at login, looked up and validated on refresh,
//! soft-revoked on logout. A token is usable only while it is not revoked
//! and `now < expires_at`.

use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use uuid::Uuid;

use crate::storage::{RefreshTokenRecord, StoreError, StoreHandle};

/// Bytes of entropy per token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Default refresh token lifetime (60 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token has expired")]
    Expired,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("system random number generator failed")]
    Entropy,
    #[error("refresh token expiry is out of range")]
    ExpiryOutOfRange,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Generate a fresh hex-encoded refresh token.
pub fn generate_token(rng: &SystemRandom) -> Result<String, RefreshTokenError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| RefreshTokenError::Entropy)?;
    Ok(hex::encode(bytes))
}

/// Check that a looked-up token is still usable at `now`.
///
/// Revocation is checked before expiry.
pub fn validate_active_at(
    record: &RefreshTokenRecord,
    now: DateTime<Utc>,
) -> Result<Uuid, RefreshTokenError> {
    if record.revoked_at.is_some() {
        return Err(RefreshTokenError::Revoked);
    }
    if now >= record.expires_at {
        return Err(RefreshTokenError::Expired);
    }
    Ok(record.user_id)
}

/// Refresh token lifecycle on top of the row store.
#[derive(Clone)]
pub struct RefreshTokenStore {
    store: StoreHandle,
    ttl: Duration,
    rng: SystemRandom,
}

impl RefreshTokenStore {
    pub fn new(store: StoreHandle, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Mint and persist a new token for `user_id`.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, RefreshTokenError> {
        let token = generate_token(&self.rng)?;
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(RefreshTokenError::ExpiryOutOfRange)?;
        let record = RefreshTokenRecord {
            token: token.clone(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };

        self.store
            .call("create_refresh_token", move |s| s.create_refresh_token(&record))
            .await?;

        tracing::debug!(user_id = %user_id, "Refresh token issued");
        Ok(token)
    }

    /// Fetch the row for `token` by exact match.
    pub async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let token = token.to_string();
        self.store
            .call("get_refresh_token", move |s| s.get_refresh_token(&token))
            .await?
            .ok_or(RefreshTokenError::NotFound)
    }

    /// Check that `record` is usable right now.
    pub fn validate_active(&self, record: &RefreshTokenRecord) -> Result<Uuid, RefreshTokenError> {
        validate_active_at(record, Utc::now())
    }

    /// Soft-revoke `token`. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let token = token.to_string();
        let record = self
            .store
            .call("revoke_refresh_token", move |s| {
                s.revoke_refresh_token(&token, Utc::now())
            })
            .await
            .inspect_err(|e| {
                if matches!(e, StoreError::Timeout(_)) {
                    tracing::warn!("Refresh token revoke timed out; it may still commit");
                }
            })?
            .ok_or(RefreshTokenError::NotFound)?;

        tracing::info!(user_id = %record.user_id, "Refresh token revoked");
        Ok(())
    }
}
