// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Row Store
//!
//! Persistence for users, refresh tokens and chirps. Callers only talk to
//! the [`RowStore`] trait; [`Database`] is the embedded redb implementation
//! used by the server.
//!
//! ## Isolation
//!
//! redb serialises write transactions and hands readers a snapshot of the
//! last committed state. A revoke that commits before a concurrent lookup
//! is therefore always observed by that lookup.
//!
//! ## Blocking
//!
//! redb calls block the current thread. Async callers go through
//! [`StoreHandle::call`], which moves the call onto the blocking pool and
//! bounds it with a deadline.
//!
//! A deadline miss stops the wait, not the work: a blocking task cannot be
//! cancelled, so a write that times out may still commit afterwards. A
//! [`StoreError::Timeout`] therefore means "outcome unknown", never "not
//! applied". Every write here is safe to retry (revoke keeps the first
//! `revoked_at`; inserts reject duplicates).

pub mod database;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use database::Database;

// =============================================================================
// Records
// =============================================================================

/// A registered user as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub id: Uuid,
    pub email: String,
    /// PHC-format password hash. Never the plaintext.
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build a new user row with a fresh id.
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A persisted refresh token row.
///
/// Rows are soft-revoked by setting `revoked_at`; they are never deleted by
/// normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// A short message posted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    /// Author, taken from the access token that created the chirp.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chirp {
    pub fn new(body: impl Into<String>, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of an author-scoped delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteChirpOutcome {
    Deleted,
    NotFound,
    NotAuthor,
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("store call `{0}` exceeded its deadline")]
    Timeout(&'static str),

    #[error("store task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// RowStore
// =============================================================================

/// Queries the authentication subsystem needs from persistence.
pub trait RowStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::AlreadyExists`] when the email
    /// is taken.
    fn create_user(&self, user: &StoredUser) -> StoreResult<()>;

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>>;

    fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<StoredUser>>;

    /// Insert a refresh token row. The token string is the primary key, so a
    /// duplicate fails with [`StoreError::AlreadyExists`].
    fn create_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()>;

    fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Mark a token revoked at `at`. Returns the updated row, or `None` when
    /// no row matches. An already revoked row keeps its first `revoked_at`.
    fn revoke_refresh_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshTokenRecord>>;

    fn create_chirp(&self, chirp: &Chirp) -> StoreResult<()>;

    fn get_chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>>;

    /// All chirps, oldest first, optionally only those by `author`.
    fn list_chirps(&self, author: Option<Uuid>) -> StoreResult<Vec<Chirp>>;

    /// Delete chirp `id` if `user_id` wrote it. The ownership check and the
    /// delete happen in one transaction.
    fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> StoreResult<DeleteChirpOutcome>;

    /// Remove every user, refresh token and chirp.
    fn reset(&self) -> StoreResult<()>;
}

/// Shared, async-friendly access to a [`RowStore`].
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn RowStore>,
    timeout: Duration,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn RowStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Run a store operation on the blocking pool, bounded by the deadline.
    ///
    /// `op` names the call in the timeout error.
    pub async fn call<T, F>(&self, op: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RowStore) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(StoreError::Task(join_err.to_string())),
            Err(_) => Err(StoreError::Timeout(op)),
        }
    }
}
