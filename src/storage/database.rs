// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded row store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `users_by_email`: email → user_id
//! - `refresh_tokens`: token → serialized RefreshTokenRecord
//! - `chirps`: chirp_id → serialized Chirp

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::{
    Chirp, DeleteChirpOutcome, RefreshTokenRecord, RowStore, StoreError, StoreResult, StoredUser,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary user table: user_id (hyphenated UUID) → StoredUser (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: email → user_id.
const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

/// Refresh tokens: token → RefreshTokenRecord (JSON bytes).
const REFRESH_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("refresh_tokens");

/// Chirps: chirp_id (hyphenated UUID) → Chirp (JSON bytes).
const CHIRPS: TableDefinition<&str, &[u8]> = TableDefinition::new("chirps");

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID row store.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
            let _ = write_txn.open_table(CHIRPS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn read_user(&self, id: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

impl RowStore for Database {
    // =========================================================================
    // Users
    // =========================================================================

    fn create_user(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;
        let id = user.id.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            if by_email.get(user.email.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!("user {}", user.email)));
            }
            by_email.insert(user.email.as_str(), id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<StoredUser>> {
        let id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(USERS_BY_EMAIL)?;
            match table.get(email)? {
                Some(v) => v.value().to_string(),
                None => return Ok(None),
            }
        };
        self.read_user(&id)
    }

    fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<StoredUser>> {
        self.read_user(&id.to_string())
    }

    // =========================================================================
    // Refresh tokens
    // =========================================================================

    fn create_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REFRESH_TOKENS)?;
            if table.get(record.token.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists("refresh token".to_string()));
            }
            table.insert(record.token.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REFRESH_TOKENS)?;
        match table.get(token)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn revoke_refresh_token(
        &self,
        token: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(REFRESH_TOKENS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = match table.get(token)? {
                Some(existing) => existing.value().to_vec(),
                None => return Ok(None),
            };

            let mut record: RefreshTokenRecord = serde_json::from_slice(&existing_bytes)?;
            record.revoked_at.get_or_insert(at);
            record.updated_at = at;

            let json = serde_json::to_vec(&record)?;
            table.insert(token, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    // =========================================================================
    // Chirps
    // =========================================================================

    fn create_chirp(&self, chirp: &Chirp) -> StoreResult<()> {
        let json = serde_json::to_vec(chirp)?;
        let id = chirp.id.to_string();

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHIRPS)?;
            if table.get(id.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(format!("chirp {id}")));
            }
            table.insert(id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_chirp(&self, id: Uuid) -> StoreResult<Option<Chirp>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHIRPS)?;
        match table.get(id.to_string().as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_chirps(&self, author: Option<Uuid>) -> StoreResult<Vec<Chirp>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHIRPS)?;

        let mut chirps = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let chirp: Chirp = serde_json::from_slice(entry.1.value())?;
            if author.is_none_or(|id| chirp.user_id == id) {
                chirps.push(chirp);
            }
        }

        // Keys are random UUIDs, so order by creation time
        chirps.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(chirps)
    }

    fn delete_chirp(&self, id: Uuid, user_id: Uuid) -> StoreResult<DeleteChirpOutcome> {
        let key = id.to_string();

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(CHIRPS)?;
            let existing_bytes = match table.get(key.as_str())? {
                Some(existing) => existing.value().to_vec(),
                None => return Ok(DeleteChirpOutcome::NotFound),
            };

            let chirp: Chirp = serde_json::from_slice(&existing_bytes)?;
            if chirp.user_id != user_id {
                return Ok(DeleteChirpOutcome::NotAuthor);
            }
            table.remove(key.as_str())?;
            DeleteChirpOutcome::Deleted
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    fn reset(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(USERS)?;
        write_txn.delete_table(USERS_BY_EMAIL)?;
        write_txn.delete_table(REFRESH_TOKENS)?;
        write_txn.delete_table(CHIRPS)?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
            let _ = write_txn.open_table(CHIRPS)?;
        }
        write_txn.commit()?;
        tracing::warn!("Row store reset: all users, refresh tokens and chirps removed");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
