// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{AccessTokenCodec, RefreshTokenStore, SessionService};
use crate::config::AppConfig;
use crate::metrics::HitCounter;
use crate::storage::{Database, RowStore, StoreHandle, StoreResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionService>,
    /// Row store for handlers outside the session flow (users, chirps).
    pub store: StoreHandle,
    pub hits: Arc<HitCounter>,
}

impl AppState {
    /// Wire the session service on top of an existing row store.
    pub fn new(config: AppConfig, store: Arc<dyn RowStore>) -> Self {
        let handle = StoreHandle::new(store, config.store_timeout);
        let access_tokens = AccessTokenCodec::new(&config.jwt_secret, config.access_token_ttl);
        let refresh_tokens = RefreshTokenStore::new(handle.clone(), config.refresh_token_ttl);

        Self {
            sessions: Arc::new(SessionService::new(
                handle.clone(),
                access_tokens,
                refresh_tokens,
            )),
            store: handle,
            hits: Arc::new(HitCounter::default()),
            config: Arc::new(config),
        }
    }

    /// Open the redb database named in `config` and build the state.
    pub fn open(config: AppConfig) -> StoreResult<Self> {
        let db = Database::open(&config.database_path)?;
        Ok(Self::new(config, Arc::new(db)))
    }
}
