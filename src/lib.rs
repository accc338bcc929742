// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chirpy - short message service
//!
//! Users register with email + password, log in to receive a short-lived
//! access token and a long-lived refresh token, and use the refresh token
//! to mint new access tokens until it expires or is revoked. Access tokens
//! authorize posting and deleting chirps.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password hashing, token issuance and validation, extractors
//! - `config` - Environment configuration
//! - `metrics` - Visit counter for the static file server
//! - `storage` - Row store trait and the redb implementation

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod state;
pub mod storage;
