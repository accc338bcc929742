// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. All types derive
//! `ToSchema` for OpenAPI documentation.
//!
//! Stored records never leave the server directly: [`UserResponse`] is the
//! public projection of a user and omits the password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::storage::{Chirp, StoredUser};

// =============================================================================
// Requests
// =============================================================================

/// Request body for account registration.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Request body for password login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for posting a chirp. The author comes from the access token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateChirpRequest {
    /// At most 140 characters.
    pub body: String,
}

/// Query string for listing chirps.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListChirpsQuery {
    /// Only return chirps by this user.
    pub author_id: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            body: chirp.body,
            user_id: chirp.user_id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
        }
    }
}

/// Successful login: the user plus both session tokens.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Access token (JWT), sent as `Authorization: Bearer <token>`.
    pub token: String,
    /// Refresh token, used with `/api/refresh` and `/api/revoke`.
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    pub message: String,
}
