// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Password login with short-lived access tokens and long-lived refresh
//! tokens.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email + password (`POST /api/login`)
//! 2. Server verifies the Argon2id hash and returns:
//!    - `token`: HS256 JWT, valid for 1 hour
//!    - `refresh_token`: 64 hex chars, persisted, valid for 60 days
//! 3. Protected endpoints take `Authorization: Bearer <token>`
//! 4. `POST /api/refresh` with `Bearer <refresh_token>` mints a new access token
//! 5. `POST /api/revoke` with `Bearer <refresh_token>` ends the session
//!
//! ## Security
//!
//! - Plaintext passwords are never stored or logged
//! - Login failures never reveal whether the email exists
//! - Token failures (expired, forged, revoked, unknown) look identical to clients
//! - Access tokens cannot be revoked early; keep their TTL short

pub mod access_token;
pub mod bearer;
pub mod error;
pub mod extractor;
pub mod password;
pub mod refresh_token;
pub mod session;

pub use access_token::{AccessTokenCodec, TokenError};
pub use bearer::{extract_api_key, extract_bearer, CredentialError};
pub use error::AuthError;
pub use extractor::{Auth, AuthenticatedUser, ServiceKey};
pub use password::{hash_password, verify_password, PasswordError};
pub use refresh_token::{RefreshTokenError, RefreshTokenStore};
pub use session::{LoginOutcome, SessionService};
