// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require a valid access token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.user_id is the token subject
//! }
//! ```
//!
//! Service-to-service endpoints use `ServiceKey`, which checks an
//! `Authorization: ApiKey <key>` header against the configured key.

use axum::{extract::FromRequestParts, http::request::Parts};
use ring::{
    constant_time::verify_slices_are_equal,
    digest::{digest, SHA256},
};
use secrecy::ExposeSecret;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::bearer::extract_api_key;
use super::AuthError;
use crate::state::AppState;

/// Identity established from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extractor for authenticated users.
///
/// Rejects the request before the handler runs when the bearer token is
/// missing, malformed, forged or expired.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if an outer layer already authenticated the request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user_id = state.sessions.require_valid_access_token(&parts.headers)?;
        Ok(Auth(AuthenticatedUser { user_id }))
    }
}

/// Extractor for calls authenticated with the service API key.
///
/// When no key is configured the check is skipped.
pub struct ServiceKey;

impl FromRequestParts<AppState> for ServiceKey {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_key.as_ref() else {
            return Ok(ServiceKey);
        };

        let presented = extract_api_key(&parts.headers)?;
        if !api_key_matches(presented, expected.expose_secret()) {
            return Err(AuthError::InvalidApiKey);
        }

        Ok(ServiceKey)
    }
}

/// Constant-time key comparison over SHA-256 digests, so the configured
/// key's length does not show in timing either.
fn api_key_matches(presented: &str, expected: &str) -> bool {
    let presented = digest(&SHA256, presented.as_bytes());
    let expected = digest(&SHA256, expected.as_bytes());
    verify_slices_are_equal(presented.as_ref(), expected.as_ref()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::Request;
    use secrecy::SecretString;
    use tempfile::TempDir;

    fn create_test_state(api_key: Option<&str>) -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = AppConfig::for_tests(temp_dir.path());
        config.api_key = api_key.map(|k| SecretString::from(k.to_string()));
        let state = AppState::open(config).expect("Failed to open state");
        (state, temp_dir)
    }

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = create_test_state(None);
        let mut parts = parts_with_auth(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_issued_token() {
        let (state, _temp_dir) = create_test_state(None);
        let user_id = Uuid::new_v4();
        let token = state.sessions.access_tokens().issue(user_id).unwrap();
        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[tokio::test]
    async fn auth_extractor_rejects_forged_token() {
        let (state, _temp_dir) = create_test_state(None);
        let mut parts = parts_with_auth(Some("Bearer eyJhbGciOiJIUzI1NiJ9.e30.c2ln"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let (state, _temp_dir) = create_test_state(None);
        let mut parts = parts_with_auth(None);
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
        };
        parts.extensions.insert(user.clone());

        let Auth(found) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(found, user);
    }

    #[test]
    fn api_key_comparison_handles_any_length() {
        assert!(api_key_matches("s3cret", "s3cret"));
        assert!(!api_key_matches("s3cre", "s3cret"));
        assert!(!api_key_matches("s3cret-and-more", "s3cret"));
        assert!(!api_key_matches("", "s3cret"));
    }

    #[tokio::test]
    async fn service_key_is_open_when_unconfigured() {
        let (state, _temp_dir) = create_test_state(None);
        let mut parts = parts_with_auth(None);
        assert!(ServiceKey::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn service_key_checks_configured_key() {
        let (state, _temp_dir) = create_test_state(Some("s3cret"));

        let mut good = parts_with_auth(Some("ApiKey s3cret"));
        assert!(ServiceKey::from_request_parts(&mut good, &state).await.is_ok());

        let mut wrong = parts_with_auth(Some("ApiKey nope"));
        assert!(matches!(
            ServiceKey::from_request_parts(&mut wrong, &state).await,
            Err(AuthError::InvalidApiKey)
        ));

        let mut bearer = parts_with_auth(Some("Bearer s3cret"));
        assert!(matches!(
            ServiceKey::from_request_parts(&mut bearer, &state).await,
            Err(AuthError::MalformedCredential(_))
        ));

        let mut missing = parts_with_auth(None);
        assert!(matches!(
            ServiceKey::from_request_parts(&mut missing, &state).await,
            Err(AuthError::MissingCredential)
        ));
    }
}
