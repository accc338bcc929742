// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless access tokens (HS256 JWT).
//!
//! ## Claims
//!
//! | Claim | Value |
//! |-------|-------|
//! | `sub` | user id (hyphenated UUID) |
//! | `iss` | [`ISSUER`] |
//! | `iat` | issue time, Unix seconds |
//! | `exp` | `iat + ttl`, Unix seconds |
//!
//! Access tokens are never persisted and there is no revocation list: a
//! token stays valid until `exp` even if the refresh token that produced it
//! is revoked. The short TTL is the only mitigation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer tag written into and required from every token.
pub const ISSUER: &str = "chirpy";

/// Default access token lifetime (1 hour).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Registered claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Why an access token was rejected.
///
/// Everything except `Signing` collapses to "unauthorized" for clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token issuer is invalid")]
    InvalidIssuer,
    #[error("token has expired")]
    Expired,
    #[error("token subject is not a valid user id")]
    InvalidSubject,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and validates access tokens under one signing secret.
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AccessTokenCodec {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`, valid from now for the configured TTL.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate a token and return its subject.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// A token is accepted only while `now < exp`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| TokenError::InvalidSubject)
    }

    /// Verify signature and issuer. Expiry is checked by the caller against
    /// an explicit clock, so the library's own clock check is disabled.
    fn decode_claims(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    fn codec(secret: &str) -> AccessTokenCodec {
        AccessTokenCodec::new(
            &SecretString::from(secret.to_string()),
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        )
    }

    #[test]
    fn issued_token_validates_to_subject() {
        let codec = codec("test-secret");
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id).unwrap();
        assert_eq!(codec.validate(&token), Ok(user_id));
    }

    #[test]
    fn token_is_valid_until_just_before_expiry() {
        let codec = codec("test-secret");
        let user_id = Uuid::new_v4();
        let issued = Utc::now();
        let token = codec.issue_at(user_id, issued).unwrap();

        let last_valid = issued + codec.ttl() - Duration::seconds(1);
        assert_eq!(codec.validate_at(&token, last_valid), Ok(user_id));

        let expiry = issued + codec.ttl();
        assert_eq!(codec.validate_at(&token, expiry), Err(TokenError::Expired));
        assert_eq!(
            codec.validate_at(&token, expiry + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn token_issued_an_hour_ago_is_expired_now() {
        let codec = codec("test-secret");
        let token = codec
            .issue_at(Uuid::new_v4(), Utc::now() - Duration::seconds(3601))
            .unwrap();
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn expiry_overflow_is_an_error_not_a_panic() {
        let codec = AccessTokenCodec::new(&SecretString::from("s".to_string()), Duration::MAX);
        assert!(matches!(
            codec.issue(Uuid::new_v4()),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn other_secret_fails_signature() {
        let token = codec("secret-one").issue(Uuid::new_v4()).unwrap();
        assert_eq!(
            codec("secret-two").validate(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec("test-secret");
        assert_eq!(codec.validate("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(codec.validate(""), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let codec = codec("test-secret");
        let token = codec.issue(Uuid::new_v4()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();

        let forged_claims = format!(
            r#"{{"sub":"{}","iss":"chirpy","iat":{},"exp":{}}}"#,
            Uuid::new_v4(),
            Utc::now().timestamp(),
            Utc::now().timestamp() + 3600
        );
        let forged = URL_SAFE_NO_PAD.encode(forged_claims.as_bytes());
        parts[1] = &forged;

        assert_eq!(
            codec.validate(&parts.join(".")),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let secret = "test-secret";
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: Uuid::new_v4().to_string(),
            iss: "someone-else".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec(secret).validate(&token), Err(TokenError::InvalidIssuer));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let secret = "test-secret";
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: "user_123".to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec(secret).validate(&token), Err(TokenError::InvalidSubject));
    }

    #[test]
    fn claims_carry_issuer_and_ttl() {
        let codec = codec("test-secret");
        let issued = Utc::now();
        let token = codec.issue_at(Uuid::new_v4(), issued).unwrap();
        let claims = codec.decode_claims(&token).unwrap();

        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.iat, issued.timestamp());
        assert_eq!(claims.exp - claims.iat, DEFAULT_ACCESS_TOKEN_TTL_SECS);
    }
}
