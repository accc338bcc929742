// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and verification (Argon2id).
//!
//! Hashes are stored in PHC string format, which embeds the algorithm,
//! cost parameters and salt. Cost parameters are the `argon2` crate
//! defaults.

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use ring::rand::{SecureRandom, SystemRandom};

/// Salt length in bytes (the PHC recommended 16).
const SALT_BYTES: usize = 16;

/// Argon2id hash with the default cost parameters, verified against when a
/// login names an unknown email.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Y2hpcnB5LWR1bW15LXNsdA$VBoMrmrE8Cz+o0bPuBElwhpD8wqth36372ysP/OMLS4";

/// Password hashing failure.
///
/// A wrong password is not an error; see [`verify_password`].
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Hash derivation failed (RNG or allocation).
    #[error("failed to hash password: {0}")]
    Hashing(String),
    /// Stored hash is corrupt or uses an unsupported algorithm.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash a plaintext password with Argon2id and a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| PasswordError::Hashing("system random number generator failed".to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash
/// cannot be used at all.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
    }
}

/// Verify `plaintext` against the stored hash of a looked-up user.
///
/// With no user the plaintext is still run through Argon2 against
/// [`DUMMY_PASSWORD_HASH`], so an unknown email costs as much as a wrong
/// password. The result is then always `false`.
pub fn verify_password_or_dummy(
    plaintext: &str,
    stored_hash: Option<&str>,
) -> Result<bool, PasswordError> {
    match stored_hash {
        Some(hash) => verify_password(plaintext, hash),
        None => verify_password(plaintext, DUMMY_PASSWORD_HASH).map(|_| false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("pw123").unwrap();
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hash_is_argon2id_phc_and_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("same"));
        assert_ne!(a, b, "each hash gets its own salt");
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let result = verify_password("pw123", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn unsupported_algorithm_is_an_error() {
        let result = verify_password("pw123", "$md5$v=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNo");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }

    #[test]
    fn empty_password_round_trips() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).unwrap());
        assert!(!verify_password(" ", &hash).unwrap());
    }

    #[test]
    fn dummy_hash_is_a_real_default_cost_hash() {
        // A malformed dummy would fail fast and bring back the timing gap.
        assert!(verify_password("not-a-real-password", DUMMY_PASSWORD_HASH).unwrap());

        let fresh = hash_password("x").unwrap();
        let params = |h: &str| h.split('$').nth(3).map(str::to_string);
        assert_eq!(params(DUMMY_PASSWORD_HASH), params(&fresh));
    }

    #[test]
    fn unknown_user_runs_the_verifier_and_fails() {
        assert!(!verify_password_or_dummy("not-a-real-password", None).unwrap());
        assert!(!verify_password_or_dummy("pw123", None).unwrap());

        let hash = hash_password("pw123").unwrap();
        assert!(verify_password_or_dummy("pw123", Some(&hash)).unwrap());
    }
}
