// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and passed
//! down explicitly. Core logic never reads the environment itself.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret for access tokens | Required, non-empty |
//! | `DATABASE_PATH` | redb database file | `data/chirpy.redb` |
//! | `STATIC_DIR` | Directory served under `/app` | `.` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `PLATFORM` | `dev` enables `/admin/reset` | `prod` |
//! | `API_KEY` | Key for `Authorization: ApiKey` calls | Unset |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token lifetime, at most 7 days | `3600` |
//! | `REFRESH_TOKEN_TTL_DAYS` | Refresh token lifetime, at most 3650 | `60` |
//! | `STORE_TIMEOUT_MS` | Deadline for each store call, non-zero | `5000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::Duration;
use secrecy::SecretString;

use crate::auth::access_token::DEFAULT_ACCESS_TOKEN_TTL_SECS;
use crate::auth::refresh_token::DEFAULT_REFRESH_TOKEN_TTL_DAYS;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const STATIC_DIR_ENV: &str = "STATIC_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PLATFORM_ENV: &str = "PLATFORM";
pub const API_KEY_ENV: &str = "API_KEY";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_DAYS";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATABASE_PATH: &str = "data/chirpy.redb";
pub const DEFAULT_STATIC_DIR: &str = ".";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Upper bound for `ACCESS_TOKEN_TTL_SECS` (7 days).
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;
/// Upper bound for `REFRESH_TOKEN_TTL_DAYS` (10 years).
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Deployment platform. Only `Dev` allows destructive admin calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Process-wide configuration, loaded once at startup.
#[derive(Debug)]
pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub platform: Platform,
    pub api_key: Option<SecretString>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub store_timeout: StdDuration,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(JWT_SECRET_ENV).ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Empty(JWT_SECRET_ENV));
        }

        let platform = match lookup(PLATFORM_ENV) {
            Some(p) if p.eq_ignore_ascii_case("dev") => Platform::Dev,
            _ => Platform::Prod,
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let api_key = lookup(API_KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let access_ttl_secs: i64 =
            parse_or(&lookup, ACCESS_TOKEN_TTL_ENV, DEFAULT_ACCESS_TOKEN_TTL_SECS)?;
        let refresh_ttl_days: i64 =
            parse_or(&lookup, REFRESH_TOKEN_TTL_ENV, DEFAULT_REFRESH_TOKEN_TTL_DAYS)?;
        let store_timeout_ms: u64 = parse_or(&lookup, STORE_TIMEOUT_ENV, DEFAULT_STORE_TIMEOUT_MS)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                name: STORE_TIMEOUT_ENV,
                value: store_timeout_ms.to_string(),
            });
        }

        Ok(Self {
            jwt_secret: SecretString::from(jwt_secret),
            database_path: lookup(DATABASE_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            static_dir: lookup(STATIC_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?,
            platform,
            api_key,
            access_token_ttl: ttl(
                ACCESS_TOKEN_TTL_ENV,
                access_ttl_secs,
                MAX_ACCESS_TOKEN_TTL_SECS,
                Duration::try_seconds,
            )?,
            refresh_token_ttl: ttl(
                REFRESH_TOKEN_TTL_ENV,
                refresh_ttl_days,
                MAX_REFRESH_TOKEN_TTL_DAYS,
                Duration::try_days,
            )?,
            store_timeout: StdDuration::from_millis(store_timeout_ms),
            log_format,
        })
    }

    /// Fixed configuration for tests, storing data under `dir`.
    pub fn for_tests(dir: &Path) -> Self {
        Self {
            jwt_secret: SecretString::from("test-secret".to_string()),
            database_path: dir.join("chirpy-test.redb"),
            static_dir: dir.to_path_buf(),
            host: "127.0.0.1".to_string(),
            port: 0,
            platform: Platform::Dev,
            api_key: None,
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            store_timeout: StdDuration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            log_format: LogFormat::Pretty,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}

/// Convert a TTL in whole units, accepting only `1..=max`.
fn ttl(
    name: &'static str,
    value: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    (1..=max)
        .contains(&value)
        .then(|| to_duration(value))
        .flatten()
        .ok_or_else(|| ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn missing_secret_is_fatal() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing(JWT_SECRET_ENV));
    }

    #[test]
    fn empty_secret_is_fatal() {
        assert_eq!(
            load(&[(JWT_SECRET_ENV, "   ")]).unwrap_err(),
            ConfigError::Empty(JWT_SECRET_ENV)
        );
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(JWT_SECRET_ENV, "s")]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.platform, Platform::Prod);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.api_key.is_none());
        assert_eq!(config.access_token_ttl, Duration::hours(1));
        assert_eq!(config.refresh_token_ttl, Duration::days(60));
        assert_eq!(config.store_timeout, StdDuration::from_secs(5));
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.static_dir, PathBuf::from("."));
    }

    #[test]
    fn overrides_apply() {
        let config = load(&[
            (JWT_SECRET_ENV, "s"),
            (PLATFORM_ENV, "DEV"),
            (LOG_FORMAT_ENV, "json"),
            (API_KEY_ENV, "key"),
            (PORT_ENV, "9000"),
            (ACCESS_TOKEN_TTL_ENV, "60"),
            (REFRESH_TOKEN_TTL_ENV, "7"),
            (STORE_TIMEOUT_ENV, "250"),
        ])
        .unwrap();
        assert_eq!(config.platform, Platform::Dev);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "key");
        assert_eq!(config.port, 9000);
        assert_eq!(config.access_token_ttl, Duration::seconds(60));
        assert_eq!(config.refresh_token_ttl, Duration::days(7));
        assert_eq!(config.store_timeout, StdDuration::from_millis(250));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "s"), (PORT_ENV, "eighty")]),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(JWT_SECRET_ENV, "s"), (ACCESS_TOKEN_TTL_ENV, "0")]),
            Err(ConfigError::Invalid { name: ACCESS_TOKEN_TTL_ENV, .. })
        ));
    }

    #[test]
    fn ttls_outside_their_range_are_rejected() {
        for (name, value) in [
            (ACCESS_TOKEN_TTL_ENV, "9223372036854775807"),
            (ACCESS_TOKEN_TTL_ENV, "604801"),
            (ACCESS_TOKEN_TTL_ENV, "-5"),
            (REFRESH_TOKEN_TTL_ENV, "100000000"),
            (REFRESH_TOKEN_TTL_ENV, "3651"),
            (STORE_TIMEOUT_ENV, "0"),
        ] {
            assert!(
                matches!(
                    load(&[(JWT_SECRET_ENV, "s"), (name, value)]),
                    Err(ConfigError::Invalid { name: n, .. }) if n == name
                ),
                "{name}={value} should be rejected"
            );
        }
    }

    #[test]
    fn ttls_at_their_limits_are_accepted() {
        let config = load(&[
            (JWT_SECRET_ENV, "s"),
            (ACCESS_TOKEN_TTL_ENV, "604800"),
            (REFRESH_TOKEN_TTL_ENV, "3650"),
        ])
        .unwrap();
        assert_eq!(config.access_token_ttl, Duration::days(7));
        assert_eq!(config.refresh_token_ttl, Duration::days(3650));
    }

    #[test]
    fn secret_is_redacted_in_debug_output() {
        let config = load(&[(JWT_SECRET_ENV, "super-secret-value")]).unwrap();
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
