use std::str::FromStr;

use axum::http::HeaderValue;
use chrono::Duration;
use folio_core::locking::{
    LockPolicy, LockPolicyError, DEFAULT_LOCK_REFRESH_INTERVAL_SECS, DEFAULT_LOCK_TTL_SECS,
};

/// A configuration value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}='{value}' is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Lock TTL and advisory refresh cadence.
    pub lock_policy: LockPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                    |
    /// | `LOCK_TTL_SECS`              | `7200`                  |
    /// | `LOCK_REFRESH_INTERVAL_SECS` | `1800`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = parse_var("PORT", 3000u16)?;

        let raw_origins =
            std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into());
        let cors_origins = parse_origins(&raw_origins)?;

        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 30u64)?;
        let shutdown_timeout_secs = parse_var("SHUTDOWN_TIMEOUT_SECS", 30u64)?;

        let ttl_secs = parse_var("LOCK_TTL_SECS", DEFAULT_LOCK_TTL_SECS)?;
        let refresh_secs = parse_var(
            "LOCK_REFRESH_INTERVAL_SECS",
            DEFAULT_LOCK_REFRESH_INTERVAL_SECS,
        )?;
        let lock_policy = lock_policy(ttl_secs, refresh_secs)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            lock_policy,
        })
    }
}

/// Read `var`, falling back to `default` when unset.
fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            })
        }
        Err(_) => Ok(default),
    }
}

/// Build the lock policy, attributing a failure to the variable that caused it.
fn lock_policy(ttl_secs: i64, refresh_secs: i64) -> Result<LockPolicy, ConfigError> {
    const TTL_VAR: &str = "LOCK_TTL_SECS";
    const REFRESH_VAR: &str = "LOCK_REFRESH_INTERVAL_SECS";

    let ttl = seconds(TTL_VAR, ttl_secs)?;
    let refresh_interval = seconds(REFRESH_VAR, refresh_secs)?;

    LockPolicy::new(ttl, refresh_interval).map_err(|err| {
        let (var, value) = match err {
            LockPolicyError::TtlOutOfRange { .. } => (TTL_VAR, ttl_secs),
            LockPolicyError::NonPositiveRefreshInterval(_)
            | LockPolicyError::RefreshNotShorterThanTtl { .. } => (REFRESH_VAR, refresh_secs),
        };
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: err.to_string(),
        }
    })
}

fn seconds(var: &'static str, secs: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(secs).ok_or_else(|| ConfigError::Invalid {
        var,
        value: secs.to_string(),
        reason: "out of range".into(),
    })
}

/// Split a comma-separated origin list, rejecting values that cannot be
/// sent as a header.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map(|_| origin.to_string())
                .map_err(|e| ConfigError::Invalid {
                    var: "CORS_ORIGINS",
                    value: origin.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        let origins = parse_origins(" http://a.test , ,http://b.test").unwrap();
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn origin_with_control_character_is_rejected() {
        assert!(parse_origins("http://a.test\n").is_ok());
        assert!(parse_origins("http://bad\u{7f}.test").is_err());
    }

    #[test]
    fn unset_variable_uses_default() {
        let value = parse_var("FOLIO_TEST_SURELY_UNSET_VARIABLE", 42u64).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn default_lock_settings_build_a_policy() {
        let policy = lock_policy(DEFAULT_LOCK_TTL_SECS, DEFAULT_LOCK_REFRESH_INTERVAL_SECS).unwrap();
        assert_eq!(policy, LockPolicy::default());
    }

    #[test]
    fn unrepresentable_ttl_is_a_config_error() {
        let err = lock_policy(9_223_372_036_854_776, DEFAULT_LOCK_REFRESH_INTERVAL_SECS)
            .unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid { var: "LOCK_TTL_SECS", ref value, .. }
                if value == "9223372036854776"
        );
    }

    #[test]
    fn ttl_above_maximum_is_a_config_error() {
        let err = lock_policy(10_000_000_000_000, DEFAULT_LOCK_REFRESH_INTERVAL_SECS).unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "LOCK_TTL_SECS", .. });
    }

    #[test]
    fn non_positive_ttl_names_the_ttl_variable() {
        let err = lock_policy(0, DEFAULT_LOCK_REFRESH_INTERVAL_SECS).unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid { var: "LOCK_TTL_SECS", ref value, .. } if value == "0"
        );
    }

    #[test]
    fn refresh_not_shorter_than_ttl_names_the_refresh_variable() {
        let err = lock_policy(600, 600).unwrap_err();
        assert_matches!(
            err,
            ConfigError::Invalid { var: "LOCK_REFRESH_INTERVAL_SECS", ref value, .. }
                if value == "600"
        );
    }
}
