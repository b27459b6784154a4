//! Process configuration, read once from environment variables.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `BIND_ADDR` | `0.0.0.0:8080` | listen address |
//! | `DATABASE_URL` | unset | Postgres URL; unset selects the in-memory store |
//! | `MUTATION_MAX_ATTEMPTS` | `5` | attempts per mutation on revision conflicts |
//! | `MUTATION_RETRY_BACKOFF_MS` | `10` | linear backoff step between attempts |
//! | `REFRESH_MODE` | `incremental` | `incremental` or `full` listing refresh |
//! | `NOTICE_DISMISS_MS` | `6000` | how long clients should show notices |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use stockpile_infra::{MutatorConfig, RefreshMode, RetryPolicy};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub mutator: MutatorConfig,
    pub notice_dismiss: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            mutator: MutatorConfig::default(),
            notice_dismiss: Duration::from_millis(6000),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => parse(&v, "BIND_ADDR")?,
            None => defaults.bind_addr,
        };

        let max_attempts = match get("MUTATION_MAX_ATTEMPTS") {
            Some(v) => parse::<u32>(&v, "MUTATION_MAX_ATTEMPTS")?,
            None => defaults.mutator.retry.max_attempts(),
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "MUTATION_MAX_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }

        let backoff = match get("MUTATION_RETRY_BACKOFF_MS") {
            Some(v) => Duration::from_millis(parse(&v, "MUTATION_RETRY_BACKOFF_MS")?),
            None => Duration::from_millis(10),
        };

        let refresh = match get("REFRESH_MODE") {
            Some(v) => v
                .parse::<RefreshMode>()
                .map_err(|reason| ConfigError::Invalid { var: "REFRESH_MODE", reason })?,
            None => defaults.mutator.refresh,
        };

        let notice_dismiss = match get("NOTICE_DISMISS_MS") {
            Some(v) => Duration::from_millis(parse(&v, "NOTICE_DISMISS_MS")?),
            None => defaults.notice_dismiss,
        };

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL"),
            mutator: MutatorConfig {
                retry: RetryPolicy::new(max_attempts, backoff),
                refresh,
            },
            notice_dismiss,
        })
    }
}

fn parse<T>(value: &str, var: &'static str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert!(config.database_url.is_none());
        assert_eq!(config.mutator.refresh, RefreshMode::Incremental);
    }

    #[test]
    fn reads_every_variable() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/stockpile"),
            ("MUTATION_MAX_ATTEMPTS", "3"),
            ("MUTATION_RETRY_BACKOFF_MS", "0"),
            ("REFRESH_MODE", "full"),
            ("NOTICE_DISMISS_MS", "1500"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/stockpile"));
        assert_eq!(config.mutator.retry, RetryPolicy::new(3, Duration::ZERO));
        assert_eq!(config.mutator.refresh, RefreshMode::Full);
        assert_eq!(config.notice_dismiss, Duration::from_millis(1500));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = ApiConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn invalid_values_are_reported_by_variable() {
        let err = ApiConfig::from_lookup(lookup(&[("MUTATION_MAX_ATTEMPTS", "zero")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MUTATION_MAX_ATTEMPTS", .. }));

        let err = ApiConfig::from_lookup(lookup(&[("MUTATION_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "MUTATION_MAX_ATTEMPTS", .. }));

        let err = ApiConfig::from_lookup(lookup(&[("REFRESH_MODE", "lazy")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "REFRESH_MODE", .. }));
    }
}
