//! Application configuration.
//!
//! Everything is environment-driven; missing variables fall back to
//! defaults that work for local development (except the provider key,
//! which stays empty and is reported at startup).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::router::RouterOptions;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Groq API key. Empty means upstream calls will be rejected.
    pub groq_api_key: String,
    /// Override for the Groq endpoint (gateways, tests).
    pub groq_api_url: Option<String>,
    /// Response cache capacity in entries.
    pub cache_max_entries: usize,
    /// Response cache TTL in hours.
    pub cache_ttl_hours: u64,
    /// Per-model-call deadline in seconds.
    pub model_call_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".to_string(),
            groq_api_key: String::new(),
            groq_api_url: None,
            cache_max_entries: 1000,
            cache_ttl_hours: 24,
            model_call_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Build configuration from the environment:
    /// - `BIND_ADDR` - HTTP bind address (default `0.0.0.0:8001`)
    /// - `GROQ_API_KEY` - provider key
    /// - `GROQ_API_URL` - endpoint override
    /// - `CACHE_MAX_ENTRIES` - response cache capacity (default 1000)
    /// - `CACHE_TTL_HOURS` - response cache TTL (default 24)
    /// - `MODEL_CALL_TIMEOUT_SECS` - per-call deadline (default 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            groq_api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_api_url: std::env::var("GROQ_API_URL").ok(),
            cache_max_entries: env_parse("CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            cache_ttl_hours: env_parse("CACHE_TTL_HOURS", defaults.cache_ttl_hours),
            model_call_timeout_secs: env_parse(
                "MODEL_CALL_TIMEOUT_SECS",
                defaults.model_call_timeout_secs,
            ),
        };

        if config.groq_api_key.is_empty() {
            tracing::warn!("GROQ_API_KEY is not set, upstream model calls will fail");
        }
        config
    }

    /// Router tuning derived from this configuration.
    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            cache_max_entries: self.cache_max_entries,
            cache_ttl: Duration::from_secs(self.cache_ttl_hours * 60 * 60),
            call_timeout: Duration::from_secs(self.model_call_timeout_secs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8001");
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_ttl_hours, 24);
    }

    #[test]
    fn test_router_options_conversion() {
        let config = Config {
            cache_max_entries: 10,
            cache_ttl_hours: 1,
            model_call_timeout_secs: 5,
            ..Config::default()
        };
        let options = config.router_options();
        assert_eq!(options.cache_max_entries, 10);
        assert_eq!(options.cache_ttl, Duration::from_secs(3600));
        assert_eq!(options.call_timeout, Duration::from_secs(5));
    }
}
