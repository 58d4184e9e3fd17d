//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CACHE_DURATION, DEFAULT_QUOTA_BYTES, SESSION_CACHE_DURATION};
use crate::fetch::RetryPolicy;
use crate::models::DEFAULT_PAGE_LIMIT;

/// Where the collection cache keeps its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheBackend {
    /// In-memory TTL store
    #[default]
    Memory,
    /// Session storage, namespaced and serialized as JSON
    Session,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "session" => Ok(CacheBackend::Session),
            other => Err(format!("unknown cache backend: {other}")),
        }
    }
}

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream catalog API
    pub upstream_url: String,
    /// TTL in seconds for the in-memory stores
    pub cache_ttl: u64,
    /// TTL in seconds for the session-backed store
    pub session_cache_ttl: u64,
    /// Backend of the collection cache
    pub cache_backend: CacheBackend,
    /// Key prefix of the session-backed store
    pub session_namespace: String,
    /// Byte ceiling of session storage
    pub session_quota_bytes: usize,
    /// Page size when the caller gives none
    pub default_page_limit: u32,
    /// Retries after the first fetch attempt
    pub fetch_retries: u32,
    /// Delay between fetch attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Upstream request timeout in seconds
    pub request_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_URL` - Upstream base URL (default: https://dummyjson.com)
    /// - `CACHE_TTL` - In-memory TTL in seconds (default: 300)
    /// - `SESSION_CACHE_TTL` - Session TTL in seconds (default: 3600)
    /// - `CACHE_BACKEND` - `memory` or `session` (default: memory)
    /// - `SESSION_NAMESPACE` - Session key prefix (default: products)
    /// - `SESSION_QUOTA_BYTES` - Session storage ceiling (default: 5 MiB)
    /// - `DEFAULT_PAGE_LIMIT` - Page size (default: 10)
    /// - `FETCH_RETRIES` - Retries after the first attempt (default: 3)
    /// - `RETRY_DELAY_MS` - Delay between attempts (default: 1000)
    /// - `REQUEST_TIMEOUT` - Upstream timeout in seconds (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_url),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            session_cache_ttl: parse_var("SESSION_CACHE_TTL")
                .unwrap_or(defaults.session_cache_ttl),
            cache_backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.cache_backend),
            session_namespace: env::var("SESSION_NAMESPACE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.session_namespace),
            session_quota_bytes: parse_var("SESSION_QUOTA_BYTES")
                .unwrap_or(defaults.session_quota_bytes),
            default_page_limit: parse_var("DEFAULT_PAGE_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.default_page_limit),
            fetch_retries: parse_var("FETCH_RETRIES").unwrap_or(defaults.fetch_retries),
            retry_delay_ms: parse_var("RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
            request_timeout: parse_var("REQUEST_TIMEOUT").unwrap_or(defaults.request_timeout),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn session_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.session_cache_ttl)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.fetch_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: "https://dummyjson.com".to_string(),
            cache_ttl: CACHE_DURATION.as_secs(),
            session_cache_ttl: SESSION_CACHE_DURATION.as_secs(),
            cache_backend: CacheBackend::Memory,
            session_namespace: "products".to_string(),
            session_quota_bytes: DEFAULT_QUOTA_BYTES,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            fetch_retries: 3,
            retry_delay_ms: 1000,
            request_timeout: 10,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
