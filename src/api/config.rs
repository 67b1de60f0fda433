//! Client configuration
//!
//! Loaded from the environment (after `.env`), with defaults for anything
//! missing or unparsable.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Fixed-delay retry for idempotent reads.
///
/// Disabled by default: without configuration no request is ever retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::from_millis(1000),
        }
    }

    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Per-request timeout, enforced by the HTTP client
    pub timeout: Duration,

    /// How long a successful query result counts as fresh.
    /// Zero means every new query refetches unless one is already in flight.
    pub stale_time: Duration,

    pub retry: RetryPolicy,

    /// File holding the persisted access token, if any
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            stale_time: Duration::ZERO,
            retry: RetryPolicy::disabled(),
            token_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse_u64 = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());
        let defaults = Self::default();

        let base_url = lookup("API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let retry = RetryPolicy {
            max_retries: lookup("API_MAX_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.retry.max_retries),
            delay: parse_u64("API_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry.delay),
        };

        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout: parse_u64("API_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            stale_time: parse_u64("API_STALE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stale_time),
            retry,
            token_file: lookup("API_TOKEN_FILE")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
