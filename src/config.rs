//! Runtime configuration
//!
//! Base URLs for the remote services plus the cache/polling policy knobs.
//! A `Config` is built once at startup and handed to `AppState::new`; tests
//! point the base URLs at local mock servers.

use crate::error::{AppError, Result};
use std::time::Duration;
use url::Url;

/// Staleness windows per data class. A cache entry inside its window is
/// served without a refetch; outside it the entry is served stale and a
/// refetch only happens when explicitly requested.
#[derive(Debug, Clone, Copy)]
pub struct StalePolicy {
    /// Live quote/crypto prices.
    pub live: Duration,
    /// Indicator snapshots (latest observation per series).
    pub snapshot: Duration,
    /// Historical series ranges and klines.
    pub historical: Duration,
    /// Series/alert-config metadata.
    pub metadata: Duration,
}

impl Default for StalePolicy {
    fn default() -> Self {
        Self {
            live: Duration::from_secs(2 * 60),
            snapshot: Duration::from_secs(5 * 60),
            historical: Duration::from_secs(10 * 60),
            metadata: Duration::from_secs(60 * 60),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Economic series / projections service.
    pub series_base_url: String,
    /// Currency/equity/bond quotes service.
    pub quotes_base_url: String,
    /// Crypto prices and klines service.
    pub crypto_base_url: String,
    /// News aggregator.
    pub news_base_url: String,
    /// Alerts engine (authenticated).
    pub alerts_base_url: String,
    /// Auth service.
    pub auth_base_url: String,

    /// Per-request timeout on the shared HTTP client.
    pub http_timeout: Duration,
    /// Staleness windows.
    pub stale: StalePolicy,
    /// How long an unused cache entry survives past its last fetch.
    pub gc_time: Duration,
    /// Backoff before the single fetch retry.
    pub retry_backoff: Duration,
    /// Crypto ticker poll interval.
    pub crypto_poll_interval: Duration,
    /// Delay between a cache mutation and the snapshot flush.
    pub persist_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            series_base_url: "https://api.argendash.app/v1".into(),
            quotes_base_url: "https://api.argendash.app/v1".into(),
            crypto_base_url: "https://crypto.argendash.app/v1".into(),
            news_base_url: "https://api.argendash.app/v1".into(),
            alerts_base_url: "https://alerts.argendash.app/v1".into(),
            auth_base_url: "https://auth.argendash.app/v1".into(),
            http_timeout: Duration::from_secs(30),
            stale: StalePolicy::default(),
            gc_time: Duration::from_secs(24 * 60 * 60),
            retry_backoff: Duration::from_millis(500),
            crypto_poll_interval: Duration::from_secs(1),
            persist_debounce: Duration::from_millis(750),
        }
    }
}

impl Config {
    /// Validate that every base URL parses. Called by `AppState::new` so a
    /// bad override fails at startup instead of on first request.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("series_base_url", &self.series_base_url),
            ("quotes_base_url", &self.quotes_base_url),
            ("crypto_base_url", &self.crypto_base_url),
            ("news_base_url", &self.news_base_url),
            ("alerts_base_url", &self.alerts_base_url),
            ("auth_base_url", &self.auth_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| AppError::Config(format!("invalid {}: {}", name, e)))?;
        }
        Ok(())
    }
}
