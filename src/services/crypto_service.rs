//! Crypto Service
//!
//! Prices and candlesticks, plus the live ticker: a polling task that
//! refetches prices on a fixed interval, runs them through a
//! [`DirectionTracker`], and publishes snapshots over a watch channel. The
//! task stops on its own once the last [`CryptoTicker`] handle is dropped.

use crate::api::crypto::CryptoClient;
use crate::api::types::CryptoPrice;
use crate::cache::keys::crypto_keys;
use crate::cache::{QueryCache, QueryOutcome, QueryPolicy};
use crate::config::Config;
use crate::transform::chart::{klines_to_chart, ChartPoint};
use crate::transform::crypto::{track_directions, CryptoSnapshot, DirectionTracker};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

pub struct CryptoService {
    cache: Arc<QueryCache>,
    client: Arc<CryptoClient>,
    live_stale: Duration,
    historical_stale: Duration,
    gc_time: Duration,
    poll_interval: Duration,
}

/// Subscription handle for live crypto snapshots. Cloning shares the same
/// underlying poller; the poller exits once every handle is gone.
#[derive(Clone)]
pub struct CryptoTicker {
    receiver: watch::Receiver<Vec<CryptoSnapshot>>,
}

impl CryptoTicker {
    /// Wait for the next published snapshot set.
    pub async fn changed(&mut self) -> Option<Vec<CryptoSnapshot>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Most recently published snapshots without waiting.
    pub fn latest(&self) -> Vec<CryptoSnapshot> {
        self.receiver.borrow().clone()
    }
}

impl CryptoService {
    pub fn new(cache: Arc<QueryCache>, client: Arc<CryptoClient>, config: &Config) -> Self {
        Self {
            cache,
            client,
            live_stale: config.stale.live,
            historical_stale: config.stale.historical,
            gc_time: config.gc_time,
            poll_interval: config.crypto_poll_interval,
        }
    }

    fn policy(&self, stale: Duration, force: bool) -> QueryPolicy {
        let policy = QueryPolicy::new(stale, self.gc_time);
        if force {
            policy.forced()
        } else {
            policy
        }
    }

    /// One-shot prices, no direction tracking.
    pub async fn prices(&self, force: bool) -> QueryOutcome<Vec<CryptoPrice>> {
        let client = self.client.clone();
        self.cache
            .fetch(
                crypto_keys::prices(),
                self.policy(self.live_stale, force),
                move || {
                    let client = client.clone();
                    async move { client.get_prices().await }
                },
            )
            .await
    }

    /// Candlestick closes as chart points, chronological as returned.
    pub async fn klines_chart(
        &self,
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
        start: Option<i64>,
        end: Option<i64>,
        force: bool,
    ) -> QueryOutcome<Vec<ChartPoint>> {
        let client = self.client.clone();
        let (symbol_owned, interval_owned) = (symbol.to_string(), interval.to_string());
        self.cache
            .fetch(
                crypto_keys::klines(symbol, interval, limit, start, end),
                self.policy(self.historical_stale, force),
                move || {
                    let client = client.clone();
                    let (symbol, interval) = (symbol_owned.clone(), interval_owned.clone());
                    async move {
                        let klines = client.get_klines(&symbol, &interval, limit, start, end).await?;
                        Ok(klines_to_chart(&klines))
                    }
                },
            )
            .await
    }

    /// Spawn the polling ticker, restricted to `symbols` (empty means every
    /// tracked symbol). Each subscription gets its own poller and its own
    /// direction history; forced fetches keep the cached prices key current
    /// for one-shot readers.
    pub fn start_ticker(&self, symbols: &[&str]) -> CryptoTicker {
        let cache = self.cache.clone();
        let client = self.client.clone();
        let interval = self.poll_interval;
        let policy = QueryPolicy::new(self.live_stale, self.gc_time).forced();
        let wanted: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        let (tx, rx) = watch::channel(Vec::new());

        tokio::spawn(async move {
            let mut tracker = DirectionTracker::new();
            loop {
                let fetch_client = client.clone();
                let outcome: QueryOutcome<Vec<CryptoPrice>> = cache
                    .fetch(crypto_keys::prices(), policy, move || {
                        let client = fetch_client.clone();
                        async move { client.get_prices().await }
                    })
                    .await;

                if let Some(mut prices) = outcome.data {
                    if !wanted.is_empty() {
                        prices.retain(|p| wanted.contains(&p.symbol));
                    }
                    let snapshots = track_directions(&mut tracker, &prices);
                    if tx.send(snapshots).is_err() {
                        break;
                    }
                } else if tx.is_closed() {
                    break;
                }

                tokio::time::sleep(interval).await;
            }
            debug!("crypto ticker stopped");
        });

        CryptoTicker { receiver: rx }
    }
}
