//! Query cache
//!
//! Process-wide cache between the fetching services and the domain API
//! clients. Entries are keyed by [`QueryKey`], carry explicit freshness and
//! garbage-collection deadlines, and are persisted to the key-value store so
//! previously fetched data is available immediately after a restart.
//!
//! Policy, in order of what a caller observes:
//! - an entry inside its staleness window is served with no network call;
//! - a stale entry is still served immediately; a refetch happens only when
//!   the caller forces one (no focus/reconnect/mount triggers);
//! - concurrent fetches for one key coalesce onto a single in-flight future;
//! - a failed fetch is retried exactly once after a short jittered backoff,
//!   then the error is surfaced alongside any last-known-good value
//!   (stale-while-error).

pub mod keys;
mod persist;

use crate::error::Result;
use crate::store::KvStore;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use keys::QueryKey;
use parking_lot::Mutex;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// One cached value with its lifecycle deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
    pub stale_at: DateTime<Utc>,
    pub gc_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.stale_at
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.gc_at
    }
}

/// Per-query freshness policy.
#[derive(Debug, Clone, Copy)]
pub struct QueryPolicy {
    pub stale_time: Duration,
    pub gc_time: Duration,
    /// Bypass the freshness check (explicit refetch). Still coalesces with
    /// any in-flight fetch for the same key.
    pub force: bool,
}

impl QueryPolicy {
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time,
            gc_time,
            force: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// What a fetch hands back to the caller. `data` and `error` can both be
/// set: a failed refetch keeps the last-known-good value in `data` and the
/// failure in `error`.
#[derive(Debug, Clone)]
pub struct QueryOutcome<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub is_stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> QueryOutcome<T> {
    /// Outcome with no data, only a failure message.
    pub(crate) fn empty_error(message: String) -> Self {
        Self {
            data: None,
            error: Some(message),
            is_stale: false,
            fetched_at: None,
        }
    }
}

type FetchFlight = Shared<BoxFuture<'static, std::result::Result<Value, String>>>;

pub struct QueryCache {
    entries: Arc<DashMap<QueryKey, CacheEntry>>,
    in_flight: Arc<Mutex<HashMap<QueryKey, FetchFlight>>>,
    retry_backoff: Duration,
    dirty: Option<Arc<Notify>>,
}

impl QueryCache {
    /// In-memory cache with no persistence.
    pub fn new(retry_backoff: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            retry_backoff,
            dirty: None,
        }
    }

    /// Cache backed by the key-value store: rehydrates the persisted
    /// snapshot (dropping entries already past `gc_at`) and spawns the
    /// debounced flush task. Must be called from within a tokio runtime.
    pub fn with_persistence(
        store: Arc<KvStore>,
        retry_backoff: Duration,
        debounce: Duration,
    ) -> Result<Self> {
        let entries = Arc::new(DashMap::new());
        persist::rehydrate(&store, &entries)?;

        let dirty = Arc::new(Notify::new());
        persist::spawn_flush_task(Arc::downgrade(&entries), store, dirty.clone(), debounce);

        Ok(Self {
            entries,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            retry_backoff,
            dirty: Some(dirty),
        })
    }

    /// Fetch through the cache.
    ///
    /// `fetcher` builds a fresh future per attempt so the single retry can
    /// re-issue the request. The returned outcome never panics a render
    /// path: failures land in `outcome.error`.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        policy: QueryPolicy,
        fetcher: F,
    ) -> QueryOutcome<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let now = Utc::now();

        if !policy.force {
            if let Some(entry) = self.entries.get(&key) {
                if !entry.is_expired(now) {
                    debug!(%key, fresh = entry.is_fresh(now), "cache hit");
                    return self.outcome_from_entry(&entry, None, now);
                }
            }
        }

        let flight = self.join_or_start_flight(&key, policy, fetcher);
        let result = flight.await;

        match result {
            Ok(value) => {
                let completed = Utc::now();
                let entry = CacheEntry {
                    data: value,
                    fetched_at: completed,
                    stale_at: completed
                        + ChronoDuration::from_std(policy.stale_time)
                            .unwrap_or_else(|_| ChronoDuration::zero()),
                    gc_at: completed
                        + ChronoDuration::from_std(policy.gc_time)
                            .unwrap_or_else(|_| ChronoDuration::zero()),
                };
                self.entries.insert(key.clone(), entry.clone());
                self.mark_dirty();
                self.outcome_from_entry(&entry, None, completed)
            }
            Err(message) => {
                // Stale-while-error: keep serving the last-known-good value.
                match self.entries.get(&key) {
                    Some(entry) => {
                        warn!(%key, error = %message, "fetch failed, serving cached value");
                        let mut outcome = self.outcome_from_entry(&entry, Some(message), now);
                        outcome.is_stale = true;
                        outcome
                    }
                    None => {
                        warn!(%key, error = %message, "fetch failed, no cached value");
                        QueryOutcome::empty_error(message)
                    }
                }
            }
        }
    }

    /// Fire-and-forget cache warmer: same key, same policy, outcome ignored.
    pub fn prefetch<T, F, Fut>(self: &Arc<Self>, key: QueryKey, policy: QueryPolicy, fetcher: F)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let _: QueryOutcome<T> = cache.fetch(key, policy, fetcher).await;
        });
    }

    /// Mark one entry stale immediately. The value stays served until the
    /// next forced fetch replaces it.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.stale_at = Utc::now();
        }
        self.mark_dirty();
    }

    /// Mark every entry under `prefix` stale.
    pub fn invalidate_prefix(&self, prefix: &QueryKey) {
        let now = Utc::now();
        for mut item in self.entries.iter_mut() {
            if item.key().starts_with(prefix) {
                item.value_mut().stale_at = now;
            }
        }
        self.mark_dirty();
    }

    /// Drop entries past their GC deadline with no fetch in flight.
    pub fn gc(&self) {
        let now = Utc::now();
        let in_flight = self.in_flight.lock();
        self.entries
            .retain(|key, entry| !entry.is_expired(now) || in_flight.contains_key(key));
    }

    /// Raw entry lookup, regardless of freshness. Used by tests and
    /// diagnostics.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn join_or_start_flight<T, F, Fut>(
        &self,
        key: &QueryKey,
        policy: QueryPolicy,
        fetcher: F,
    ) -> FetchFlight
    where
        T: Serialize + DeserializeOwned + Send,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock();
        if let Some(flight) = in_flight.get(key) {
            debug!(%key, "joining in-flight fetch");
            return flight.clone();
        }

        let backoff = self.retry_backoff;
        let flight_key = key.clone();
        let registry = Arc::clone(&self.in_flight);
        let flight: FetchFlight = async move {
            let result = match fetcher().await {
                Ok(value) => serde_json::to_value(&value).map_err(|e| e.to_string()),
                Err(first) => {
                    let jitter = rand::thread_rng().gen_range(0..=backoff.as_millis() as u64 / 2);
                    let delay = backoff + Duration::from_millis(jitter);
                    warn!(key = %flight_key, error = %first, ?delay, "fetch failed, retrying once");
                    tokio::time::sleep(delay).await;

                    match fetcher().await {
                        Ok(value) => serde_json::to_value(&value).map_err(|e| e.to_string()),
                        Err(second) => Err(second.to_string()),
                    }
                }
            };

            // The flight deregisters itself before resolving. Awaiters must
            // not touch the registry: a late resumer would otherwise remove
            // whatever flight is registered for the key by then, which can
            // be a newer in-flight fetch started after this one completed.
            registry.lock().remove(&flight_key);
            result
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), flight.clone());
        flight
    }

    fn outcome_from_entry<T: DeserializeOwned>(
        &self,
        entry: &CacheEntry,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> QueryOutcome<T> {
        match serde_json::from_value(entry.data.clone()) {
            Ok(data) => QueryOutcome {
                data: Some(data),
                error,
                is_stale: !entry.is_fresh(now),
                fetched_at: Some(entry.fetched_at),
            },
            Err(e) => QueryOutcome::empty_error(format!("cached value shape mismatch: {}", e)),
        }
    }

    fn mark_dirty(&self) {
        if let Some(dirty) = &self.dirty {
            dirty.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::keys::quote_keys;
    use super::*;
    use crate::error::{ApiError, AppError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy(stale_secs: u64) -> QueryPolicy {
        QueryPolicy::new(
            Duration::from_secs(stale_secs),
            Duration::from_secs(stale_secs * 10),
        )
    }

    fn counting_fetcher(
        counter: Arc<AtomicUsize>,
        fail_first: usize,
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<u32>>> + Send + Sync + 'static {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < fail_first {
                    Err(AppError::Api(ApiError::Transport("boom".into())))
                } else {
                    Ok(vec![1, 2, 3])
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn second_fetch_within_window_hits_cache() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let first: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300),
                counting_fetcher(calls.clone(), 0),
            )
            .await;
        let second: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.data, second.data);
        assert!(!second.is_stale);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_flight() {
        let cache = Arc::new(QueryCache::new(Duration::from_millis(1)));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetcher = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok::<u64, AppError>(42)
                }
                .boxed()
            }
        };
        let slow_fetcher2 = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<u64, AppError>(99) }.boxed()
            }
        };

        let (a, b): (QueryOutcome<u64>, QueryOutcome<u64>) = tokio::join!(
            cache.fetch(quote_keys::current(), policy(300), slow_fetcher),
            cache.fetch(quote_keys::current(), policy(300), slow_fetcher2),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.data, Some(42));
        assert_eq!(b.data, Some(42));
    }

    #[tokio::test]
    async fn retries_exactly_once_then_succeeds() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let outcome: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300),
                counting_fetcher(calls.clone(), 1),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(outcome.data, Some(vec![1, 2, 3]));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn stale_while_error_keeps_last_known_good() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        // Seed the cache.
        let _: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        // Forced refetch that fails both attempts.
        let outcome: QueryOutcome<Vec<u32>> = cache
            .fetch(quote_keys::current(), policy(300).forced(), || async {
                Err(AppError::Api(ApiError::Transport("down".into())))
            })
            .await;

        assert_eq!(outcome.data, Some(vec![1, 2, 3]));
        assert!(outcome.error.as_deref().unwrap_or("").contains("down"));
        assert!(outcome.is_stale);
    }

    #[tokio::test]
    async fn failure_with_no_cached_value_is_error_only() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let outcome: QueryOutcome<Vec<u32>> = cache
            .fetch(quote_keys::current(), policy(300), || async {
                Err(AppError::Api(ApiError::Transport("down".into())))
            })
            .await;

        assert!(outcome.data.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn stale_entry_served_without_refetch() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let _: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                QueryPolicy::new(Duration::ZERO, Duration::from_secs(3600)),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        let outcome: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                QueryPolicy::new(Duration::ZERO, Duration::from_secs(3600)),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        // Entry is stale but still served; no second network call.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcome.is_stale);
        assert_eq!(outcome.data, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn flight_deregisters_on_completion_without_evicting_successor() {
        let cache = Arc::new(QueryCache::new(Duration::from_millis(1)));
        let calls = Arc::new(AtomicUsize::new(0));

        // First flight completes and leaves the registry empty, so a forced
        // refetch can never join an already-resolved flight.
        let _: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300),
                counting_fetcher(calls.clone(), 0),
            )
            .await;
        assert!(cache.in_flight.lock().is_empty());

        // A slow forced refetch registers a successor flight for the key.
        let slow = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<Vec<u32>, AppError>(vec![9])
                }
                .boxed()
            }
        };
        let pending = {
            let cache = cache.clone();
            tokio::spawn(async move {
                let outcome: QueryOutcome<Vec<u32>> = cache
                    .fetch(quote_keys::current(), policy(300).forced(), slow)
                    .await;
                outcome
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The earlier flight's resolution did not remove the successor: it
        // stays registered and a concurrent forced fetch joins it.
        assert_eq!(cache.in_flight.lock().len(), 1);
        let joined: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                policy(300).forced(),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        assert_eq!(joined.data, Some(vec![9]));
        assert_eq!(pending.await.unwrap().data, Some(vec![9]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.in_flight.lock().is_empty());
    }

    #[tokio::test]
    async fn invalidate_prefix_marks_descendants_stale() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let _: QueryOutcome<Vec<u32>> = cache
            .fetch(
                keys::alerts_keys::list("u1"),
                policy(300),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        let entry = cache.peek(&keys::alerts_keys::list("u1")).unwrap();
        assert!(entry.is_fresh(Utc::now()));

        cache.invalidate_prefix(&keys::alerts_keys::all("u1"));
        let entry = cache.peek(&keys::alerts_keys::list("u1")).unwrap();
        assert!(!entry.is_fresh(Utc::now()));
    }

    #[tokio::test]
    async fn gc_drops_expired_entries() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let calls = Arc::new(AtomicUsize::new(0));

        let _: QueryOutcome<Vec<u32>> = cache
            .fetch(
                quote_keys::current(),
                QueryPolicy::new(Duration::ZERO, Duration::ZERO),
                counting_fetcher(calls.clone(), 0),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.gc();
        assert!(cache.is_empty());
    }
}
