//! Cache snapshot persistence
//!
//! Mutations mark the cache dirty; a background task debounces the signal
//! and serializes every live entry to the key-value store. Construction
//! rehydrates the snapshot so previously fetched data is visible before the
//! first network round trip.

use super::{CacheEntry, QueryKey};
use crate::error::Result;
use crate::store::{keys, KvStore};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

type Entries = DashMap<QueryKey, CacheEntry>;

/// Load the persisted snapshot into `entries`, skipping anything already
/// past its GC deadline.
pub(super) fn rehydrate(store: &KvStore, entries: &Entries) -> Result<()> {
    let snapshot: Option<Vec<(QueryKey, CacheEntry)>> = store.get_json(keys::QUERY_CACHE)?;
    let Some(snapshot) = snapshot else {
        return Ok(());
    };

    let now = Utc::now();
    let mut restored = 0usize;
    for (key, entry) in snapshot {
        if entry.is_expired(now) {
            continue;
        }
        entries.insert(key, entry);
        restored += 1;
    }

    debug!(restored, "query cache rehydrated");
    Ok(())
}

/// Serialize all live entries to storage.
pub(super) fn flush(store: &KvStore, entries: &Entries) -> Result<()> {
    let now = Utc::now();
    let snapshot: Vec<(QueryKey, CacheEntry)> = entries
        .iter()
        .filter(|item| !item.value().is_expired(now))
        .map(|item| (item.key().clone(), item.value().clone()))
        .collect();

    store.set_json(keys::QUERY_CACHE, &snapshot)
}

/// Background flush loop. Holds only a weak reference to the entry table so
/// dropping the cache ends the task.
pub(super) fn spawn_flush_task(
    entries: Weak<Entries>,
    store: Arc<KvStore>,
    dirty: Arc<Notify>,
    debounce: Duration,
) {
    tokio::spawn(async move {
        loop {
            dirty.notified().await;
            tokio::time::sleep(debounce).await;

            let Some(entries) = entries.upgrade() else {
                break;
            };
            if let Err(e) = flush(&store, &entries) {
                warn!("query cache flush failed: {}", e);
            }
        }
    });
}
