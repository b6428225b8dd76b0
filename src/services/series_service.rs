//! Series Service
//!
//! Indicator cards, series history charts, and series metadata. Snapshots
//! stay fresh for 5 minutes, historical ranges for 10, metadata for 60.

use crate::api::series::SeriesClient;
use crate::cache::keys::series_keys;
use crate::cache::{QueryCache, QueryOutcome, QueryPolicy};
use crate::config::Config;
use crate::transform::chart::{series_to_chart, ChartPoint};
use crate::transform::indicators::{change_percent, series_to_indicator, Indicator};
use std::sync::Arc;
use std::time::Duration;

pub struct SeriesService {
    cache: Arc<QueryCache>,
    client: Arc<SeriesClient>,
    snapshot_stale: Duration,
    historical_stale: Duration,
    metadata_stale: Duration,
    gc_time: Duration,
}

impl SeriesService {
    pub fn new(cache: Arc<QueryCache>, client: Arc<SeriesClient>, config: &Config) -> Self {
        Self {
            cache,
            client,
            snapshot_stale: config.stale.snapshot,
            historical_stale: config.stale.historical,
            metadata_stale: config.stale.metadata,
            gc_time: config.gc_time,
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

    /// Indicator card for the latest observation of a series. No previous
    /// value is available on this path, so the change is unknown and the
    /// trend neutral; use [`indicator_for_range`](Self::indicator_for_range)
    /// when history is loaded.
    pub async fn latest_indicator(&self, code: &str, force: bool) -> QueryOutcome<Indicator> {
        let client = self.client.clone();
        let code_owned = code.to_string();
        self.cache
            .fetch(
                series_keys::indicator(code),
                self.policy(self.snapshot_stale, force),
                move || {
                    let client = client.clone();
                    let code = code_owned.clone();
                    async move {
                        let observation = client.get_latest(&code).await?;
                        Ok(series_to_indicator(&observation, None))
                    }
                },
            )
            .await
    }

    /// Indicator enriched with the percent change between the last two
    /// observations in `[start, end]`.
    pub async fn indicator_for_range(
        &self,
        code: &str,
        start: &str,
        end: &str,
        force: bool,
    ) -> QueryOutcome<Indicator> {
        let client = self.client.clone();
        let (code_owned, start_owned, end_owned) =
            (code.to_string(), start.to_string(), end.to_string());
        self.cache
            .fetch(
                series_keys::indicator_range(code, start, end),
                self.policy(self.historical_stale, force),
                move || {
                    let client = client.clone();
                    let (code, start, end) =
                        (code_owned.clone(), start_owned.clone(), end_owned.clone());
                    async move {
                        let observations = client.get_range(&code, &start, &end).await?;
                        let latest = observations.last().ok_or_else(|| {
                            crate::error::AppError::NotFound(format!(
                                "no observations for {} in range",
                                code
                            ))
                        })?;
                        let change = match observations.len() {
                            0 | 1 => None,
                            n => change_percent(latest, &observations[n - 2]),
                        };
                        Ok(series_to_indicator(latest, change))
                    }
                },
            )
            .await
    }

    /// Chart points for a series range, chronological as returned.
    pub async fn history_chart(
        &self,
        code: &str,
        start: &str,
        end: &str,
        force: bool,
    ) -> QueryOutcome<Vec<ChartPoint>> {
        let client = self.client.clone();
        let (code_owned, start_owned, end_owned) =
            (code.to_string(), start.to_string(), end.to_string());
        self.cache
            .fetch(
                series_keys::range(code, start, end),
                self.policy(self.historical_stale, force),
                move || {
                    let client = client.clone();
                    let (code, start, end) =
                        (code_owned.clone(), start_owned.clone(), end_owned.clone());
                    async move {
                        let observations = client.get_range(&code, &start, &end).await?;
                        Ok(series_to_chart(&observations))
                    }
                },
            )
            .await
    }

    /// Warm an indicator card ahead of display.
    pub fn prefetch_latest_indicator(self: &Arc<Self>, code: &str) {
        let client = self.client.clone();
        let code_owned = code.to_string();
        self.cache.prefetch(
            series_keys::indicator(code),
            self.policy(self.snapshot_stale, false),
            move || {
                let client = client.clone();
                let code = code_owned.clone();
                async move {
                    let observation = client.get_latest(&code).await?;
                    Ok(series_to_indicator(&observation, None))
                }
            },
        );
    }

    /// Warm the history-chart key a detail screen will read, typically on
    /// list-item touch, so navigation lands on cached data.
    pub fn prefetch_history_chart(self: &Arc<Self>, code: &str, start: &str, end: &str) {
        let client = self.client.clone();
        let (code_owned, start_owned, end_owned) =
            (code.to_string(), start.to_string(), end.to_string());
        self.cache.prefetch(
            series_keys::range(code, start, end),
            self.policy(self.historical_stale, false),
            move || {
                let client = client.clone();
                let (code, start, end) =
                    (code_owned.clone(), start_owned.clone(), end_owned.clone());
                async move {
                    let observations = client.get_range(&code, &start, &end).await?;
                    Ok(series_to_chart(&observations))
                }
            },
        );
    }

    pub async fn metadata(
        &self,
        code: &str,
        force: bool,
    ) -> QueryOutcome<crate::api::types::SeriesMetadata> {
        let client = self.client.clone();
        let code_owned = code.to_string();
        self.cache
            .fetch(
                series_keys::metadata(code),
                self.policy(self.metadata_stale, force),
                move || {
                    let client = client.clone();
                    let code = code_owned.clone();
                    async move { client.get_metadata(&code).await }
                },
            )
            .await
    }

    pub async fn all_metadata(
        &self,
        force: bool,
    ) -> QueryOutcome<Vec<crate::api::types::SeriesMetadata>> {
        let client = self.client.clone();
        self.cache
            .fetch(
                series_keys::all_metadata(),
                self.policy(self.metadata_stale, force),
                move || {
                    let client = client.clone();
                    async move { client.list_metadata().await }
                },
            )
            .await
    }
}
