//! Application state
//!
//! Wires the whole data layer together: one key-value store, one persistent
//! query cache, one session manager, and one service per domain, all sharing
//! a single HTTP client. Built once at startup and cloned by handle.

use crate::api::auth::{AuthApi, AuthClient};
use crate::api::crypto::CryptoClient;
use crate::api::news::NewsClient;
use crate::api::quotes::QuotesClient;
use crate::api::series::SeriesClient;
use crate::api::{alerts::AlertsClient, http_client};
use crate::cache::QueryCache;
use crate::config::Config;
use crate::error::Result;
use crate::services::{AlertsService, CryptoService, NewsService, QuotesService, SeriesService};
use crate::session::SessionManager;
use crate::store::KvStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub store: Arc<KvStore>,
    pub cache: Arc<QueryCache>,
    pub session: Arc<SessionManager>,
    pub series: Arc<SeriesService>,
    pub quotes: Arc<QuotesService>,
    pub crypto: Arc<CryptoService>,
    pub news: Arc<NewsService>,
    pub alerts: Arc<AlertsService>,
}

impl AppState {
    /// Build the full data layer under `data_dir`. Must be called from
    /// within a tokio runtime (the cache spawns its flush task).
    pub fn new(config: Config, data_dir: &Path) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(data_dir)?;

        let store = Arc::new(KvStore::open(&data_dir.join("argendash.db"))?);
        let http = http_client(config.http_timeout)?;
        let cache = Arc::new(QueryCache::with_persistence(
            store.clone(),
            config.retry_backoff,
            config.persist_debounce,
        )?);

        let auth: Arc<dyn AuthApi> =
            Arc::new(AuthClient::new(http.clone(), config.auth_base_url.clone()));
        let session = Arc::new(SessionManager::new(auth, store.clone(), http.clone())?);

        let series = Arc::new(SeriesService::new(
            cache.clone(),
            Arc::new(SeriesClient::new(
                http.clone(),
                config.series_base_url.clone(),
            )),
            &config,
        ));
        let quotes = Arc::new(QuotesService::new(
            cache.clone(),
            Arc::new(QuotesClient::new(
                http.clone(),
                config.quotes_base_url.clone(),
            )),
            &config,
        ));
        let crypto = Arc::new(CryptoService::new(
            cache.clone(),
            Arc::new(CryptoClient::new(
                http.clone(),
                config.crypto_base_url.clone(),
            )),
            &config,
        ));
        let news = Arc::new(NewsService::new(
            cache.clone(),
            Arc::new(NewsClient::new(http.clone(), config.news_base_url.clone())),
            &config,
        ));
        let alerts = Arc::new(AlertsService::new(
            cache.clone(),
            Arc::new(AlertsClient::new(
                session.clone(),
                config.alerts_base_url.clone(),
            )),
            session.clone(),
            &config,
        ));

        info!(cached_entries = cache.len(), "application state initialized");

        Ok(Self {
            config,
            store,
            cache,
            session,
            series,
            quotes,
            crypto,
            news,
            alerts,
        })
    }
}
