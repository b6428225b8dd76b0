//! News Service
//!
//! Paged article lists. Pages are keyed by limit and offset so each page
//! caches independently, and the next page can be prefetched while the
//! current one is on screen.

use crate::api::news::NewsClient;
use crate::api::types::NewsPage;
use crate::cache::keys::news_keys;
use crate::cache::{QueryCache, QueryOutcome, QueryPolicy};
use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;

pub struct NewsService {
    cache: Arc<QueryCache>,
    client: Arc<NewsClient>,
    stale: Duration,
    gc_time: Duration,
}

impl NewsService {
    pub fn new(cache: Arc<QueryCache>, client: Arc<NewsClient>, config: &Config) -> Self {
        Self {
            cache,
            client,
            stale: config.stale.historical,
            gc_time: config.gc_time,
        }
    }

    fn policy(&self, force: bool) -> QueryPolicy {
        let policy = QueryPolicy::new(self.stale, self.gc_time);
        if force {
            policy.forced()
        } else {
            policy
        }
    }

    pub async fn page(&self, limit: u32, offset: u32, force: bool) -> QueryOutcome<NewsPage> {
        let client = self.client.clone();
        self.cache
            .fetch(news_keys::page(limit, offset), self.policy(force), move || {
                let client = client.clone();
                async move { client.list(limit, offset).await }
            })
            .await
    }

    /// Warm the page after the one currently displayed.
    pub fn prefetch_next_page(self: &Arc<Self>, limit: u32, current_offset: u32) {
        let client = self.client.clone();
        let offset = current_offset + limit;
        self.cache.prefetch(
            news_keys::page(limit, offset),
            self.policy(false),
            move || {
                let client = client.clone();
                async move { client.list(limit, offset).await }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> Arc<NewsService> {
        let config = Config::default();
        let cache = Arc::new(QueryCache::new(Duration::from_millis(1)));
        let client = Arc::new(NewsClient::new(
            http_client(Duration::from_secs(5)).unwrap(),
            server.uri(),
        ));
        Arc::new(NewsService::new(cache, client, &config))
    }

    #[tokio::test]
    async fn pages_cache_independently() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{"id": "n1", "title": "Primera", "url": "https://example.com/n1",
                              "published_at": "2026-08-20T12:00:00-03:00"}],
                "total": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("offset", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{"id": "n2", "title": "Segunda", "url": "https://example.com/n2",
                              "published_at": "2026-08-19T12:00:00-03:00"}],
                "total": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let first = service.page(20, 0, false).await.data.unwrap();
        let second = service.page(20, 20, false).await.data.unwrap();
        assert_eq!(first.articles[0].id, "n1");
        assert_eq!(second.articles[0].id, "n2");

        // Re-reading page one serves the cache, not the mock.
        let again = service.page(20, 0, false).await.data.unwrap();
        assert_eq!(again.articles[0].id, "n1");
    }

    #[tokio::test]
    async fn prefetch_warms_next_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("offset", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [],
                "total": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        service.prefetch_next_page(20, 0);

        // Let the spawned warmer finish, then the read hits the cache.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let page = service.page(20, 20, false).await.data.unwrap();
        assert!(page.articles.is_empty());
    }
}
