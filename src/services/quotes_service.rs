//! Quotes Service
//!
//! Current and historical quotes for currencies, equity indices, and bonds.
//! Current quotes are live data (2 minute window); historical ranges follow
//! the 10 minute window.

use crate::api::quotes::QuotesClient;
use crate::api::types::QuoteRow;
use crate::cache::keys::quote_keys;
use crate::cache::{QueryCache, QueryOutcome, QueryPolicy};
use crate::config::Config;
use crate::transform::chart::{quote_rows_to_chart, ChartPoint};
use crate::transform::quotes::{filter_by_category, quote_rows_to_quotes, Quote, QuoteCategory};
use std::sync::Arc;
use std::time::Duration;

pub struct QuotesService {
    cache: Arc<QueryCache>,
    client: Arc<QuotesClient>,
    live_stale: Duration,
    historical_stale: Duration,
    gc_time: Duration,
}

impl QuotesService {
    pub fn new(cache: Arc<QueryCache>, client: Arc<QuotesClient>, config: &Config) -> Self {
        Self {
            cache,
            client,
            live_stale: config.stale.live,
            historical_stale: config.stale.historical,
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

    /// Every current quote, transformed. Change is `Unknown` on this path
    /// since the quotes API supplies no previous values.
    pub async fn current(&self, force: bool) -> QueryOutcome<Vec<Quote>> {
        let client = self.client.clone();
        self.cache
            .fetch(
                quote_keys::current(),
                self.policy(self.live_stale, force),
                move || {
                    let client = client.clone();
                    async move {
                        let rows = client.get_current().await?;
                        Ok(quote_rows_to_quotes(&rows, None))
                    }
                },
            )
            .await
    }

    /// Current quotes restricted to one screen section, original order
    /// preserved.
    pub async fn current_by_category(
        &self,
        category: QuoteCategory,
        force: bool,
    ) -> QueryOutcome<Vec<Quote>> {
        let outcome = self.current(force).await;
        QueryOutcome {
            data: outcome.data.map(|quotes| filter_by_category(&quotes, category)),
            error: outcome.error,
            is_stale: outcome.is_stale,
            fetched_at: outcome.fetched_at,
        }
    }

    /// Raw historical rows for one casa.
    pub async fn historical(
        &self,
        casa: &str,
        start: &str,
        end: &str,
        force: bool,
    ) -> QueryOutcome<Vec<QuoteRow>> {
        let client = self.client.clone();
        let (casa_owned, start_owned, end_owned) =
            (casa.to_string(), start.to_string(), end.to_string());
        self.cache
            .fetch(
                quote_keys::historical(casa, start, end),
                self.policy(self.historical_stale, force),
                move || {
                    let client = client.clone();
                    let (casa, start, end) =
                        (casa_owned.clone(), start_owned.clone(), end_owned.clone());
                    async move { client.get_historical(&casa, &start, &end).await }
                },
            )
            .await
    }

    /// Historical sell prices as chart points.
    pub async fn historical_chart(
        &self,
        casa: &str,
        start: &str,
        end: &str,
        force: bool,
    ) -> QueryOutcome<Vec<ChartPoint>> {
        let outcome = self.historical(casa, start, end, force).await;
        QueryOutcome {
            data: outcome.data.map(|rows| quote_rows_to_chart(&rows)),
            error: outcome.error,
            is_stale: outcome.is_stale,
            fetched_at: outcome.fetched_at,
        }
    }

    /// Warm the historical key a detail screen will read.
    pub fn prefetch_historical(self: &Arc<Self>, casa: &str, start: &str, end: &str) {
        let client = self.client.clone();
        let (casa_owned, start_owned, end_owned) =
            (casa.to_string(), start.to_string(), end.to_string());
        self.cache.prefetch(
            quote_keys::historical(casa, start, end),
            self.policy(self.historical_stale, false),
            move || {
                let client = client.clone();
                let (casa, start, end) =
                    (casa_owned.clone(), start_owned.clone(), end_owned.clone());
                async move { client.get_historical(&casa, &start, &end).await }
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> QuotesService {
        let config = Config::default();
        let cache = Arc::new(QueryCache::new(Duration::from_millis(1)));
        let client = Arc::new(QuotesClient::new(
            http_client(Duration::from_secs(5)).unwrap(),
            server.uri(),
        ));
        QuotesService::new(cache, client, &config)
    }

    #[tokio::test]
    async fn current_transforms_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"casa": "blue", "nombre": "Dólar Blue", "compra": 1180.0, "venta": 1220.0, "fecha": "2026-08-20T15:00:00-03:00"},
                {"casa": "al30", "nombre": "AL30", "compra": 57.0, "venta": 58.0, "fecha": "2026-08-20T15:00:00-03:00"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(&server);
        let quotes = service.current(false).await.data.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].sell_price, "$ 1.220,00");

        let bonos = service
            .current_by_category(QuoteCategory::Bonos, false)
            .await
            .data
            .unwrap();
        assert_eq!(bonos.len(), 1);
        assert_eq!(bonos[0].id, "al30");
    }

    #[tokio::test]
    async fn historical_chart_skips_rowless_prices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quotes/historical"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"casa": "blue", "nombre": "Blue", "compra": 1100.0, "venta": 1140.0, "fecha": "2026-08-18T15:00:00-03:00"},
                {"casa": "blue", "nombre": "Blue", "compra": null, "venta": null, "fecha": "2026-08-19T15:00:00-03:00"},
                {"casa": "blue", "nombre": "Blue", "compra": 1180.0, "venta": 1220.0, "fecha": "2026-08-20T15:00:00-03:00"}
            ])))
            .mount(&server)
            .await;

        let service = service_for(&server);
        let points = service
            .historical_chart(
                "blue",
                "2026-08-18T00:00:00-03:00",
                "2026-08-21T00:00:00-03:00",
                false,
            )
            .await
            .data
            .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].value, 1220.0);
    }
}
