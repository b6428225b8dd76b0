//! Crypto prices and klines client

use crate::api::types::{CryptoPrice, Kline};
use crate::api::{decode_response, require_non_empty};
use crate::error::Result;
use reqwest::Client;
use tracing::debug;

pub struct CryptoClient {
    client: Client,
    base_url: String,
}

impl CryptoClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Live prices for every tracked symbol.
    pub async fn get_prices(&self) -> Result<Vec<CryptoPrice>> {
        let response = self
            .client
            .get(format!("{}/crypto/prices", self.base_url))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        decode_response(response).await
    }

    /// Candlesticks for one symbol. `limit`, `start`, and `end` are optional;
    /// times are epoch milliseconds pre-formatted by the caller.
    pub async fn get_klines(
        &self,
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<Vec<Kline>> {
        require_non_empty("symbol", symbol)?;
        require_non_empty("interval", interval)?;
        debug!(symbol, interval, "fetching klines");

        let mut query: Vec<(&str, String)> = vec![
            ("symbol", symbol.to_string()),
            ("interval", interval.to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(start) = start {
            query.push(("startTime", start.to_string()));
        }
        if let Some(end) = end {
            query.push(("endTime", end.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/crypto/klines", self.base_url))
            .header("Content-Type", "application/json")
            .query(&query)
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        decode_response(response).await
    }
}
