//! News aggregator client

use crate::api::decode_response;
use crate::api::types::NewsPage;
use crate::error::Result;
use reqwest::Client;

pub struct NewsClient {
    client: Client,
    base_url: String,
}

impl NewsClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// One page of articles, newest first.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<NewsPage> {
        let response = self
            .client
            .get(format!("{}/news", self.base_url))
            .header("Content-Type", "application/json")
            .query(&[("limit", limit.to_string()), ("offset", offset.to_string())])
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        decode_response(response).await
    }
}
