//! Currency/equity/bond quotes client
//!
//! The quotes service returns bare JSON arrays, no envelope.

use crate::api::types::QuoteRow;
use crate::api::{decode_response, require_non_empty};
use crate::error::Result;
use reqwest::Client;
use tracing::debug;

pub struct QuotesClient {
    client: Client,
    base_url: String,
}

impl QuotesClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Current quotes across every tracked instrument.
    pub async fn get_current(&self) -> Result<Vec<QuoteRow>> {
        debug!("fetching current quotes");

        let response = self
            .client
            .get(format!("{}/quotes/current", self.base_url))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        decode_response(response).await
    }

    /// Historical quotes for one `casa` within `[start, end]`.
    pub async fn get_historical(
        &self,
        casa: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<QuoteRow>> {
        require_non_empty("casa", casa)?;
        debug!(casa, start, end, "fetching historical quotes");

        let response = self
            .client
            .get(format!("{}/quotes/historical", self.base_url))
            .header("Content-Type", "application/json")
            .query(&[("casa", casa), ("startDate", start), ("endDate", end)])
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        decode_response(response).await
    }
}
