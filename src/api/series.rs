//! Economic series / projections client
//!
//! All series endpoints wrap their payloads in a `{success, data}` envelope.

use crate::api::types::{Envelope, SeriesMetadata, SeriesObservation};
use crate::api::{decode_response, require_non_empty, unwrap_envelope};
use crate::error::Result;
use reqwest::Client;
use tracing::debug;

pub struct SeriesClient {
    client: Client,
    base_url: String,
}

impl SeriesClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Latest observation for a series code.
    pub async fn get_latest(&self, code: &str) -> Result<SeriesObservation> {
        require_non_empty("series code", code)?;
        debug!(code, "fetching latest observation");

        let response = self
            .client
            .get(format!("{}/series/latest", self.base_url))
            .header("Content-Type", "application/json")
            .query(&[("code", code)])
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<SeriesObservation> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    /// Observations for a series within `[start, end]`. Date parameters are
    /// caller-formatted (see [`crate::api::buenos_aires_param`]).
    pub async fn get_range(
        &self,
        code: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<SeriesObservation>> {
        require_non_empty("series code", code)?;
        debug!(code, start, end, "fetching series range");

        let response = self
            .client
            .get(format!("{}/series", self.base_url))
            .header("Content-Type", "application/json")
            .query(&[("code", code), ("startDate", start), ("endDate", end)])
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<Vec<SeriesObservation>> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    /// Display metadata for a single series.
    pub async fn get_metadata(&self, code: &str) -> Result<SeriesMetadata> {
        require_non_empty("series code", code)?;

        let response = self
            .client
            .get(format!("{}/series/{}/metadata", self.base_url, code))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<SeriesMetadata> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }

    /// Metadata for every published series.
    pub async fn list_metadata(&self) -> Result<Vec<SeriesMetadata>> {
        let response = self
            .client
            .get(format!("{}/series/metadata", self.base_url))
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(crate::error::ApiError::from)?;

        let envelope: Envelope<Vec<SeriesMetadata>> = decode_response(response).await?;
        unwrap_envelope(envelope)
    }
}
