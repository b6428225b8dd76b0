//! Domain API clients
//!
//! One client per remote service, one function per endpoint. Clients build
//! the URL, issue the request with a JSON content type, and map every
//! failure mode (transport throw, non-2xx status, `success: false`
//! envelope) into [`ApiError`]. No retries happen here; retry policy lives
//! in the cache layer.

pub mod alerts;
pub mod auth;
pub mod crypto;
pub mod news;
pub mod quotes;
pub mod series;
pub mod types;

use crate::error::{ApiError, AppError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::America::Buenos_Aires;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use types::Envelope;

/// Build the shared HTTP client with the configured timeout.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)).into())
}

/// Format a date-range query parameter as ISO-8601 in Buenos Aires local
/// time, explicit `-03:00` offset. Callers pass the result straight through
/// as `startDate`/`endDate`.
pub fn buenos_aires_param(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Buenos_Aires)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Reject empty required identifiers before any request goes out.
pub(crate) fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", name)));
    }
    Ok(())
}

/// Read a response body, mapping non-2xx statuses to `ApiError::Http` with
/// the best-effort parsed body attached, and bad JSON to a transport error.
pub(crate) async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(format!("failed to read response body: {}", e)))?;

    if !status.is_success() {
        let body: Option<Value> = serde_json::from_str(&text).ok();
        let message = body
            .as_ref()
            .and_then(|b| {
                b.get("error")
                    .or_else(|| b.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });

        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
            body,
        }
        .into());
    }

    serde_json::from_str(&text)
        .map_err(|e| ApiError::Transport(format!("invalid JSON response: {}", e)).into())
}

/// Unwrap a `{success, data}` envelope, treating `success: false` as a
/// failure even though the transport status was 200.
pub(crate) fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T> {
    if !envelope.success {
        let message = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "request rejected".to_string());
        return Err(ApiError::Envelope {
            message,
            body: None,
        }
        .into());
    }

    envelope.data.ok_or_else(|| {
        ApiError::Envelope {
            message: "response envelope carried no data".to_string(),
            body: None,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn buenos_aires_param_carries_offset() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 20, 18, 30, 0).unwrap();
        let formatted = buenos_aires_param(instant);
        assert_eq!(formatted, "2026-08-20T15:30:00-03:00");
    }

    #[test]
    fn empty_identifier_is_a_validation_error() {
        let err = require_non_empty("code", "  ").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn false_envelope_becomes_api_error() {
        let envelope: Envelope<Vec<u8>> = serde_json::from_str(
            r#"{"success":false,"data":null,"error":"unknown series"}"#,
        )
        .unwrap();
        let err = unwrap_envelope(envelope).unwrap_err();
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("unknown series"));
    }
}
