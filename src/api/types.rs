//! Wire types shared by the domain API clients
//!
//! The upstream services are loose about numeric types (prices arrive as
//! strings or floats depending on the endpoint), so numeric fields that vary
//! go through the flexible deserializer helpers below instead of trusting
//! the JSON type.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Flexible Deserialization Helpers
// ============================================================================

/// Deserialize a value that could be either a string or a float
pub(crate) fn deserialize_string_or_float<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Int(i64),
    }

    match StringOrFloat::deserialize(deserializer)? {
        StringOrFloat::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrFloat::Float(f) => Ok(f),
        StringOrFloat::Int(i) => Ok(i as f64),
    }
}

/// Deserialize an optional value that could be either a string or a float
pub(crate) fn deserialize_optional_string_or_float<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Int(i64),
        Null,
    }

    match Option::<StringOrFloat>::deserialize(deserializer)? {
        Some(StringOrFloat::String(s)) if s.is_empty() => Ok(None),
        Some(StringOrFloat::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::Int(i)) => Ok(Some(i as f64)),
        Some(StringOrFloat::Null) | None => Ok(None),
    }
}

// ============================================================================
// Response Envelope
// ============================================================================

/// `{success, data}` wrapper used by the series, alerts, and auth services.
///
/// `success: false` on a 200 is a failure; the client maps it to
/// `ApiError::Envelope` before the payload reaches any caller.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Series service
// ============================================================================

/// One data point of an economic time series.
///
/// `value` stays a string until a transform parses it; malformed values are
/// treated as "no data" at that point, never coerced to zero here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesObservation {
    pub internal_series_code: String,
    pub obs_time: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMetadata {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

// ============================================================================
// Quotes service
// ============================================================================

/// Raw quote row as returned by `/quotes/current` and `/quotes/historical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRow {
    pub casa: String,
    pub nombre: String,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub compra: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub venta: Option<f64>,
    pub fecha: String,
}

// ============================================================================
// Crypto service
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub symbol: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub price: f64,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub change_percent_24h: Option<f64>,
}

/// One candlestick from `/crypto/klines`. Times are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kline {
    pub open_time: i64,
    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub open: f64,
    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub high: f64,
    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub low: f64,
    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub close: f64,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub volume: Option<f64>,
    #[serde(default)]
    pub close_time: Option<i64>,
}

// ============================================================================
// News service
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    pub published_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPage {
    pub articles: Vec<NewsArticle>,
    #[serde(default)]
    pub total: Option<u32>,
}

// ============================================================================
// Alerts engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertRuleType {
    ValueAbove,
    ValueBelow,
    PercentChangeAbove,
    PercentChangeBelow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRuleConfig {
    pub threshold: f64,
    /// Observation window for the percent-change rules, e.g. "30d".
    #[serde(default)]
    pub window: Option<String>,
}

/// A user-owned alert rule bound to a series code.
///
/// `last_triggered_at` is server-owned; the client never writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub series_code: String,
    pub rule_type: AlertRuleType,
    pub rule_config: AlertRuleConfig,
    pub is_active: bool,
    #[serde(default)]
    pub last_triggered_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRequest {
    pub series_code: String,
    pub rule_type: AlertRuleType,
    pub rule_config: AlertRuleConfig,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub alert_id: String,
    pub triggered_at: String,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub observed_value: Option<f64>,
}

/// One selectable rule type from `/alert-configs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfigOption {
    pub rule_type: AlertRuleType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Auth service
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: AuthUser,
}
