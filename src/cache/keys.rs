//! Query-key factories
//!
//! Hierarchical, ordered keys per domain. Prefix segments allow
//! coarse-grained invalidation (every alert list for a user, every series
//! range for a code) without enumerating specific keys. A key must encode
//! every parameter that affects the fetched result, so distinct queries
//! never collide.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered cache key. Value-equal for the same logical resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix` matches this key's leading segments.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

pub mod series_keys {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["series"])
    }

    pub fn latest(code: &str) -> QueryKey {
        QueryKey::new(["series", "latest", code])
    }

    pub fn range(code: &str, start: &str, end: &str) -> QueryKey {
        QueryKey::new(["series", "range", code, start, end])
    }

    /// Indicator cards cache the transformed model, not the raw
    /// observation, so they live under their own segment.
    pub fn indicator(code: &str) -> QueryKey {
        QueryKey::new(["series", "indicator", code])
    }

    pub fn indicator_range(code: &str, start: &str, end: &str) -> QueryKey {
        QueryKey::new(["series", "indicator", code, start, end])
    }

    pub fn metadata(code: &str) -> QueryKey {
        QueryKey::new(["series", "metadata", code])
    }

    pub fn all_metadata() -> QueryKey {
        QueryKey::new(["series", "metadata"])
    }
}

pub mod quote_keys {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["quotes"])
    }

    pub fn current() -> QueryKey {
        QueryKey::new(["quotes", "current"])
    }

    pub fn historical(casa: &str, start: &str, end: &str) -> QueryKey {
        QueryKey::new(["quotes", "historical", casa, start, end])
    }
}

pub mod crypto_keys {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["crypto"])
    }

    pub fn prices() -> QueryKey {
        QueryKey::new(["crypto", "prices"])
    }

    pub fn klines(
        symbol: &str,
        interval: &str,
        limit: Option<u32>,
        start: Option<i64>,
        end: Option<i64>,
    ) -> QueryKey {
        QueryKey::new([
            "crypto".to_string(),
            "klines".to_string(),
            symbol.to_string(),
            interval.to_string(),
            limit.map(|v| v.to_string()).unwrap_or_default(),
            start.map(|v| v.to_string()).unwrap_or_default(),
            end.map(|v| v.to_string()).unwrap_or_default(),
        ])
    }
}

pub mod news_keys {
    use super::QueryKey;

    pub fn all() -> QueryKey {
        QueryKey::new(["news"])
    }

    pub fn page(limit: u32, offset: u32) -> QueryKey {
        QueryKey::new([
            "news".to_string(),
            "page".to_string(),
            limit.to_string(),
            offset.to_string(),
        ])
    }
}

pub mod alerts_keys {
    use super::QueryKey;

    pub fn all(user_id: &str) -> QueryKey {
        QueryKey::new(["alerts", user_id])
    }

    pub fn list(user_id: &str) -> QueryKey {
        QueryKey::new(["alerts", user_id, "list"])
    }

    pub fn events(user_id: &str, alert_id: &str) -> QueryKey {
        QueryKey::new(["alerts", user_id, "events", alert_id])
    }

    pub fn configs() -> QueryKey {
        QueryKey::new(["alert-configs"])
    }
}
