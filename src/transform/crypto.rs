//! Crypto price-direction tracking
//!
//! Direction compares each fetch against the immediately preceding value for
//! the same symbol. The tracker is owned by a single poller instance, not
//! shared cache state, so one subscriber's history can't bleed into
//! another's.

use crate::api::types::CryptoPrice;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    Neutral,
}

/// Live-updating crypto view model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoSnapshot {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent_24h: Option<f64>,
    pub direction: PriceDirection,
}

/// Per-subscription previous-price memory.
#[derive(Debug, Default)]
pub struct DirectionTracker {
    previous: HashMap<String, f64>,
}

impl DirectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direction of `price` relative to the last observed value for
    /// `symbol`. The first observation is always `Neutral`; direction is
    /// never inferred from a 24h change percent.
    pub fn observe(&mut self, symbol: &str, price: f64) -> PriceDirection {
        let direction = match self.previous.get(symbol) {
            None => PriceDirection::Neutral,
            Some(prev) if price > *prev => PriceDirection::Up,
            Some(prev) if price < *prev => PriceDirection::Down,
            Some(_) => PriceDirection::Neutral,
        };
        self.previous.insert(symbol.to_string(), price);
        direction
    }
}

/// Apply the tracker to one poll's worth of prices.
pub fn track_directions(
    tracker: &mut DirectionTracker,
    prices: &[CryptoPrice],
) -> Vec<CryptoSnapshot> {
    prices
        .iter()
        .map(|p| CryptoSnapshot {
            symbol: p.symbol.clone(),
            name: p.name.clone(),
            price: p.price,
            change_percent_24h: p.change_percent_24h,
            direction: tracker.observe(&p.symbol, p.price),
        })
        .collect()
}
