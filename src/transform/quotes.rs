//! Quote-row transform
//!
//! Maps raw `{casa, nombre, compra, venta, fecha}` rows to the `Quote` view
//! model. A quote's `id` is derived from its source key so it stays stable
//! across polling cycles; `category` decides which screen section and filter
//! tab the quote appears under.

use crate::api::types::QuoteRow;
use crate::transform::format::{format_ars, NO_DATA};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteCategory {
    Dolares,
    Acciones,
    Bonos,
    Cripto,
}

/// Price change relative to the previous observation. `Unknown` is the
/// explicit "no previous value available" state; it is never rendered as a
/// zero change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum QuoteChange {
    Known { change: f64, change_percent: f64 },
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Stable across polling cycles; derived from the source key.
    pub id: String,
    pub name: String,
    pub buy_price: String,
    pub sell_price: String,
    pub change: QuoteChange,
    pub last_update: String,
    pub category: QuoteCategory,
}

/// Classify a source key into a screen section.
pub fn categorize(casa: &str) -> QuoteCategory {
    match casa.to_lowercase().as_str() {
        "oficial" | "blue" | "mep" | "bolsa" | "ccl" | "contadoconliqui" | "tarjeta"
        | "mayorista" | "cripto" | "solidario" => QuoteCategory::Dolares,
        "merval" | "merval-usd" | "sp500" | "nasdaq" | "dow" => QuoteCategory::Acciones,
        "al30" | "gd30" | "al35" | "gd35" | "ae38" | "bonar" => QuoteCategory::Bonos,
        "btc" | "eth" | "usdt" | "dai" | "sol" => QuoteCategory::Cripto,
        _ => QuoteCategory::Dolares,
    }
}

/// Transform raw rows, computing change against `previous` sell prices when
/// the caller supplies them. This layer has no access to prior state on its
/// own, so rows without a previous value get `QuoteChange::Unknown`.
pub fn quote_rows_to_quotes(
    rows: &[QuoteRow],
    previous: Option<&HashMap<String, f64>>,
) -> Vec<Quote> {
    rows.iter()
        .map(|row| {
            let change = match (row.venta, previous.and_then(|p| p.get(&row.casa))) {
                (Some(current), Some(prev)) if *prev != 0.0 => QuoteChange::Known {
                    change: current - prev,
                    change_percent: (current - prev) / prev.abs() * 100.0,
                },
                _ => QuoteChange::Unknown,
            };

            Quote {
                id: row.casa.clone(),
                name: row.nombre.clone(),
                buy_price: row.compra.map(format_ars).unwrap_or_else(|| NO_DATA.into()),
                sell_price: row.venta.map(format_ars).unwrap_or_else(|| NO_DATA.into()),
                change,
                last_update: row.fecha.clone(),
                category: categorize(&row.casa),
            }
        })
        .collect()
}

/// Quotes in `category`, original relative order preserved.
pub fn filter_by_category(quotes: &[Quote], category: QuoteCategory) -> Vec<Quote> {
    quotes
        .iter()
        .filter(|q| q.category == category)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(casa: &str, nombre: &str, venta: Option<f64>) -> QuoteRow {
        QuoteRow {
            casa: casa.into(),
            nombre: nombre.into(),
            compra: venta.map(|v| v - 40.0),
            venta,
            fecha: "2026-08-20T15:00:00-03:00".into(),
        }
    }

    #[test]
    fn ids_stay_stable_across_cycles() {
        let rows = vec![row("blue", "Dólar Blue", Some(1220.0))];
        let first = quote_rows_to_quotes(&rows, None);
        let second = quote_rows_to_quotes(&rows, None);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[0].id, "blue");
    }

    #[test]
    fn change_is_unknown_without_previous_value() {
        let rows = vec![row("blue", "Dólar Blue", Some(1220.0))];
        let quotes = quote_rows_to_quotes(&rows, None);
        assert_eq!(quotes[0].change, QuoteChange::Unknown);
    }

    #[test]
    fn change_computed_against_previous() {
        let rows = vec![row("blue", "Dólar Blue", Some(1220.0))];
        let mut previous = HashMap::new();
        previous.insert("blue".to_string(), 1200.0);

        let quotes = quote_rows_to_quotes(&rows, Some(&previous));
        match quotes[0].change {
            QuoteChange::Known {
                change,
                change_percent,
            } => {
                assert!((change - 20.0).abs() < 1e-9);
                assert!((change_percent - 20.0 / 1200.0 * 100.0).abs() < 1e-9);
            }
            QuoteChange::Unknown => panic!("expected known change"),
        }
    }

    #[test]
    fn missing_price_renders_no_data() {
        let rows = vec![row("mep", "MEP", None)];
        let quotes = quote_rows_to_quotes(&rows, None);
        assert_eq!(quotes[0].sell_price, NO_DATA);
    }

    #[test]
    fn category_filter_preserves_order() {
        let rows = vec![
            row("blue", "Dólar Blue", Some(1220.0)),
            row("merval", "Merval", Some(1_900_000.0)),
            row("oficial", "Dólar Oficial", Some(1030.0)),
            row("al30", "AL30", Some(58.0)),
            row("mep", "Dólar MEP", Some(1195.0)),
            row("btc", "Bitcoin", Some(67_000.0)),
        ];
        let quotes = quote_rows_to_quotes(&rows, None);
        let dolares = filter_by_category(&quotes, QuoteCategory::Dolares);

        let ids: Vec<&str> = dolares.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["blue", "oficial", "mep"]);
    }
}
