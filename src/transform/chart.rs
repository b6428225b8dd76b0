//! Chart-point transforms
//!
//! Series observations and klines map to `(timestamp, value)` points. Order
//! is preserved exactly as returned by the API (chronological); there is no
//! client-side re-sort. Points with malformed values or timestamps are
//! skipped, never zero-filled.

use crate::api::types::{Kline, SeriesObservation};
use crate::transform::format::parse_decimal;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// One chart point. `ts` is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub ts: i64,
    pub value: f64,
}

/// Economic-series observations to chart points.
pub fn series_to_chart(observations: &[SeriesObservation]) -> Vec<ChartPoint> {
    observations
        .iter()
        .filter_map(|obs| {
            let value = parse_decimal(&obs.value)?;
            let ts = DateTime::parse_from_rfc3339(&obs.obs_time)
                .ok()?
                .timestamp_millis();
            Some(ChartPoint { ts, value })
        })
        .collect()
}

/// Klines to chart points: close price at open time.
pub fn klines_to_chart(klines: &[Kline]) -> Vec<ChartPoint> {
    klines
        .iter()
        .map(|k| ChartPoint {
            ts: k.open_time,
            value: k.close,
        })
        .collect()
}

/// Historical quote rows to chart points: sell price at quote time. Rows
/// with no sell price or an unparseable timestamp are skipped.
pub fn quote_rows_to_chart(rows: &[crate::api::types::QuoteRow]) -> Vec<ChartPoint> {
    rows.iter()
        .filter_map(|row| {
            let value = row.venta?;
            let ts = DateTime::parse_from_rfc3339(&row.fecha)
                .ok()?
                .timestamp_millis();
            Some(ChartPoint { ts, value })
        })
        .collect()
}

/// Point whose timestamp is closest to `ts` (nearest-x touch selection).
pub fn nearest_point(points: &[ChartPoint], ts: i64) -> Option<&ChartPoint> {
    points.iter().min_by_key(|p| (p.ts - ts).abs())
}
