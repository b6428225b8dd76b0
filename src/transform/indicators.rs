//! Series-to-indicator transform
//!
//! Maps one economic-series observation to the card view model. Display
//! metadata is keyed by series code; unknown codes fall back to a readable
//! name derived from the code itself.

use crate::api::types::SeriesObservation;
use crate::transform::format::{
    format_ars, format_localized, format_percent, format_usd, parse_decimal, NO_DATA,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// How a series value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorUnit {
    Percent,
    Ars,
    Usd,
    Index,
}

/// Named macroeconomic metric derived from a series observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub code: String,
    pub name: String,
    /// Locale-formatted value, or the no-data marker.
    pub display_value: String,
    pub change_percent: Option<f64>,
    pub trend: Trend,
    pub obs_time: String,
}

/// Display metadata for the series codes the dashboard knows about.
fn display_meta(code: &str) -> (&'static str, IndicatorUnit) {
    match code {
        "IPC_VARIACION_MENSUAL" => ("Inflación mensual", IndicatorUnit::Percent),
        "IPC_VARIACION_INTERANUAL" => ("Inflación interanual", IndicatorUnit::Percent),
        "TASA_POLITICA_MONETARIA" => ("Tasa de política monetaria", IndicatorUnit::Percent),
        "EMAE_VARIACION_INTERANUAL" => ("Actividad económica (EMAE)", IndicatorUnit::Percent),
        "DESEMPLEO" => ("Desempleo", IndicatorUnit::Percent),
        "RIESGO_PAIS" => ("Riesgo país", IndicatorUnit::Index),
        "RESERVAS_INTERNACIONALES" => ("Reservas internacionales", IndicatorUnit::Usd),
        "DOLAR_OFICIAL" => ("Dólar oficial", IndicatorUnit::Ars),
        "DOLAR_BLUE" => ("Dólar blue", IndicatorUnit::Ars),
        _ => ("", IndicatorUnit::Index),
    }
}

/// Readable fallback name: `SALARIO_MINIMO` -> `Salario minimo`.
fn name_from_code(code: &str) -> String {
    let lowered = code.to_lowercase().replace('_', " ");
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lowered,
    }
}

/// Trend derives strictly from the sign of the change, never its magnitude.
pub fn trend_from_change(change_percent: Option<f64>) -> Trend {
    match change_percent {
        Some(v) if v > 0.0 => Trend::Up,
        Some(v) if v < 0.0 => Trend::Down,
        _ => Trend::Neutral,
    }
}

/// Percent change between two observations' parsed values.
pub fn change_percent(current: &SeriesObservation, previous: &SeriesObservation) -> Option<f64> {
    let current = parse_decimal(&current.value)?;
    let previous = parse_decimal(&previous.value)?;
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous.abs() * 100.0)
}

/// Build the indicator card model. A malformed `value` renders as the
/// no-data marker; it is never coerced to zero.
pub fn series_to_indicator(
    observation: &SeriesObservation,
    change_percent: Option<f64>,
) -> Indicator {
    let code = observation.internal_series_code.as_str();
    let (name, unit) = display_meta(code);
    let name = if name.is_empty() {
        name_from_code(code)
    } else {
        name.to_string()
    };

    let display_value = match parse_decimal(&observation.value) {
        Some(value) => match unit {
            IndicatorUnit::Percent => format_percent(value),
            IndicatorUnit::Ars => format_ars(value),
            IndicatorUnit::Usd => format_usd(value),
            IndicatorUnit::Index => format_localized(value, 0),
        },
        None => NO_DATA.to_string(),
    };

    Indicator {
        code: code.to_string(),
        name,
        display_value,
        change_percent,
        trend: trend_from_change(change_percent),
        obs_time: observation.obs_time.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(code: &str, value: &str) -> SeriesObservation {
        SeriesObservation {
            internal_series_code: code.into(),
            obs_time: "2026-07-01T00:00:00-03:00".into(),
            value: value.into(),
            unit: None,
            frequency: None,
        }
    }

    #[test]
    fn trend_matches_change_sign_exactly() {
        assert_eq!(trend_from_change(Some(0.0001)), Trend::Up);
        assert_eq!(trend_from_change(Some(-0.0001)), Trend::Down);
        assert_eq!(trend_from_change(Some(0.0)), Trend::Neutral);
        assert_eq!(trend_from_change(None), Trend::Neutral);
        // Magnitude is irrelevant
        assert_eq!(trend_from_change(Some(900.0)), Trend::Up);
    }

    #[test]
    fn known_code_formats_per_unit() {
        let indicator =
            series_to_indicator(&observation("IPC_VARIACION_MENSUAL", "4.2"), Some(0.5));
        assert_eq!(indicator.name, "Inflación mensual");
        assert_eq!(indicator.display_value, "+4,2%");
        assert_eq!(indicator.trend, Trend::Up);

        let indicator = series_to_indicator(&observation("RIESGO_PAIS", "1520"), Some(-2.0));
        assert_eq!(indicator.display_value, "1.520");
        assert_eq!(indicator.trend, Trend::Down);

        let indicator = series_to_indicator(&observation("DOLAR_BLUE", "1220.5"), None);
        assert_eq!(indicator.display_value, "$ 1.220,50");
        assert_eq!(indicator.trend, Trend::Neutral);
    }

    #[test]
    fn malformed_value_renders_no_data_marker() {
        for bad in ["", "  ", "NaN", "n/a", "inf"] {
            let indicator = series_to_indicator(&observation("RIESGO_PAIS", bad), None);
            assert_eq!(indicator.display_value, NO_DATA, "input {:?}", bad);
        }
    }

    #[test]
    fn unknown_code_gets_readable_name() {
        let indicator = series_to_indicator(&observation("SALARIO_MINIMO", "250000"), None);
        assert_eq!(indicator.name, "Salario minimo");
    }

    #[test]
    fn change_percent_between_observations() {
        let previous = observation("IPC", "4.0");
        let current = observation("IPC", "4.2");
        let change = change_percent(&current, &previous).unwrap();
        assert!((change - 5.0).abs() < 1e-9);

        // Division by zero and malformed inputs are "no change known"
        assert_eq!(change_percent(&current, &observation("IPC", "0")), None);
        assert_eq!(change_percent(&current, &observation("IPC", "x")), None);
    }
}
