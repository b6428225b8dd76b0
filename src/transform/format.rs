//! Argentine-locale number formatting
//!
//! Display formatting uses dot for thousands and comma for decimals
//! ("1.234,56"). Percent formatting always carries an explicit sign for
//! non-negative values.

/// Marker shown when a value cannot be displayed.
pub const NO_DATA: &str = "—";

/// Parse a wire decimal string ("4.2", "-0.5") to a finite float.
/// Empty, non-numeric, NaN, and infinite values are "no data".
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format with Argentine grouping: dot thousands, comma decimals.
pub fn format_localized(value: f64, decimals: usize) -> String {
    let negative = value.is_sign_negative() && value != 0.0;
    let fixed = format!("{:.*}", decimals, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    let digits: Vec<char> = integer.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push(',');
        out.push_str(fraction);
    }
    out
}

/// Peso display string, e.g. `$ 1.234,56`.
pub fn format_ars(value: f64) -> String {
    format!("$ {}", format_localized(value, 2))
}

/// Dollar display string, e.g. `US$ 1.234,56`.
pub fn format_usd(value: f64) -> String {
    format!("US$ {}", format_localized(value, 2))
}

/// Percent display with a leading `+` for non-negative values, one decimal.
pub fn format_percent(value: f64) -> String {
    format_percent_with(value, 1)
}

/// Percent display with an explicit decimal count.
pub fn format_percent_with(value: f64, decimals: usize) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{}{}%", sign, format_localized(value, decimals))
}

/// Strip currency symbols and locale punctuation back to the numeric value.
/// Inverse of the display formatters within float tolerance.
pub fn parse_localized(display: &str) -> Option<f64> {
    let cleaned: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = cleaned.replace('.', "").replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_rejects_malformed() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("  "), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("4.2"), Some(4.2));
        assert_eq!(parse_decimal("-0.5"), Some(-0.5));
    }

    #[test]
    fn localized_grouping() {
        assert_eq!(format_localized(1234567.891, 2), "1.234.567,89");
        assert_eq!(format_localized(999.0, 2), "999,00");
        assert_eq!(format_localized(-1234.5, 2), "-1.234,50");
        assert_eq!(format_localized(0.0, 0), "0");
    }

    #[test]
    fn currency_display() {
        assert_eq!(format_ars(1180.5), "$ 1.180,50");
        assert_eq!(format_usd(42000.0), "US$ 42.000,00");
    }

    #[test]
    fn percent_always_signs_non_negative() {
        assert_eq!(format_percent(4.2), "+4,2%");
        assert_eq!(format_percent(0.0), "+0,0%");
        assert_eq!(format_percent(-1.26), "-1,3%");
        assert_eq!(format_percent_with(-1.25, 2), "-1,25%");
    }

    #[test]
    fn format_parse_round_trip() {
        for value in [0.0, 1.5, 999.99, 1234.56, 1234567.89, -42000.25] {
            let display = format_ars(value);
            let parsed = parse_localized(&display).unwrap();
            assert!(
                (parsed - value).abs() < 0.005,
                "{} -> {} -> {}",
                value,
                display,
                parsed
            );
        }
    }

    #[test]
    fn parse_localized_rejects_garbage() {
        assert_eq!(parse_localized(""), None);
        assert_eq!(parse_localized("sin datos"), None);
        assert_eq!(parse_localized(NO_DATA), None);
    }
}
