//! Cell parsing helpers shared by the loader and query layers.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses a date or datetime string into a calendar date.
///
/// Accepts ISO dates (`2023-01-31`), ISO datetimes with or without a `T`
/// separator, and the US-style `01/31/2023 07:05:00 PM` used by the City of
/// Chicago crash exports. The time of day is discarded.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parses a non-negative count. Empty and unparseable cells read as zero.
///
/// Exports sometimes write integer columns as floats (`2.0`), so a float
/// fallback is accepted and truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_count(s: &str) -> u32 {
    let s = s.trim();
    if let Ok(v) = s.parse::<u32>() {
        return v;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v as u32,
        _ => 0,
    }
}

/// Parses a finite float, returning `None` for empty or invalid cells.
#[must_use]
pub fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Returns `None` for empty cells, otherwise the trimmed text.
#[must_use]
pub fn parse_text(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_owned())
    }
}

/// Converts a raw CSV cell to the most specific JSON value.
///
/// Integers become integers, other finite numbers become floats, empty
/// cells become `null` and everything else stays a string.
#[must_use]
pub fn cell_to_json(s: &str) -> serde_json::Value {
    let s = s.trim();
    if s.is_empty() {
        return serde_json::Value::Null;
    }
    if let Ok(v) = s.parse::<i64>() {
        return serde_json::Value::from(v);
    }
    if let Some(v) = parse_f64(s)
        && let Some(n) = serde_json::Number::from_f64(v)
    {
        return serde_json::Value::Number(n);
    }
    serde_json::Value::String(s.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_date() {
        let date = parse_date("2023-03-31").unwrap();
        assert_eq!(date.to_string(), "2023-03-31");
    }

    #[test]
    fn parses_chicago_datetime() {
        let date = parse_date("09/05/2023 07:05:00 PM").unwrap();
        assert_eq!(date.to_string(), "2023-09-05");
    }

    #[test]
    fn parses_iso_datetime() {
        assert_eq!(
            parse_date("2024-01-15T14:30:00").unwrap().to_string(),
            "2024-01-15"
        );
        assert_eq!(
            parse_date("2024-01-15 14:30:00").unwrap().to_string(),
            "2024-01-15"
        );
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_date("not-a-date").is_none());
        assert!(parse_date("2023-13-01").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn counts_accept_float_text() {
        assert_eq!(parse_count("2"), 2);
        assert_eq!(parse_count("2.0"), 2);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("n/a"), 0);
        assert_eq!(parse_count("-1"), 0);
    }

    #[test]
    fn cells_become_typed_json() {
        assert_eq!(cell_to_json("42"), serde_json::json!(42));
        assert_eq!(cell_to_json("41.5"), serde_json::json!(41.5));
        assert_eq!(cell_to_json(""), serde_json::Value::Null);
        assert_eq!(cell_to_json("DAYLIGHT"), serde_json::json!("DAYLIGHT"));
        assert_eq!(cell_to_json("NaN"), serde_json::json!("NaN"));
    }
}
