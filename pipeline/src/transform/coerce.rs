//! Cell coercion: time-of-day parsing and locale-tolerant numbers.
//!
//! Both functions report failure through the type system instead of a NaN
//! sentinel, so callers cannot forget to filter.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[+-]?\d+").expect("valid regex"));

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

/// Why a timestamp cell was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("timestamp is not text")]
    NotText,

    #[error("no time after the date in '{0}'")]
    MissingTime(String),

    #[error("time '{0}' needs at least hours and minutes")]
    TooFewParts(String),

    #[error("'{0}' is not a number")]
    InvalidComponent(String),

    #[error("time '{0}' is outside 00:00:00-23:59:59")]
    OutOfRange(String),
}

/// Parse a `"<date> HH:MM[:SS]"` cell into milliseconds since midnight.
///
/// The date part is ignored. Anything that is not a JSON string fails with
/// [`TimeParseError::NotText`].
pub fn parse_time_of_day(value: &Value) -> Result<u32, TimeParseError> {
    match value {
        Value::String(text) => parse_time_text(text),
        _ => Err(TimeParseError::NotText),
    }
}

/// Text form of [`parse_time_of_day`].
pub fn parse_time_text(text: &str) -> Result<u32, TimeParseError> {
    let time_part = text
        .split(' ')
        .nth(1)
        .ok_or_else(|| TimeParseError::MissingTime(text.to_string()))?;

    let parts: Vec<&str> = time_part.split(':').collect();
    if parts.len() < 2 {
        return Err(TimeParseError::TooFewParts(time_part.to_string()));
    }

    let hours = leading_int(parts[0])?;
    let minutes = leading_int(parts[1])?;
    let seconds = match parts.get(2) {
        Some(s) => leading_int(s)?,
        None => 0,
    };

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(TimeParseError::OutOfRange(time_part.to_string()));
    }

    // Bounded by the range check above: at most 86_399_000.
    Ok(((hours * 3600 + minutes * 60 + seconds) * 1000) as u32)
}

/// Integer at the start of `s`, ignoring trailing garbage ("00.500" -> 0).
fn leading_int(s: &str) -> Result<i64, TimeParseError> {
    LEADING_INT
        .find(s)
        .and_then(|m| m.as_str().trim().parse::<i64>().ok())
        .ok_or_else(|| TimeParseError::InvalidComponent(s.to_string()))
}

/// Coerce a cell to a finite number.
///
/// Numbers pass through. Text has its first decimal comma turned into a
/// period and the leading float is read, so `"230,5"` and `"231,2 V"` both
/// work. Null, empty, non-numeric and non-finite values give `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(&s.replacen(',', ".", 1)),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

fn leading_float(s: &str) -> Option<f64> {
    LEADING_FLOAT
        .find(s)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_timestamp() {
        assert_eq!(parse_time_text("01/01/2024 09:15:00"), Ok(33_300_000));
        assert_eq!(parse_time_text("2024-01-01 23:59:59"), Ok(86_399_000));
        assert_eq!(parse_time_text("01/01/2024 00:00:00"), Ok(0));
    }

    #[test]
    fn test_parse_without_seconds() {
        assert_eq!(parse_time_text("01/01/2024 09:15"), Ok(33_300_000));
    }

    #[test]
    fn test_fractional_seconds_truncated() {
        assert_eq!(parse_time_text("01/01/2024 00:00:07.250"), Ok(7_000));
    }

    #[test]
    fn test_date_only_rejected() {
        assert!(matches!(
            parse_time_text("2024-01-01"),
            Err(TimeParseError::MissingTime(_))
        ));
    }

    #[test]
    fn test_too_few_parts_rejected() {
        assert!(matches!(
            parse_time_text("01/01/2024 0915"),
            Err(TimeParseError::TooFewParts(_))
        ));
    }

    #[test]
    fn test_double_space_rejected() {
        assert!(parse_time_text("01/01/2024  09:15:00").is_err());
    }

    #[test]
    fn test_garbage_component_rejected() {
        assert!(matches!(
            parse_time_text("01/01/2024 xx:15:00"),
            Err(TimeParseError::InvalidComponent(_))
        ));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            parse_time_text("01/01/2024 24:00:00"),
            Err(TimeParseError::OutOfRange(_))
        ));
        assert!(parse_time_text("01/01/2024 -1:00:00").is_err());
        assert!(parse_time_text("01/01/2024 10:75").is_err());
    }

    #[test]
    fn test_non_text_rejected() {
        assert_eq!(parse_time_of_day(&json!(33300000)), Err(TimeParseError::NotText));
        assert_eq!(parse_time_of_day(&Value::Null), Err(TimeParseError::NotText));
    }

    #[test]
    fn test_coerce_decimal_comma() {
        assert_eq!(coerce_number(&json!("230,5")), Some(230.5));
        assert_eq!(coerce_number(&json!("231.2")), Some(231.2));
    }

    #[test]
    fn test_coerce_keeps_numbers() {
        assert_eq!(coerce_number(&json!(0.97)), Some(0.97));
        assert_eq!(coerce_number(&json!(12)), Some(12.0));
    }

    #[test]
    fn test_coerce_leading_number_with_unit() {
        assert_eq!(coerce_number(&json!("231,2 V")), Some(231.2));
        assert_eq!(coerce_number(&json!("-4,5")), Some(-4.5));
    }

    #[test]
    fn test_coerce_rejects_non_numbers() {
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!("n/a")), None);
        assert_eq!(coerce_number(&Value::Null), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }
}
