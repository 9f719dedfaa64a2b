/// Utility helpers shared by collectors and the combiner.
///
/// This module contains:
/// - Numeric field parsing for scraped page text
/// - Order timestamp to date parsing
///
/// IMPORTANT:
/// - No storefront-specific logic should live here.
/// - This module must remain lightweight and deterministic.
///
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Largest value accepted from a scraped numeric field.
///
/// Fifteen digits of KRW. Anything larger is page noise (concatenated
/// cells, phone numbers) and is treated as unparseable.
pub const MAX_SCRAPED_VALUE: i64 = 999_999_999_999_999;

/// Parse a scraped numeric field.
///
/// Every non-digit character is stripped before parsing, so
/// "₩31,800" and "31800원" both become 31800. Anything that does
/// not leave a parseable number, or exceeds `MAX_SCRAPED_VALUE`,
/// yields `None`.
///
/// JSON numbers are accepted as magnitudes (sign dropped, fractions
/// truncated).
pub fn parse_digits(value: &Value) -> Option<i64> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => i64::try_from(v.unsigned_abs()).ok(),
            None => n
                .as_u64()
                .and_then(|v| i64::try_from(v).ok())
                .or_else(|| {
                    n.as_f64()
                        .map(|f| f.trunc().abs())
                        .filter(|f| *f <= MAX_SCRAPED_VALUE as f64)
                        .map(|f| f as i64)
                }),
        },
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse::<i64>().ok()
        }
        _ => None,
    };

    parsed.filter(|v| *v <= MAX_SCRAPED_VALUE)
}

/// Numeric field with the default of 0.
pub fn parse_amount(value: &Value) -> i64 {
    parse_digits(value).unwrap_or(0)
}

/// Quantity field. Missing, unparseable or zero quantities count as 1.
pub fn parse_quantity(value: &Value) -> u32 {
    parse_digits(value)
        .and_then(|q| u32::try_from(q).ok())
        .filter(|q| *q > 0)
        .unwrap_or(1)
}

/// Formats accepted for order timestamps, most specific first.
///
/// Admin consoles render dates in several ways; these cover the
/// ISO-like forms and the dotted Korean form ("2026.10.18 08:12").
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// Extract the calendar date of an order timestamp.
///
/// Returns `None` when the text is not a recognised date; such orders
/// are left out of the weekly series.
pub fn parse_order_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    // Date-only text, or a date followed by something we do not parse
    // (weekday suffix, fractional seconds).
    let head = raw.get(..10).unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_digits_strips_currency_text() {
        assert_eq!(parse_digits(&json!("₩31,800")), Some(31_800));
        assert_eq!(parse_digits(&json!("12,000원")), Some(12_000));
        assert_eq!(parse_digits(&json!(4500)), Some(4500));
        assert_eq!(parse_digits(&json!("없음")), None);
        assert_eq!(parse_digits(&json!(null)), None);
    }

    #[test]
    fn test_parse_digits_extreme_values() {
        assert_eq!(parse_digits(&json!(i64::MIN)), None);
        assert_eq!(parse_digits(&json!(-1e19)), None);
        assert_eq!(parse_digits(&json!(u64::MAX)), None);
        assert_eq!(parse_digits(&json!(-4500)), Some(4500));
        assert_eq!(parse_digits(&json!(12.9)), Some(12));
        assert_eq!(parse_digits(&json!("9223372036854775807")), None);
        assert_eq!(parse_digits(&json!("99999999999999999999999")), None);
        assert_eq!(
            parse_digits(&json!(MAX_SCRAPED_VALUE)),
            Some(MAX_SCRAPED_VALUE)
        );
        assert_eq!(parse_amount(&json!(i64::MIN)), 0);
        assert_eq!(parse_quantity(&json!(-1e19)), 1);
    }

    #[test]
    fn test_parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount(&json!("-")), 0);
        assert_eq!(parse_amount(&json!(true)), 0);
    }

    #[test]
    fn test_parse_quantity_defaults_to_one() {
        assert_eq!(parse_quantity(&json!("3개")), 3);
        assert_eq!(parse_quantity(&json!("")), 1);
        assert_eq!(parse_quantity(&json!(0)), 1);
        assert_eq!(parse_quantity(&Value::Null), 1);
    }

    #[test]
    fn test_parse_order_date_formats() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(parse_order_date("2026-10-18 08:12:45"), Some(day));
        assert_eq!(parse_order_date("2026-10-18 08:12"), Some(day));
        assert_eq!(parse_order_date("2026.10.18 08:12"), Some(day));
        assert_eq!(parse_order_date("2026-10-18T08:12:45+09:00"), Some(day));
        assert_eq!(parse_order_date("2026-10-18"), Some(day));
        assert_eq!(parse_order_date("2026-10-18 (토)"), Some(day));
    }

    #[test]
    fn test_parse_order_date_rejects_garbage() {
        assert_eq!(parse_order_date(""), None);
        assert_eq!(parse_order_date("어제"), None);
        assert_eq!(parse_order_date("10/18"), None);
    }
}
