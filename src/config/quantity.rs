//! Kubernetes resource quantity parsing
//!
//! Accepts the canonical quantity grammar: an optionally signed decimal
//! number followed by a binary SI suffix (`Ki`..`Ei`), a decimal SI suffix
//! (`n`, `u`, `m`, `k`, `M`..`E`) or a decimal exponent (`e3`, `E-2`).

use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde_json::Value;

/// Parse a quantity string (e.g. "2m", "3Mi", "4Gi", "1e3") into its value
/// in base units.
pub fn parse_quantity(s: &str) -> Result<f64> {
    if s.is_empty() {
        return Err(Error::ConfigParse("empty quantity string".into()));
    }

    let (sign, unsigned) = match s.as_bytes()[0] {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };

    // Find where the number ends and suffix begins
    let num_end = unsigned
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(unsigned.len());

    let num_str = &unsigned[..num_end];
    let suffix = &unsigned[num_end..];

    if num_str.is_empty() || num_str == "." || num_str.matches('.').count() > 1 {
        return Err(Error::ConfigParse(format!(
            "quantity {:?} has no valid number",
            s
        )));
    }

    let num: f64 = num_str
        .parse()
        .map_err(|_| Error::ConfigParse(format!("quantity {:?} has no valid number", s)))?;

    let multiplier = suffix_multiplier(suffix)
        .ok_or_else(|| Error::ConfigParse(format!("quantity {:?} has unknown suffix", s)))?;

    Ok(sign * num * multiplier)
}

/// Validate a quantity taken from config, naming the field on failure
pub fn validate_quantity(field: &str, quantity: &Quantity) -> Result<()> {
    parse_quantity(&quantity.0).map(|_| ()).map_err(|e| match e {
        Error::ConfigParse(reason) => Error::ConfigParse(format!("{}: {}", field, reason)),
        other => other,
    })
}

/// Rewrite a raw JSON quantity into the string form `Quantity` decodes.
///
/// Bare numbers (`2`, `0.5`) become strings and padded strings are trimmed.
/// Anything else is left for the decoder to reject.
pub fn normalize_quantity(value: &mut Value) {
    let normalized = match value {
        Value::Number(number) => number.to_string(),
        Value::String(raw) => raw.trim().to_string(),
        _ => return,
    };
    *value = Value::String(normalized);
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let multiplier = match suffix {
        "" => 1.0,
        // Binary SI
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        // Decimal SI
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        _ => return decimal_exponent(suffix),
    };
    Some(multiplier)
}

fn decimal_exponent(suffix: &str) -> Option<f64> {
    let exponent = suffix.strip_prefix(['e', 'E'])?;
    let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let exponent: i32 = exponent.parse().ok()?;
    Some(10f64.powi(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("100").unwrap(), 100.0);
        assert_eq!(parse_quantity("2m").unwrap(), 0.002);
        assert_eq!(parse_quantity("500m").unwrap(), 0.5);
        assert_eq!(parse_quantity("3Mi").unwrap(), 3.0 * 1024.0 * 1024.0);
        assert_eq!(parse_quantity("4Gi").unwrap(), 4.0 * 1024.0 * 1024.0 * 1024.0);
        assert_eq!(parse_quantity("1k").unwrap(), 1000.0);
        assert_eq!(parse_quantity("1.5G").unwrap(), 1.5e9);
        assert_eq!(parse_quantity("1e3").unwrap(), 1000.0);
        assert_eq!(parse_quantity("1E+2").unwrap(), 100.0);
        assert_eq!(parse_quantity(".5").unwrap(), 0.5);
        assert_eq!(parse_quantity("+1").unwrap(), 1.0);
        assert_eq!(parse_quantity("-1").unwrap(), -1.0);
    }

    #[test]
    fn test_parse_quantity_invalid() {
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("invalid").is_err());
        assert!(parse_quantity("100X").is_err());
        assert!(parse_quantity("1gi").is_err());
        assert!(parse_quantity("1.2.3").is_err());
        assert!(parse_quantity("Mi").is_err());
        assert!(parse_quantity("1e").is_err());
        assert!(parse_quantity(" 1").is_err());
        assert!(parse_quantity("1 Gi").is_err());
    }

    #[test]
    fn test_validate_quantity_names_field() {
        let err = validate_quantity("resource.limits.cpu", &Quantity("invalid".into()))
            .unwrap_err();
        assert_matches!(err, Error::ConfigParse(ref msg) if msg.starts_with("resource.limits.cpu"));
    }

    #[test]
    fn test_validate_quantity_message_prefixed_once() {
        let err = validate_quantity("resource.limits.cpu", &Quantity("2x".into())).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Suggestion config parse error: resource.limits.cpu: quantity "2x" has unknown suffix"#
        );
    }

    #[test]
    fn test_normalize_quantity() {
        let mut value = serde_json::json!(2);
        normalize_quantity(&mut value);
        assert_eq!(value, serde_json::json!("2"));

        let mut value = serde_json::json!(0.5);
        normalize_quantity(&mut value);
        assert_eq!(value, serde_json::json!("0.5"));

        let mut value = serde_json::json!(" 2m\n");
        normalize_quantity(&mut value);
        assert_eq!(value, serde_json::json!("2m"));

        let mut value = serde_json::json!({"nested": "2m"});
        normalize_quantity(&mut value);
        assert_eq!(value, serde_json::json!({"nested": "2m"}));
    }
}
