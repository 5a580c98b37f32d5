use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Parse a loosely formatted amount into a Decimal.
///
/// Handles formats like:
/// - "2.5" -> 2.5
/// - "1,500.00" -> 1500.00 (comma is a thousands separator)
/// - "PHP 1,800" / "₱1800" -> 1800
/// - "3 bags" -> 3 (trailing unit text is ignored)
/// - "", "-", "n/a" -> None
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let mut s = s.trim();
    for prefix in ["PHP", "Php", "php", "₱"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }

    let numeric: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | 'e' | 'E'))
        .filter(|c| *c != ',')
        .collect();
    let numeric = numeric.trim_end_matches(['e', 'E', '.', '-', '+']);
    if numeric.is_empty() || numeric == "-" || numeric == "+" {
        return None;
    }

    Decimal::from_str(numeric)
        .or_else(|_| Decimal::from_scientific(numeric))
        .ok()
}

/// Read a JSON number or numeric string as a Decimal.
pub fn value_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Read a JSON string, number or bool as display text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize an object key for alias matching: lowercase ASCII
/// alphanumerics only, so `saPagtanim`, `sa_pagtanim` and `Sa Pagtanim`
/// compare equal.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Find a field of `object` by normalized key. Earlier aliases win.
pub fn field<'a>(
    object: &'a serde_json::Map<String, Value>,
    aliases: &[&str],
) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        object
            .iter()
            .find(|(key, value)| normalize_key(key) == *alias && !value.is_null())
            .map(|(_, value)| value)
    })
}
