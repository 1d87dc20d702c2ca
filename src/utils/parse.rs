use serde::{Deserialize, Deserializer};

/// Parse a float the way form input arrives: trimmed, comma accepted as the
/// decimal separator. Anything unparseable or non-finite is `None`.
pub fn parse_float(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Serde helper for optional numeric fields that clients send either as JSON
/// numbers or as strings. Values that do not parse become `None` instead of
/// rejecting the whole request.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(serde_json::Value::String(s)) => parse_float(&s),
        _ => None,
    })
}
