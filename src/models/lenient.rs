//! Field deserialisers that never fail.
//!
//! Documents written by the web client are loosely typed: numbers arrive as
//! strings, optional fields go missing or turn up as `null`. Each helper here
//! accepts whatever JSON is present and falls back to the field's default.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn any<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer)
}

/// Finite, non-negative numeric reading of a JSON number or numeric string
pub(crate) fn non_negative(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match any(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match any(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

pub(crate) fn u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = any(deserializer)?;
    if let Some(n) = value.as_ref().and_then(Value::as_u64) {
        return Ok(n);
    }
    Ok(value
        .as_ref()
        .and_then(non_negative)
        .map(|n| n.trunc() as u64)
        .unwrap_or(0))
}

pub(crate) fn u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_u32(deserializer)?.unwrap_or(0))
}

pub(crate) fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(any(deserializer)?
        .as_ref()
        .and_then(non_negative)
        .map(|n| n.trunc().min(u32::MAX as f64) as u32))
}

pub(crate) fn f32<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(any(deserializer)?
        .as_ref()
        .and_then(non_negative)
        .map(|n| n as f32)
        .unwrap_or(0.0))
}

/// RFC 3339 string, epoch seconds, or a `{ seconds, nanoseconds }` object
pub(crate) fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(any(deserializer)?.as_ref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0),
        Value::Object(map) => {
            let seconds = map.get("seconds").or_else(|| map.get("_seconds"))?.as_i64()?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, nanos.min(999_999_999) as u32)
        }
        _ => None,
    }
}

/// Any `Deserialize + Default` type, defaulting when the value doesn't fit
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(any(deserializer)?
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}
