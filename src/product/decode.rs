//! Lenient field decoders for catalog payloads
//!
//! The catalog API is loose about scalar types: prices arrive as numbers or
//! numeric strings, articles as strings or numbers.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A decimal sent either as a JSON number or as a numeric string
pub fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("decimal out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid decimal '{}'", s))),
        other => Err(D::Error::custom(format!("expected a decimal, got {}", other))),
    }
}

/// Optional text; numbers and booleans are rendered, objects yield their `title` or `name`
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Array(_) => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map
            .get("title")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Keeps any present value, `null` included; pair with `#[serde(default)]` to tell absence apart
pub fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Treats an explicit `null` like an absent field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
