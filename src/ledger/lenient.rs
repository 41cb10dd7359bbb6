//! Forgiving deserializers for snapshot fields.
//!
//! Snapshots come from older installs and from hand-edited exports, so a
//! wrongly typed scalar must not make the whole document unreadable. Values
//! that cannot be interpreted fall back to the field's neutral value; the
//! normalizer cleans up whatever remains.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::prediction::Bag;

/// Accepts numbers, numeric strings and `null` (read as `0`).
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_f64(&value).unwrap_or(0.0))
}

pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_i64(&value).unwrap_or(0))
}

/// Accepts strings and numbers; anything else reads as an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

/// Reads a `map<key, map<inner, count>>` index, dropping counts that are not
/// numeric.
pub fn bag_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Bag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut out = BTreeMap::new();
    for (key, inner) in raw {
        let Value::Object(entries) = inner else {
            continue;
        };
        let bag: Bag = entries
            .into_iter()
            .filter_map(|(label, count)| value_as_i64(&count).map(|count| (label, count)))
            .collect();
        out.insert(key, bag);
    }
    Ok(out)
}

/// Reads a `map<key, string>`, discarding non-string targets.
pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(target) => Some((key, target)),
            _ => None,
        })
        .collect())
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
