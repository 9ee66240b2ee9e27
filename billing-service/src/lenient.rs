//! Serde helpers for backend fields whose JSON type varies between records.
//!
//! Ids arrive as numbers or numeric strings, codes as strings or numbers, and
//! money as integers, floats or strings. Money leaves this crate as a JSON
//! number.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Number or numeric string as `i64`
pub fn value_to_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .and_then(|f| format!("{f:.0}").parse().ok())
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-empty string, or a number rendered as text
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Money from a number or a string such as `"$ 50000"`
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().trim_start_matches('$').replace(' ', ""),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Money as a JSON number: integral amounts stay integers
pub fn decimal_to_json(amount: Decimal) -> Value {
    let normalized = amount.normalize();
    if normalized.scale() == 0 {
        if let Some(whole) = normalized.to_i64() {
            return Value::from(whole);
        }
    }
    normalized
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(normalized.to_string()), Value::Number)
}

pub fn id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(&value).ok_or_else(|| D::Error::custom(format!("invalid id: {value}")))
}

pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_id))
}

pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "si" | "sí" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        _ => None,
    })
}

pub fn money<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serde::Serialize::serialize(&decimal_to_json(*amount), serializer)
}

pub fn opt_money<S>(amount: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match amount {
        Some(amount) => money(amount, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_from_numbers_and_strings() {
        assert_eq!(value_to_id(&json!(7)), Some(7));
        assert_eq!(value_to_id(&json!("12")), Some(12));
        assert_eq!(value_to_id(&json!(3.0)), Some(3));
        assert_eq!(value_to_id(&json!("abc")), None);
        assert_eq!(value_to_id(&json!(null)), None);
    }

    #[test]
    fn test_money_parsing() {
        assert_eq!(value_to_decimal(&json!(50000)), Some(Decimal::from(50_000)));
        assert_eq!(value_to_decimal(&json!("$ 35000")), Some(Decimal::from(35_000)));
        assert_eq!(value_to_decimal(&json!(1250.5)), Some(Decimal::new(12505, 1)));
        assert_eq!(value_to_decimal(&json!("")), None);
        assert_eq!(value_to_decimal(&json!("gratis")), None);
    }

    #[test]
    fn test_money_to_json() {
        assert_eq!(decimal_to_json(Decimal::new(150_000_00, 2)), json!(150_000));
        assert_eq!(decimal_to_json(Decimal::new(12505, 1)), json!(1250.5));
    }
}
