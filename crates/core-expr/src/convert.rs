//! Conversion between `serde_json::Value` and `rhai::Dynamic`.
//!
//! Kept in one place so the int/float numeric policy (§3 of the data model:
//! prefer integer when representable) is applied consistently regardless of
//! whether a value arrives from `parse_json` or is produced by a transform.

use rhai::Dynamic;
use serde_json::{Map, Number, Value};

pub fn to_dynamic(value: &Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(*b),
        Value::Number(n) => number_to_dynamic(n),
        Value::String(s) => Dynamic::from(s.clone()),
        Value::Array(items) => {
            let arr: rhai::Array = items.iter().map(to_dynamic).collect();
            Dynamic::from(arr)
        }
        Value::Object(map) => Dynamic::from(map_to_rhai(map)),
    }
}

fn number_to_dynamic(n: &Number) -> Dynamic {
    if let Some(i) = n.as_i64() {
        Dynamic::from(i)
    } else if let Some(f) = n.as_f64() {
        Dynamic::from(f)
    } else {
        Dynamic::UNIT
    }
}

fn map_to_rhai(map: &Map<String, Value>) -> rhai::Map {
    let mut out = rhai::Map::new();
    for (k, v) in map {
        out.insert(k.as_str().into(), to_dynamic(v));
    }
    out
}

/// Inverse of `to_dynamic`, applying the same integer-preferred numeric
/// policy when the dynamic value is a float with no fractional part.
pub fn from_dynamic(value: &Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Some(b) = value.clone().try_cast::<bool>() {
        return Value::Bool(b);
    }
    if let Some(i) = value.clone().try_cast::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(f) = value.clone().try_cast::<f64>() {
        return normalize_number(f);
    }
    if let Some(s) = value.clone().into_string().ok() {
        return Value::String(s);
    }
    if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
        return Value::Array(arr.iter().map(from_dynamic).collect());
    }
    if let Some(map) = value.clone().try_cast::<rhai::Map>() {
        let mut out = Map::new();
        for (k, v) in map.iter() {
            out.insert(k.to_string(), from_dynamic(v));
        }
        return Value::Object(out);
    }
    Value::String(value.to_string())
}

/// A float with no fractional part that still fits an i64 becomes an
/// integer-kind JSON number, matching the parse-time policy.
pub fn normalize_number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Value::Number((f as i64).into())
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}
