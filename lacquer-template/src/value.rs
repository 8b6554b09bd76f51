//! The `Value` lattice and its coercion rules.

use crate::error::ExpressionError;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamically-typed expression value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value.
    Nil,
    /// A boolean.
    Bool(bool),
    /// An IEEE-754 double. There is no separate integer type.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A string-keyed map. `BTreeMap` so `to_string` rendering is
    /// deterministic (sorted by key).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Coerce to `bool`: `Nil` → false, `Number` → nonzero, `String` →
    /// non-empty, `List`/`Map` → non-empty.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    /// Coerce to `f64`: `Bool` → 1/0, `String` → parsed (unparseable → 0),
    /// `Nil`/`List`/`Map` → 0.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Nil => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::List(_) | Value::Map(_) => 0.0,
        }
    }

    /// Canonical string rendering: numbers via shortest round-trip, bool as
    /// `true`/`false`, nil as empty, list/map via their own rendering.
    pub fn to_canonical_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => {
                let inner = items
                    .iter()
                    .map(Value::to_canonical_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{inner}]")
            }
            Value::Map(map) => {
                let inner = map
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.to_canonical_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{inner}}}")
            }
        }
    }

    /// Equality per the coercion rules: same-variant values compare
    /// structurally; a `String` and a `Number` are equal when the string
    /// parses to that exact number.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
                s.trim().parse::<f64>().map(|parsed| parsed == *n).unwrap_or(false)
            }
            _ => self == other,
        }
    }

    /// Index into a `List` by integer position, or a `Map` by a stringified
    /// key. Negative indices are not supported (out of range ⇒ `Nil`, not
    /// an error — mirrors typical template-language leniency).
    pub fn index(&self, key: &Value) -> Result<Value, ExpressionError> {
        match self {
            Value::List(items) => {
                let idx = key.to_number();
                if idx < 0.0 || idx.fract() != 0.0 {
                    return Ok(Value::Nil);
                }
                Ok(items.get(idx as usize).cloned().unwrap_or(Value::Nil))
            }
            Value::Map(map) => {
                let k = key.to_canonical_string();
                Ok(map.get(&k).cloned().unwrap_or(Value::Nil))
            }
            _ => Err(ExpressionError::TypeMismatch(format!(
                "cannot index into {}",
                self.type_name()
            ))),
        }
    }

    /// Project a named field off a `Map`. Non-maps are a `TypeMismatch`.
    pub fn field(&self, name: &str) -> Result<Value, ExpressionError> {
        match self {
            Value::Map(map) => Ok(map.get(name).cloned().unwrap_or(Value::Nil)),
            _ => Err(ExpressionError::TypeMismatch(format!(
                "cannot access field `{name}` on {}",
                self.type_name()
            ))),
        }
    }

    /// The lattice-variant name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Build a `Value` from a `serde_json::Value`, used to lift JSON
    /// inputs/state/step output into the expression lattice.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

/// Shortest round-trip number formatting: integral values print without a
/// decimal point, everything else uses Rust's default `f64` formatting
/// (already shortest-round-trip as of Rust's `Display` impl).
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_to_string_drops_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_canonical_string(), "3");
        assert_eq!(Value::Number(3.5).to_canonical_string(), "3.5");
    }

    #[test]
    fn string_number_loose_equality() {
        assert!(Value::String("3".into()).loose_eq(&Value::Number(3.0)));
        assert!(!Value::String("3.1".into()).loose_eq(&Value::Number(3.0)));
    }

    #[test]
    fn empty_collections_are_falsy() {
        assert!(!Value::List(vec![]).to_bool());
        assert!(!Value::Map(BTreeMap::new()).to_bool());
        assert!(Value::List(vec![Value::Nil]).to_bool());
    }

    #[test]
    fn unparseable_string_to_number_is_zero() {
        assert_eq!(Value::String("abc".into()).to_number(), 0.0);
    }

    #[test]
    fn field_access_on_non_map_is_type_mismatch() {
        let err = Value::Number(1.0).field("x").unwrap_err();
        assert!(matches!(err, ExpressionError::TypeMismatch(_)));
    }
}
