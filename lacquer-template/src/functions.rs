//! The registered function table `f(args…)` dispatches against.
//!
//! Hosts are free to extend this table with their own functions; an
//! unknown name is an [`ExpressionError::UnknownFunction`].

use crate::error::ExpressionError;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered function: takes already-evaluated argument values,
/// produces a value or an error.
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, ExpressionError> + Send + Sync>;

/// The table a `Call` expression dispatches against.
#[derive(Clone)]
pub struct FunctionTable {
    functions: HashMap<String, Function>,
}

impl FunctionTable {
    /// An empty table — every call is `UnknownFunction`.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// The default table: a small set of string/collection helpers common
    /// to template languages. Hosts extend this via [`FunctionTable::register`].
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();
        table.register("len", len);
        table.register("upper", upper);
        table.register("lower", lower);
        table.register("trim", trim);
        table.register("contains", contains);
        table.register("join", join);
        table.register("default", default_fn);
        table
    }

    /// Register (or overwrite) a function.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, ExpressionError> + Send + Sync + 'static,
    ) {
        self.functions.insert(name.into(), Arc::new(f));
    }

    /// Call a registered function by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ExpressionError> {
        match self.functions.get(name) {
            Some(f) => f(args),
            None => Err(ExpressionError::UnknownFunction(name.to_string())),
        }
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn len(args: &[Value]) -> Result<Value, ExpressionError> {
    let n = match args.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::List(l)) => l.len(),
        Some(Value::Map(m)) => m.len(),
        Some(Value::Nil) | None => 0,
        Some(other) => {
            return Err(ExpressionError::TypeMismatch(format!(
                "len() does not accept {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Number(n as f64))
}

fn upper(args: &[Value]) -> Result<Value, ExpressionError> {
    Ok(Value::String(
        args.first().map(Value::to_canonical_string).unwrap_or_default().to_uppercase(),
    ))
}

fn lower(args: &[Value]) -> Result<Value, ExpressionError> {
    Ok(Value::String(
        args.first().map(Value::to_canonical_string).unwrap_or_default().to_lowercase(),
    ))
}

fn trim(args: &[Value]) -> Result<Value, ExpressionError> {
    Ok(Value::String(
        args.first()
            .map(Value::to_canonical_string)
            .unwrap_or_default()
            .trim()
            .to_string(),
    ))
}

fn contains(args: &[Value]) -> Result<Value, ExpressionError> {
    let haystack = args.first().cloned().unwrap_or(Value::Nil);
    let needle = args.get(1).cloned().unwrap_or(Value::Nil);
    let found = match haystack {
        Value::String(s) => s.contains(&needle.to_canonical_string()),
        Value::List(items) => items.iter().any(|v| v.loose_eq(&needle)),
        _ => false,
    };
    Ok(Value::Bool(found))
}

fn join(args: &[Value]) -> Result<Value, ExpressionError> {
    let sep = args.get(1).map(Value::to_canonical_string).unwrap_or_default();
    match args.first() {
        Some(Value::List(items)) => Ok(Value::String(
            items.iter().map(Value::to_canonical_string).collect::<Vec<_>>().join(&sep),
        )),
        _ => Err(ExpressionError::TypeMismatch("join() expects a list".into())),
    }
}

fn default_fn(args: &[Value]) -> Result<Value, ExpressionError> {
    let value = args.first().cloned().unwrap_or(Value::Nil);
    if value.to_bool() {
        Ok(value)
    } else {
        Ok(args.get(1).cloned().unwrap_or(Value::Nil))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_errors() {
        let table = FunctionTable::empty();
        let err = table.call("len", &[]).unwrap_err();
        assert!(matches!(err, ExpressionError::UnknownFunction(name) if name == "len"));
    }

    #[test]
    fn len_counts_chars_not_bytes_confusingly() {
        let table = FunctionTable::with_builtins();
        let v = table.call("len", &[Value::String("abc".into())]).unwrap();
        assert_eq!(v, Value::Number(3.0));
    }

    #[test]
    fn default_falls_back_on_falsy() {
        let table = FunctionTable::with_builtins();
        let v = table.call("default", &[Value::Nil, Value::String("fallback".into())]).unwrap();
        assert_eq!(v, Value::String("fallback".into()));
    }
}
