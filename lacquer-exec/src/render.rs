//! Template rendering helpers shared by the step executor: a plain string
//! render plus a recursive descent over a `with`/`updates`-shaped JSON
//! value that renders every string leaf in place.

use lacquer_template::{render, FunctionTable, Resolver};
use std::collections::HashMap;

use crate::error::ExecError;

/// Render every string leaf of `value` through the template engine;
/// non-string leaves (numbers, bools, null) pass through unchanged, and
/// arrays/objects are walked recursively.
pub fn render_json(value: &serde_json::Value, resolver: &dyn Resolver, functions: &FunctionTable) -> Result<serde_json::Value, ExecError> {
    match value {
        serde_json::Value::String(s) => Ok(serde_json::Value::String(render(s, resolver, functions)?)),
        serde_json::Value::Array(items) => {
            let rendered = items.iter().map(|v| render_json(v, resolver, functions)).collect::<Result<Vec<_>, _>>()?;
            Ok(serde_json::Value::Array(rendered))
        }
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), render_json(v, resolver, functions)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Render every template string in a step's `with` map, producing a single
/// JSON object suitable as a tool/block call's raw input.
pub fn render_with(with: &HashMap<String, serde_json::Value>, resolver: &dyn Resolver, functions: &FunctionTable) -> Result<serde_json::Value, ExecError> {
    let mut out = serde_json::Map::with_capacity(with.len());
    for (k, v) in with {
        out.insert(k.clone(), render_json(v, resolver, functions)?);
    }
    Ok(serde_json::Value::Object(out))
}

/// Render every template string in a step's `updates` map into a plain
/// key→value map ready for `ExecutionContext::apply_updates`.
pub fn render_updates(
    updates: &HashMap<String, String>,
    resolver: &dyn Resolver,
    functions: &FunctionTable,
) -> Result<HashMap<String, serde_json::Value>, ExecError> {
    let mut out = HashMap::with_capacity(updates.len());
    for (k, template) in updates {
        let rendered = render(template, resolver, functions)?;
        out.insert(k.clone(), serde_json::Value::String(rendered));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lacquer_template::{ExpressionError, PathSegment, Value};

    struct FixedResolver;

    impl Resolver for FixedResolver {
        fn resolve(&self, root: &str, _path: &[PathSegment]) -> Result<Value, ExpressionError> {
            match root {
                "state" => Ok(Value::Number(3.0)),
                other => Err(ExpressionError::NotFound(other.to_string())),
            }
        }
    }

    #[test]
    fn render_json_walks_nested_objects() {
        let value = serde_json::json!({"a": "{{ state }}", "b": [1, "{{ state }}"]});
        let rendered = render_json(&value, &FixedResolver, &FunctionTable::with_builtins()).unwrap();
        assert_eq!(rendered, serde_json::json!({"a": "3", "b": [1, "3"]}));
    }

    #[test]
    fn render_updates_produces_string_values() {
        let updates = HashMap::from([("counter".to_string(), "{{ state }}".to_string())]);
        let rendered = render_updates(&updates, &FixedResolver, &FunctionTable::with_builtins()).unwrap();
        assert_eq!(rendered.get("counter"), Some(&serde_json::json!("3")));
    }
}
