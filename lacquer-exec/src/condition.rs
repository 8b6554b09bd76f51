//! Truthy evaluation of a step's `condition`/`skip_if` template.
//!
//! Both fields hold a single `{{ … }}` fragment (e.g. `"{{ inputs.enabled
//! }}"`). Splicing it through [`lacquer_template::render`] would collapse
//! a boolean to its *string* form ("false" is non-empty, hence truthy by
//! `Value::to_bool`'s string rule) — exactly backwards. So this evaluates
//! the inner expression directly against the `Value` lattice instead of
//! round-tripping through a rendered string.

use lacquer_template::{eval, parse, ExpressionError, FunctionTable, Resolver};

use crate::error::ExecError;

/// Evaluate `template` (a bare expression, optionally wrapped in `{{ }}`)
/// and coerce the result to `bool` per [`lacquer_template::Value::to_bool`].
pub fn eval_truthy(template: &str, resolver: &dyn Resolver, functions: &FunctionTable) -> Result<bool, ExecError> {
    let inner = strip_braces(template);
    let expr = parse(inner).map_err(wrap_expr_error(inner))?;
    let value = eval(&expr, resolver, functions).map_err(wrap_expr_error(inner))?;
    Ok(value.to_bool())
}

fn strip_braces(template: &str) -> &str {
    let trimmed = template.trim();
    trimmed
        .strip_prefix("{{")
        .and_then(|s| s.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn wrap_expr_error(inner: &str) -> impl Fn(ExpressionError) -> ExecError + '_ {
    move |source| {
        ExecError::TemplateParseError(lacquer_template::TemplateError { expression: inner.to_string(), source })
    }
}
