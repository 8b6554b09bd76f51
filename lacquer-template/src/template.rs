//! The template engine (C3): finds every `{{ … }}` fragment in a string,
//! evaluates it, and splices the stringified result back in.

use crate::error::TemplateError;
use crate::eval::eval;
use crate::functions::FunctionTable;
use crate::parser::parse;
use crate::resolver::Resolver;

/// Render a template string against a resolver and function table.
///
/// Finds every non-overlapping `{{ … }}` occurrence, trims the inner
/// whitespace, evaluates it, and splices in the canonical string form of
/// the result. A string with no `{{ … }}` is returned byte-for-byte. An
/// evaluation error aborts the whole render.
pub fn render(
    template: &str,
    resolver: &dyn Resolver,
    functions: &FunctionTable,
) -> Result<String, TemplateError> {
    if !template.contains("{{") {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            // No closing brace: treat the rest of the string as verbatim,
            // matching "overlapping braces are not supported" — an
            // unterminated fragment is not a fragment.
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let inner = after_open[..end].trim();
        let value = eval_fragment(inner, resolver, functions)?;
        out.push_str(&value.to_canonical_string());
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn eval_fragment(
    inner: &str,
    resolver: &dyn Resolver,
    functions: &FunctionTable,
) -> Result<crate::value::Value, TemplateError> {
    let expr = parse(inner).map_err(|e| TemplateError {
        expression: inner.to_string(),
        source: e,
    })?;
    eval(&expr, resolver, functions).map_err(|e| TemplateError {
        expression: inner.to_string(),
        source: e,
    })
}
