//! The expression evaluator (C2): walks an [`Expr`] against a [`Resolver`]
//! and [`FunctionTable`], producing a [`Value`].

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::error::ExpressionError;
use crate::functions::FunctionTable;
use crate::resolver::{is_scope_root, PathSegment, Resolver};
use crate::value::Value;

/// Evaluate an expression against a resolver and function table.
pub fn eval(
    expr: &Expr,
    resolver: &dyn Resolver,
    functions: &FunctionTable,
) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Nil => Ok(Value::Nil),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => {
            if is_scope_root(name) {
                resolver.resolve(name, &[])
            } else {
                Err(ExpressionError::NotFound(name.clone()))
            }
        }
        Expr::Unary(op, operand) => eval_unary(*op, eval(operand, resolver, functions)?),
        Expr::Binary(BinOp::And, lhs, rhs) => {
            let l = eval(lhs, resolver, functions)?;
            if !l.to_bool() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval(rhs, resolver, functions)?.to_bool()))
        }
        Expr::Binary(BinOp::Or, lhs, rhs) => {
            let l = eval(lhs, resolver, functions)?;
            if l.to_bool() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval(rhs, resolver, functions)?.to_bool()))
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, resolver, functions)?;
            let r = eval(rhs, resolver, functions)?;
            eval_binary(*op, l, r)
        }
        Expr::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, resolver, functions)?.to_bool() {
                eval(then_branch, resolver, functions)
            } else {
                eval(else_branch, resolver, functions)
            }
        }
        Expr::Field(..) | Expr::Index(..) => eval_path_or_value(expr, resolver, functions),
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|a| eval(a, resolver, functions))
                .collect::<Result<Vec<_>, _>>()?;
            functions.call(name, &values)
        }
    }
}

/// Decompose a `Field`/`Index` chain into `(root, path)` if it bottoms out
/// at a scope-root identifier, and resolve it directly through the
/// resolver. Falls back to ordinary value-level field/index access when
/// the base isn't rooted at a scope (e.g. the result of a function call).
fn eval_path_or_value(
    expr: &Expr,
    resolver: &dyn Resolver,
    functions: &FunctionTable,
) -> Result<Value, ExpressionError> {
    if let Some((root, raw_segments)) = decompose(expr) {
        let mut segments = Vec::with_capacity(raw_segments.len());
        for seg in raw_segments {
            match seg {
                RawSegment::Field(name) => segments.push(PathSegment::Field(name)),
                RawSegment::Index(idx_expr) => {
                    let idx_value = eval(&idx_expr, resolver, functions)?;
                    segments.push(PathSegment::Index(idx_value));
                }
            }
        }
        return resolver.resolve(&root, &segments);
    }

    match expr {
        Expr::Field(base, name) => eval(base, resolver, functions)?.field(name),
        Expr::Index(base, idx_expr) => {
            let base_value = eval(base, resolver, functions)?;
            let idx_value = eval(idx_expr, resolver, functions)?;
            base_value.index(&idx_value)
        }
        _ => unreachable!("eval_path_or_value called on non-path expression"),
    }
}

enum RawSegment {
    Field(String),
    Index(Expr),
}

/// Walk a `Field`/`Index` chain back to its base; returns `Some` only when
/// the base is `Ident(root)` for a known scope root.
fn decompose(expr: &Expr) -> Option<(String, Vec<RawSegment>)> {
    match expr {
        Expr::Ident(name) if is_scope_root(name) => Some((name.clone(), Vec::new())),
        Expr::Field(base, name) => {
            let (root, mut segments) = decompose(base)?;
            segments.push(RawSegment::Field(name.clone()));
            Some((root, segments))
        }
        Expr::Index(base, idx_expr) => {
            let (root, mut segments) = decompose(base)?;
            segments.push(RawSegment::Index((**idx_expr).clone()));
            Some((root, segments))
        }
        _ => None,
    }
}

fn eval_unary(op: UnaryOp, operand: Value) -> Result<Value, ExpressionError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.to_bool())),
        UnaryOp::Neg => Ok(Value::Number(-operand.to_number())),
    }
}

fn eval_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, ExpressionError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(lhs.loose_eq(&rhs))),
        BinOp::Ne => Ok(Value::Bool(!lhs.loose_eq(&rhs))),
        BinOp::Lt => Ok(Value::Bool(lhs.to_number() < rhs.to_number())),
        BinOp::Gt => Ok(Value::Bool(lhs.to_number() > rhs.to_number())),
        BinOp::Le => Ok(Value::Bool(lhs.to_number() <= rhs.to_number())),
        BinOp::Ge => Ok(Value::Bool(lhs.to_number() >= rhs.to_number())),
        BinOp::Add => {
            if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) {
                Ok(Value::String(format!(
                    "{}{}",
                    lhs.to_canonical_string(),
                    rhs.to_canonical_string()
                )))
            } else {
                Ok(Value::Number(lhs.to_number() + rhs.to_number()))
            }
        }
        BinOp::Sub => Ok(Value::Number(lhs.to_number() - rhs.to_number())),
        BinOp::Mul => Ok(Value::Number(lhs.to_number() * rhs.to_number())),
        BinOp::Div => {
            let r = rhs.to_number();
            if r == 0.0 {
                Err(ExpressionError::DivisionByZero)
            } else {
                Ok(Value::Number(lhs.to_number() / r))
            }
        }
        BinOp::Mod => {
            let r = rhs.to_number() as i64;
            if r == 0 {
                Err(ExpressionError::DivisionByZero)
            } else {
                let l = lhs.to_number() as i64;
                Ok(Value::Number((l % r) as f64))
            }
        }
        BinOp::And | BinOp::Or => unreachable!("short-circuit operators handled in eval()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::BTreeMap;

    struct TestResolver;

    impl Resolver for TestResolver {
        fn resolve(&self, root: &str, path: &[PathSegment]) -> Result<Value, ExpressionError> {
            match (root, path) {
                ("inputs", [PathSegment::Field(f)]) if f == "name" => {
                    Ok(Value::String("Alice".into()))
                }
                ("inputs", [PathSegment::Field(f)]) if f == "enabled" => Ok(Value::Bool(true)),
                ("state", [PathSegment::Field(f)]) if f == "counter" => Ok(Value::Number(2.0)),
                ("env", [PathSegment::Field(_)]) => Ok(Value::String(String::new())),
                ("state", []) => Ok(Value::Map(BTreeMap::new())),
                _ => Err(ExpressionError::NotFound(format!("{root} {path:?}"))),
            }
        }
    }

    fn eval_src(src: &str) -> Result<Value, ExpressionError> {
        let expr = parse(src).unwrap();
        eval(&expr, &TestResolver, &FunctionTable::with_builtins())
    }

    #[test]
    fn resolves_dotted_path_through_resolver() {
        assert_eq!(eval_src("inputs.name").unwrap(), Value::String("Alice".into()));
    }

    #[test]
    fn ternary_picks_branch_by_truthiness() {
        assert_eq!(
            eval_src(r#"inputs.enabled ? "yes" : "no""#).unwrap(),
            Value::String("yes".into())
        );
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(eval_src("1 / 0").unwrap_err(), ExpressionError::DivisionByZero);
    }

    #[test]
    fn modulo_truncates_toward_zero() {
        assert_eq!(eval_src("-7 % 2").unwrap(), Value::Number(-1.0));
    }

    #[test]
    fn plus_concatenates_when_either_side_is_string() {
        assert_eq!(eval_src(r#""count: " + 3"#).unwrap(), Value::String("count: 3".into()));
    }

    #[test]
    fn arithmetic_expression_on_state() {
        assert_eq!(eval_src("state.counter + 1").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn and_short_circuits_without_evaluating_rhs() {
        // rhs references an unresolvable path; if it were evaluated the
        // test would fail with NotFound instead of returning false.
        assert_eq!(eval_src("false && nonexistent_root.x").unwrap(), Value::Bool(false));
    }

    #[test]
    fn unknown_root_identifier_is_not_found() {
        assert!(eval_src("mystery").is_err());
    }

    #[test]
    fn env_missing_key_is_empty_not_an_error() {
        assert_eq!(eval_src("env.NONEXISTENT").unwrap(), Value::String(String::new()));
    }
}
