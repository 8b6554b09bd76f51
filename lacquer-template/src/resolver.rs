//! The contract the evaluator uses to resolve scope-root identifiers
//! (`inputs`, `state`, `steps`, `metadata`, `env`, `workflow`) against a
//! host-provided execution context (C4).
//!
//! The evaluator shortcuts straight to [`Resolver::resolve`] for any
//! expression rooted at one of the six scope names, rather than first
//! materializing the whole subtree into a [`Value`] — this is the
//! optimization (and the "not found" semantics) the design calls for.

use crate::error::ExpressionError;
use crate::value::Value;

/// The six names a bare identifier may refer to.
pub const SCOPE_ROOTS: &[&str] = &["inputs", "state", "steps", "metadata", "env", "workflow"];

/// True if `name` names one of the six scope roots.
pub fn is_scope_root(name: &str) -> bool {
    SCOPE_ROOTS.contains(&name)
}

/// One step of a dotted-path projection: a named field or a computed
/// index. Built by the evaluator from the AST before calling the
/// resolver, so the resolver never has to walk `Expr` itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.field`
    Field(String),
    /// `[value]` — already evaluated to a concrete key/index.
    Index(Value),
}

/// Projects a dotted path onto a root scope.
pub trait Resolver {
    /// Resolve `root.path[0].path[1]…` to a value.
    ///
    /// `root` is always one of [`SCOPE_ROOTS`] — the evaluator never calls
    /// this for anything else. An empty `path` means the bare root name
    /// was referenced directly (e.g. `{{ state }}`).
    fn resolve(&self, root: &str, path: &[PathSegment]) -> Result<Value, ExpressionError>;
}
