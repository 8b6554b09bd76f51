//! Error types for tokenizing, parsing, evaluating, and resolving.

use thiserror::Error;

/// Everything that can go wrong turning a `{{ … }}` fragment into a value.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    /// The tokenizer hit a character it doesn't recognize, or an
    /// unterminated string literal.
    #[error("tokenize error: {0}")]
    Tokenize(String),

    /// The token stream doesn't form a valid expression.
    #[error("parse error: {0}")]
    Parse(String),

    /// `/` or `%` with a zero right-hand operand.
    #[error("division by zero")]
    DivisionByZero,

    /// A binary or unary operator was applied to operand types it doesn't
    /// support (reserved for future strict-mode checking; the default
    /// coercion rules currently make this unreachable for `+ - * / %`).
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// A call expression named a function not present in the function
    /// table.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A variable path referenced an input, state key, step, or step field
    /// that doesn't exist. Not raised for missing `env` keys, which
    /// resolve to an empty string instead.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path segment indexed into a value that isn't a map or list, or a
    /// step-field access targeted a step whose output isn't a map.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
}

/// A template-level error: wraps an [`ExpressionError`] with the source
/// text of the failing `{{ … }}` fragment, so the whole render can abort
/// with a message that names the failing expression.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("template error in `{{{{ {expression} }}}}`: {source}")]
pub struct TemplateError {
    /// The raw text between the braces that failed to evaluate.
    pub expression: String,
    /// The underlying expression error.
    #[source]
    pub source: ExpressionError,
}
