use crate::expression::value::OutputType;

/// Configuration-time failure to compile a style expression.
///
/// The failing channel falls back to its literal or schema default; it never becomes
/// data-driven.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExprCompileError {
    #[error("expression is empty")]
    Empty,

    #[error("unknown expression operator \"{0}\"")]
    UnknownOperator(String),

    #[error("\"{op}\" expects {expected}, got {got} argument(s)")]
    Arity {
        op: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("\"get\" expects a property name string")]
    InvalidPropertyName,

    #[error("match labels must be strings, numbers, booleans or arrays of those")]
    InvalidMatchLabel,

    #[error("unsupported interpolation type {0}")]
    UnsupportedInterpolation(String),

    #[error("interpolate stops must be finite numbers in strictly ascending order")]
    InvalidStops,

    #[error("literal {value} cannot be coerced to {expected}")]
    UncoercibleLiteral { value: String, expected: OutputType },

    #[error("\"{op}\" cannot produce a {expected} value")]
    TypeMismatch {
        op: &'static str,
        expected: OutputType,
    },
}
