//! The compiler-wide error taxonomy.
//!
//! Every phase (tokenizer, parser, optimizer, symbol table, code generator)
//! returns `Result<T, CompileError>` rather than panicking or accumulating
//! diagnostics in a side-channel `Handler` — a single ill-formed program
//! fails fast at the first problem found.

use crate::origin::Origin;
use thiserror::Error;

/// The five error categories this compiler can report.
///
/// `Coercion` and `ValueReassignment` are never constructed by this
/// compiler today — the source language has one value type and every
/// binding is reassignable — but they're kept as real variants because a
/// typed or immutable dialect of the same language would need exactly
/// these two failure modes, and a `CompileError` consumer (the driver's
/// `Display` impl, tests matching on variant) should not have to change
/// shape when that dialect arrives.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The token stream does not match the grammar at `origin`.
    #[error("syntax error: {message} at {origin}")]
    Syntax { message: String, origin: Origin },

    /// A name was declared twice in a scope where that's illegal (e.g. two
    /// functions with the same name, or a parameter list with a repeated
    /// name). Carries both the original and the conflicting origin.
    #[error("redefinition of `{name}` at {new_origin} (first defined at {first_origin})")]
    Redefinition {
        name: String,
        first_origin: Origin,
        new_origin: Origin,
    },

    /// An internal invariant was violated — a state the compiler itself
    /// should never reach for any well-formed input. Distinct from
    /// `Syntax` because it signals a compiler bug, not a bad program.
    #[error("internal compiler error: {0}")]
    Logic(String),

    /// Reserved for a future typed dialect: an expression's value type
    /// cannot be coerced to the type its context requires.
    #[error("cannot coerce value at {origin}: {message}")]
    Coercion { message: String, origin: Origin },

    /// Reserved for a future dialect with immutable bindings: an attempt
    /// to assign to a name that was declared immutable.
    #[error("cannot assign to `{name}` at {origin}: binding is immutable")]
    ValueReassignment { name: String, origin: Origin },
}

impl CompileError {
    pub fn syntax(origin: Origin, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            message: message.into(),
            origin,
        }
    }

    pub fn redefinition(name: impl Into<String>, first_origin: Origin, new_origin: Origin) -> Self {
        CompileError::Redefinition {
            name: name.into(),
            first_origin,
            new_origin,
        }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        CompileError::Logic(message.into())
    }

    /// The short category prefix used in diagnostic rendering, independent
    /// of the full `Display` message (which also carries the payload).
    pub fn category(&self) -> &'static str {
        match self {
            CompileError::Syntax { .. } => "syntax error",
            CompileError::Redefinition { .. } => "redefinition error",
            CompileError::Logic(_) => "internal error",
            CompileError::Coercion { .. } => "coercion error",
            CompileError::ValueReassignment { .. } => "reassignment error",
        }
    }
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redefinition_carries_both_origins() {
        let err = CompileError::redefinition("f", Origin::new(1, 1), Origin::new(5, 1));
        assert_eq!(err.category(), "redefinition error");
        assert!(err.to_string().contains("5:1"));
        assert!(err.to_string().contains("1:1"));
    }

    #[test]
    fn syntax_error_formats_with_origin() {
        let err = CompileError::syntax(Origin::new(3, 7), "unexpected token");
        assert_eq!(err.to_string(), "syntax error: unexpected token at 3:7");
    }
}
