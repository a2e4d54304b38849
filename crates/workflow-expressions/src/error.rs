//! Diagnostics produced while lexing, parsing and checking expressions.

use thiserror::Error;

use crate::Span;

/// The kind of an [`ExprError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An unexpected character while tokenizing.
    Lexical,
    /// An unexpected token while parsing.
    Syntax,
    /// An unknown function, wrong arity, or unknown context.
    Semantic,
    /// The expression resolves to a known untrusted value.
    UntrustedInput,
    /// A function argument resolves to an object containing untrusted values.
    UntrustedObject,
}

/// A diagnostic attached to a span of an expression.
///
/// None of these are fatal: every layer collects them and keeps going
/// where it can, and the caller decides what to do with them.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{message}")]
pub struct ExprError {
    /// What produced this error.
    pub kind: ErrorKind,
    /// A human-readable description.
    pub message: String,
    /// The offending span, relative to the expression's source.
    pub span: Span,
}

impl ExprError {
    /// Creates a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: impl Into<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: span.into(),
        }
    }

    /// Creates a new [`ErrorKind::Lexical`] error.
    pub fn lexical(message: impl Into<String>, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Lexical, message, span)
    }

    /// Creates a new [`ErrorKind::Syntax`] error.
    pub fn syntax(message: impl Into<String>, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    /// Creates a new [`ErrorKind::Semantic`] error.
    pub fn semantic(message: impl Into<String>, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Semantic, message, span)
    }

    /// Re-bases this error's span by `bias`; see [`Span::adjust`].
    pub fn adjust(self, bias: usize) -> Self {
        Self {
            span: self.span.adjust(bias),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ExprError};
    use crate::Span;

    #[test]
    fn test_display_and_adjust() {
        let err = ExprError::semantic("undefined function \"foo\"", 2..5);
        assert_eq!(err.to_string(), "undefined function \"foo\"");
        assert_eq!(err.kind, ErrorKind::Semantic);

        let err = err.adjust(100);
        assert_eq!(err.span, Span::from(102..105));
    }
}
