//! Parsing and semantic checks for CI workflow expressions, i.e. the
//! contents of `${{ ... }}`.
//!
//! The pipeline is tokenizer → parser → AST, after which any number of
//! [`visitor::Visitor`]s can walk the tree. [`sema::SemanticsChecker`] is
//! one such visitor; taint tracking lives in a separate crate and is another.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::ops::Deref;

pub use crate::call::{Call, Function};
pub use crate::error::{ErrorKind, ExprError};
pub use crate::identifier::Identifier;
pub use crate::lexer::{Token, TokenKind, tokenize};
pub use crate::literal::Literal;
pub use crate::op::{BinOp, UnOp};
pub use crate::parser::Parser;

pub mod call;
pub mod error;
pub mod identifier;
pub mod lexer;
pub mod literal;
pub mod op;
pub mod parser;
pub mod sema;
pub mod visitor;

/// A byte range within an expression's source.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    /// The start of the span, inclusive.
    pub start: usize,
    /// The end of the span, exclusive.
    pub end: usize,
}

impl Span {
    /// Adjust this span by the given bias.
    ///
    /// Expressions are parsed without their surrounding document, so
    /// callers use this to re-base spans onto the original file.
    pub fn adjust(self, bias: usize) -> Self {
        Self {
            start: self.start + bias,
            end: self.end + bias,
        }
    }

    /// Returns a span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the span as a range.
    pub fn as_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// Where an expression node came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Origin<'src> {
    /// The node's span within the expression source.
    pub span: Span,
    /// The node's raw source text.
    pub raw: &'src str,
}

impl<'src> Origin<'src> {
    /// Create a new origin from the given span and source slice.
    pub fn new(span: impl Into<Span>, raw: &'src str) -> Self {
        Self {
            span: span.into(),
            raw,
        }
    }
}

/// An expression along with its [`Origin`].
#[derive(Debug, PartialEq)]
pub struct SpannedExpr<'src> {
    /// The expression's origin.
    pub origin: Origin<'src>,
    /// The expression itself.
    pub inner: Expr<'src>,
}

impl<'src> SpannedExpr<'src> {
    /// Creates a new `SpannedExpr` from an origin and an expression.
    pub fn new(origin: Origin<'src>, inner: Expr<'src>) -> Self {
        Self { origin, inner }
    }
}

impl<'src> Deref for SpannedExpr<'src> {
    type Target = Expr<'src>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Represents a workflow expression.
///
/// Property accesses are represented as chains: `github.event.issue` is a
/// [`Expr::Deref`] of `issue` whose receiver is a [`Expr::Deref`] of `event`
/// whose receiver is the [`Expr::Variable`] `github`.
#[derive(Debug, PartialEq)]
pub enum Expr<'src> {
    /// A literal value.
    Literal(Literal<'src>),
    /// A reference to a context root, e.g. `github`.
    Variable(Identifier<'src>),
    /// A property access, e.g. `.actor` in `github.actor`.
    Deref {
        /// The object being dereferenced.
        receiver: Box<SpannedExpr<'src>>,
        /// The property name.
        property: Identifier<'src>,
    },
    /// An index access, e.g. `[0]` in `foo[0]`.
    ///
    /// An index that's a string literal is equivalent to a property access:
    /// `github['event']` means the same thing as `github.event`.
    Index {
        /// The object or array being indexed.
        receiver: Box<SpannedExpr<'src>>,
        /// The index expression.
        index: Box<SpannedExpr<'src>>,
    },
    /// The `.*` object filter, e.g. `labels.*` in `github.event.labels.*.name`.
    ArrayDeref(Box<SpannedExpr<'src>>),
    /// A function call.
    Call(Call<'src>),
    /// A binary operation, either logical or comparison.
    BinOp {
        /// The LHS of the binop.
        lhs: Box<SpannedExpr<'src>>,
        /// The binary operator.
        op: BinOp,
        /// The RHS of the binop.
        rhs: Box<SpannedExpr<'src>>,
    },
    /// A unary operation. Negation (`!`) is currently the only `UnOp`.
    UnOp {
        /// The unary operator.
        op: UnOp,
        /// The expression to apply the operator to.
        expr: Box<SpannedExpr<'src>>,
    },
}

impl<'src> Expr<'src> {
    /// Parses the given string into an expression.
    ///
    /// This is a convenience wrapper around [`tokenize`] and [`Parser`]
    /// that fails on the first error. Use [`Parser::parse`] directly to get
    /// a partial result alongside any errors.
    pub fn parse(expr: &'src str) -> Result<SpannedExpr<'src>, ExprError> {
        let tokens = tokenize(expr)?;
        let (parsed, mut errors) = Parser::new(expr, tokens).parse();

        if !errors.is_empty() {
            return Err(errors.swap_remove(0));
        }

        parsed.ok_or_else(|| ExprError::syntax("empty expression", 0..expr.len()))
    }

    /// Returns the string value of this expression if it's a string literal.
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(s)) => Some(s.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::{BinOp, Expr, Span};

    #[test]
    fn test_span_adjust() {
        let span = Span::from(3..7);
        assert_eq!(span.adjust(10), Span::from(13..17));
        assert_eq!(span.as_range(), 3..7);
    }

    #[test]
    fn test_span_join() {
        assert_eq!(Span::from(3..7).join(Span::from(5..9)), Span::from(3..9));
        assert_eq!(Span::from(5..9).join(Span::from(0..2)), Span::from(0..9));
    }

    #[test]
    fn test_spans() -> Result<()> {
        let expr = Expr::parse("github.actor == 'x'")?;
        assert_eq!(expr.origin.raw, "github.actor == 'x'");

        let Expr::BinOp { lhs, op, rhs } = &expr.inner else {
            panic!("expected binop, got {expr:?}");
        };
        assert_eq!(*op, BinOp::Eq);
        assert_eq!(lhs.origin.raw, "github.actor");
        assert_eq!(lhs.origin.span, Span::from(0..12));
        assert_eq!(rhs.origin.raw, "'x'");
        assert_eq!(rhs.origin.span, Span::from(16..19));

        Ok(())
    }

    #[test]
    fn test_as_string_literal() -> Result<()> {
        assert_eq!(Expr::parse("'foo '' bar'")?.as_string_literal(), Some("foo ' bar"));
        assert_eq!(Expr::parse("foo")?.as_string_literal(), None);
        Ok(())
    }
}
