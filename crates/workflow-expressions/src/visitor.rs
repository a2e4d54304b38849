//! Visitor traits for traversing expressions.
//!
//! Traversal is driven by [`walk`]: every node is announced to the visitor
//! with [`Visitor::enter`] before its children are walked and with
//! [`Visitor::leave`] afterwards. Analyses that want a post-order
//! (bottom-up) view of the tree only implement `leave`.
//!
//! Once the root node has been left, [`Visitor::end`] is called exactly once.
//!
//! ## Example Usage
//!
//! ```rust
//! use workflow_expressions::{Expr, Literal, SpannedExpr};
//! use workflow_expressions::visitor::{Visitable, Visitor};
//!
//! // Create a custom visitor that finds all string literals
//! #[derive(Default)]
//! struct StringFinder {
//!     strings: Vec<String>,
//! }
//!
//! impl<'src> Visitor<'src> for StringFinder {
//!     fn leave(&mut self, expr: &SpannedExpr<'src>) {
//!         if let Expr::Literal(Literal::String(s)) = &expr.inner {
//!             self.strings.push(s.to_string());
//!         }
//!     }
//! }
//!
//! // Parse an expression and find all strings
//! let expr = Expr::parse("format('Hello, {0}!', github.actor)").unwrap();
//! let mut finder = StringFinder::default();
//! expr.accept(&mut finder);
//!
//! assert_eq!(finder.strings, vec!["Hello, {0}!"]);
//! ```

use crate::{Expr, SpannedExpr};

/// A visitor over workflow expressions.
///
/// All methods default to doing nothing.
pub trait Visitor<'src> {
    /// Called when a node is first reached, before any of its children.
    fn enter(&mut self, _expr: &SpannedExpr<'src>) {}

    /// Called after all of a node's children have been walked.
    fn leave(&mut self, _expr: &SpannedExpr<'src>) {}

    /// Called once the whole tree has been walked.
    fn end(&mut self) {}
}

/// Walks `expr` and its children, calling `visitor` for each node.
///
/// Children are walked in source order, with one exception: an
/// [`Expr::Index`]'s index expression is walked *before* its receiver.
/// This means that by the time the receiver chain of `a.b[x].c` is being
/// walked, everything inside `x` has already been seen and left.
///
/// Does not call [`Visitor::end`]; see [`Visitable::accept`].
pub fn walk<'src, V: Visitor<'src> + ?Sized>(expr: &SpannedExpr<'src>, visitor: &mut V) {
    visitor.enter(expr);

    match &expr.inner {
        Expr::Literal(_) | Expr::Variable(_) => {}
        Expr::Deref { receiver, .. } | Expr::ArrayDeref(receiver) => walk(receiver, visitor),
        Expr::Index { receiver, index } => {
            walk(index, visitor);
            walk(receiver, visitor);
        }
        Expr::Call(call) => {
            for arg in &call.args {
                walk(arg, visitor);
            }
        }
        Expr::BinOp { lhs, rhs, .. } => {
            walk(lhs, visitor);
            walk(rhs, visitor);
        }
        Expr::UnOp { expr, .. } => walk(expr, visitor),
    }

    visitor.leave(expr);
}

/// Extension trait to add visitor functionality to expressions.
pub trait Visitable<'src> {
    /// Accept a visitor and traverse this expression, finishing with
    /// [`Visitor::end`].
    fn accept<V: Visitor<'src> + ?Sized>(&self, visitor: &mut V);
}

impl<'src> Visitable<'src> for SpannedExpr<'src> {
    fn accept<V: Visitor<'src> + ?Sized>(&self, visitor: &mut V) {
        walk(self, visitor);
        visitor.end();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Visitable, Visitor};
    use crate::{Expr, SpannedExpr};

    /// Records every callback as a string.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl<'src> Visitor<'src> for Recorder {
        fn enter(&mut self, expr: &SpannedExpr<'src>) {
            self.events.push(format!("enter {}", expr.origin.raw));
        }

        fn leave(&mut self, expr: &SpannedExpr<'src>) {
            self.events.push(format!("leave {}", expr.origin.raw));
        }

        fn end(&mut self) {
            self.events.push("end".into());
        }
    }

    #[test]
    fn test_walk_order() {
        let expr = Expr::parse("a.b[c.d].e").unwrap();
        let mut recorder = Recorder::default();
        expr.accept(&mut recorder);

        assert_eq!(
            recorder.events,
            [
                "enter a.b[c.d].e",
                "enter a.b[c.d]",
                "enter c.d",
                "enter c",
                "leave c",
                "leave c.d",
                "enter a.b",
                "enter a",
                "leave a",
                "leave a.b",
                "leave a.b[c.d]",
                "leave a.b[c.d].e",
                "end",
            ]
        );
    }

    #[test]
    fn test_walk_call_and_ops() {
        let expr = Expr::parse("!f(x, 'y') || z").unwrap();
        let mut recorder = Recorder::default();
        expr.accept(&mut recorder);

        let leaves = recorder
            .events
            .iter()
            .filter_map(|e| e.strip_prefix("leave "))
            .collect::<Vec<_>>();
        assert_eq!(leaves, ["x", "'y'", "f(x, 'y')", "!f(x, 'y')", "z", "!f(x, 'y') || z"]);
    }

    /// Example visitor that counts different types of expressions.
    #[derive(Default)]
    struct ExpressionCounter {
        literals: usize,
        variables: usize,
        derefs: usize,
        function_calls: usize,
        binary_ops: usize,
        unary_ops: usize,
        filters: usize,
        indices: usize,
    }

    impl<'src> Visitor<'src> for ExpressionCounter {
        fn leave(&mut self, expr: &SpannedExpr<'src>) {
            match &expr.inner {
                Expr::Literal(_) => self.literals += 1,
                Expr::Variable(_) => self.variables += 1,
                Expr::Deref { .. } => self.derefs += 1,
                Expr::Index { .. } => self.indices += 1,
                Expr::ArrayDeref(_) => self.filters += 1,
                Expr::Call(_) => self.function_calls += 1,
                Expr::BinOp { .. } => self.binary_ops += 1,
                Expr::UnOp { .. } => self.unary_ops += 1,
            }
        }
    }

    #[test]
    fn test_visitor_counting() {
        let expr =
            Expr::parse("foo.bar[1] && !baz || format('hello', github.event.labels.*.name)")
                .unwrap();
        let mut counter = ExpressionCounter::default();
        expr.accept(&mut counter);

        // - 2 literals: 1, 'hello'
        // - 3 variables: foo, baz, github
        // - 4 derefs: .bar, .event, .labels, .name
        assert_eq!(counter.literals, 2);
        assert_eq!(counter.variables, 3);
        assert_eq!(counter.derefs, 4);
        assert_eq!(counter.function_calls, 1);
        assert_eq!(counter.binary_ops, 2);
        assert_eq!(counter.unary_ops, 1);
        assert_eq!(counter.filters, 1);
        assert_eq!(counter.indices, 1);
    }
}
