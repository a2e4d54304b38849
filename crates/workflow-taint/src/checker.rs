//! The untrusted input checker.
//!
//! The checker is a [`Visitor`] that follows property access chains
//! bottom-up. When it reaches a root variable it looks that root up in its
//! [`SearchRoots`], and every subsequent access advances a set of candidate
//! trie nodes. When the chain ends, whatever candidates remain are reported:
//! leaves always, and objects only when they're passed whole into a
//! function call (e.g. `toJSON(github.event.pull_request)`).
//!
//! A single chain can match several candidates at once, since the `.*`
//! filter fans an object out into all of its properties.

use itertools::Itertools as _;
use workflow_expressions::visitor::{Visitable as _, Visitor};
use workflow_expressions::{ErrorKind, Expr, ExprError, Identifier, Span, SpannedExpr};

use crate::property::PropertyMap;
use crate::roots::SearchRoots;

const HARDENING_URL: &str =
    "https://docs.github.com/en/actions/security-guides/security-hardening-for-github-actions";

/// A trie node reachable from the chain seen so far, along with the path
/// taken to reach it.
#[derive(Debug, Clone)]
struct Candidate<'r> {
    node: &'r PropertyMap,
    path: String,
}

impl<'r> Candidate<'r> {
    fn advance(&mut self, node: &'r PropertyMap, segment: &str) {
        self.path.push('.');
        self.path.push_str(segment);
        self.node = node;
    }
}

/// Finds references to untrusted inputs in expressions.
///
/// A checker can be reused across expressions: call
/// [`UntrustedInputChecker::init`] before each traversal.
///
/// ```rust
/// use workflow_expressions::Expr;
/// use workflow_expressions::visitor::Visitable as _;
/// use workflow_taint::UntrustedInputChecker;
/// use workflow_taint::builtin::untrusted_inputs;
///
/// let expr = Expr::parse("github.event.issue.title").unwrap();
/// let mut checker = UntrustedInputChecker::new(untrusted_inputs());
/// expr.accept(&mut checker);
///
/// assert_eq!(checker.errs().len(), 1);
/// ```
#[derive(Debug)]
pub struct UntrustedInputChecker<'r> {
    roots: &'r SearchRoots,
    /// Whether a `.*` filter has been applied to the current chain.
    filtering_object: bool,
    cur: Vec<Candidate<'r>>,
    start: Option<Span>,
    errs: Vec<ExprError>,
    func_arg_depth: usize,
}

impl<'r> UntrustedInputChecker<'r> {
    /// Creates a checker that reports references to anything in `roots`.
    pub fn new(roots: &'r SearchRoots) -> Self {
        Self {
            roots,
            filtering_object: false,
            cur: vec![],
            start: None,
            errs: vec![],
            func_arg_depth: 0,
        }
    }

    /// Resets the checker, including any diagnostics already collected.
    pub fn init(&mut self) {
        self.reset();
        self.errs.clear();
        self.func_arg_depth = 0;
    }

    /// The diagnostics collected so far.
    pub fn errs(&self) -> &[ExprError] {
        &self.errs
    }

    /// Consumes the checker, returning its diagnostics.
    pub fn into_errs(self) -> Vec<ExprError> {
        self.errs
    }

    fn reset(&mut self) {
        self.start = None;
        self.filtering_object = false;
        self.cur.clear();
    }

    fn extend_span(&mut self, span: Span) {
        if !self.cur.is_empty() {
            self.start = Some(span);
        }
    }

    fn on_var(&mut self, ident: &Identifier<'_>, span: Span) {
        let Some(root) = self.roots.get(ident.as_str()) else {
            return;
        };

        self.cur.push(Candidate {
            node: root,
            path: root.name().to_string(),
        });
        self.start = Some(span);
    }

    fn on_prop_access(&mut self, name: &str, span: Span) {
        self.cur.retain_mut(|cand| {
            let node = cand.node;
            match node.find_object_prop(name) {
                Some(child) => {
                    let segment = if child.is_wildcard() { name } else { child.name() };
                    cand.advance(child, segment);
                    true
                }
                None => false,
            }
        });

        self.extend_span(span);
        tracing::trace!("after .{name}: {n} candidates", n = self.cur.len());
    }

    fn on_index_access(&mut self, span: Span) {
        // `github.event.commits.*.message[0]` indexes the filtered result,
        // not the element, so it doesn't move us in the trie.
        if self.filtering_object {
            self.filtering_object = false;
            return;
        }

        self.cur.retain_mut(|cand| {
            let node = cand.node;
            match node.find_array_elem() {
                Some(elem) => {
                    cand.advance(elem, elem.name());
                    true
                }
                None => false,
            }
        });

        self.extend_span(span);
        tracing::trace!("after index: {n} candidates", n = self.cur.len());
    }

    fn on_object_filter(&mut self, span: Span) {
        self.filtering_object = true;

        let mut next = Vec::with_capacity(self.cur.len());
        for mut cand in self.cur.drain(..) {
            let node = cand.node;
            if let Some(elem) = node.find_array_elem() {
                cand.advance(elem, elem.name());
                next.push(cand);
                continue;
            }

            // Each of an object's properties becomes its own candidate.
            // Leaves have nothing to filter and are dropped.
            for child in node.children() {
                let mut fanned = cand.clone();
                fanned.advance(child, child.name());
                next.push(fanned);
            }
        }
        self.cur = next;

        self.extend_span(span);
        tracing::trace!("after .*: {n} candidates", n = self.cur.len());
    }

    fn flush(&mut self) {
        self.end_with_intermediate_check(self.func_arg_depth > 0);
    }

    fn end_in_func_arg(&mut self) {
        self.end_with_intermediate_check(true);
    }

    fn end_with_intermediate_check(&mut self, check_intermediate: bool) {
        if self.cur.is_empty() {
            self.reset();
            return;
        }

        let span = self.start.unwrap_or_default();
        let (leaves, objects): (Vec<_>, Vec<_>) = self.cur.iter().partition(|c| c.node.is_leaf());

        if !leaves.is_empty() {
            let paths = sorted_paths(&leaves);
            let message = match paths.as_slice() {
                [path] => format!(
                    "\"{path}\" is potentially untrusted. avoid using it directly in inline scripts. instead, pass it through an environment variable. see {HARDENING_URL} for more details"
                ),
                paths => format!(
                    "object filter extracts potentially untrusted properties {}. avoid using the value directly in inline scripts. instead, pass the value through an environment variable. see {HARDENING_URL} for more details",
                    quoted(paths)
                ),
            };
            self.report(ErrorKind::UntrustedInput, message, span);
        } else if check_intermediate && !objects.is_empty() {
            let paths = sorted_paths(&objects);
            let message = match paths.as_slice() {
                [path] => format!(
                    "\"{path}\" is a potentially untrusted object passed to a function call. all of its properties may be attacker-controlled. avoid passing it whole; extract the properties you need and pass them through environment variables. see {HARDENING_URL} for more details"
                ),
                paths => format!(
                    "object filter extracts potentially untrusted objects {} passed to a function call. all of their properties may be attacker-controlled. avoid passing them whole; extract the properties you need and pass them through environment variables. see {HARDENING_URL} for more details",
                    quoted(paths)
                ),
            };
            self.report(ErrorKind::UntrustedObject, message, span);
        }

        self.reset();
    }

    fn report(&mut self, kind: ErrorKind, message: String, span: Span) {
        tracing::debug!("untrusted reference at {}..{}: {message}", span.start, span.end);
        self.errs.push(ExprError::new(kind, message, span));
    }
}

fn sorted_paths<'a>(cands: &[&'a Candidate<'_>]) -> Vec<&'a str> {
    cands
        .iter()
        .map(|&c| c.path.as_str())
        .sorted()
        .dedup()
        .collect()
}

fn quoted(paths: &[&str]) -> String {
    paths.iter().map(|p| format!("\"{p}\"")).join(", ")
}

impl<'src> Visitor<'src> for UntrustedInputChecker<'_> {
    fn enter(&mut self, expr: &SpannedExpr<'src>) {
        if let Expr::Call(_) = &expr.inner {
            // A chain pending before the call isn't one of its arguments.
            self.flush();
            self.func_arg_depth += 1;
        }
    }

    fn leave(&mut self, expr: &SpannedExpr<'src>) {
        let span = expr.origin.span;

        match &expr.inner {
            Expr::Variable(ident) => {
                // A new chain begins; anything pending belongs to the
                // previous one.
                self.flush();
                self.on_var(ident, span);
            }
            Expr::Deref { property, .. } => self.on_prop_access(property.as_str(), span),
            Expr::Index { index, .. } => match index.as_string_literal() {
                Some(name) => self.on_prop_access(name, span),
                None => self.on_index_access(span),
            },
            Expr::ArrayDeref(_) => self.on_object_filter(span),
            Expr::Call(_) => {
                self.end_in_func_arg();
                self.func_arg_depth = self.func_arg_depth.saturating_sub(1);
            }
            Expr::Literal(_) | Expr::BinOp { .. } | Expr::UnOp { .. } => self.flush(),
        }
    }

    fn end(&mut self) {
        self.flush();
    }
}

/// Checks `expr` against `roots` in one go, returning the diagnostics.
pub fn check_untrusted(roots: &SearchRoots, expr: &SpannedExpr<'_>) -> Vec<ExprError> {
    let mut checker = UntrustedInputChecker::new(roots);
    expr.accept(&mut checker);
    checker.into_errs()
}
