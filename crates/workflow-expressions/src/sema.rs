//! Semantic checks for parsed expressions.
//!
//! These catch mistakes the parser can't: calls to functions that don't
//! exist, calls with the wrong number of arguments, `format` strings that
//! don't line up with their arguments, and references to unknown contexts
//! or unknown properties of contexts with a fixed shape.

use std::collections::BTreeSet;

use itertools::Itertools as _;

use crate::visitor::{Visitor, walk};
use crate::{Call, Expr, ExprError, Identifier, SpannedExpr};

pub mod contexts;
pub mod functions;

use contexts::ContextSchema;

/// Checks expressions against the builtin function signatures and the
/// context roots available where the expression appears.
#[derive(Debug, Clone)]
pub struct SemanticsChecker {
    contexts: Vec<&'static ContextSchema>,
    errs: Vec<ExprError>,
}

impl Default for SemanticsChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticsChecker {
    /// Creates a checker that accepts every builtin context.
    pub fn new() -> Self {
        Self {
            contexts: contexts::BUILTIN_CONTEXTS.iter().collect(),
            errs: vec![],
        }
    }

    /// Creates a checker that only accepts the given contexts.
    ///
    /// Names that aren't builtin contexts are ignored.
    pub fn with_available_contexts<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut contexts = vec![];
        for name in names {
            match contexts::lookup(name) {
                Some(ctx) if !contexts.contains(&ctx) => contexts.push(ctx),
                Some(_) => {}
                None => tracing::debug!("ignoring unknown context {name}"),
            }
        }

        Self {
            contexts,
            errs: vec![],
        }
    }

    /// Checks `expr`, returning every problem found.
    pub fn check(&mut self, expr: &SpannedExpr<'_>) -> Vec<ExprError> {
        self.errs.clear();
        walk(expr, self);
        tracing::debug!(
            "semantic check of {raw} produced {n} errors",
            raw = expr.origin.raw,
            n = self.errs.len()
        );
        std::mem::take(&mut self.errs)
    }

    fn available_contexts(&self) -> String {
        self.contexts
            .iter()
            .map(|ctx| format!("\"{}\"", ctx.name))
            .join(", ")
    }

    fn check_call(&mut self, expr: &SpannedExpr<'_>, call: &Call<'_>) {
        let Some(sig) = functions::lookup(call.func.as_str()) else {
            let available = functions::BUILTIN_FUNCTIONS
                .iter()
                .map(|sig| format!("\"{}\"", sig.name))
                .join(", ");
            self.errs.push(ExprError::semantic(
                format!(
                    "undefined function \"{}\". available functions are {available}",
                    call.func
                ),
                expr.origin.span,
            ));
            return;
        };

        if let Some(msg) = sig.check_arity(call.args.len()) {
            self.errs.push(ExprError::semantic(msg, expr.origin.span));
            return;
        }

        if sig.name == "format" {
            self.check_format(call);
        }
    }

    fn check_format(&mut self, call: &Call<'_>) {
        let Some((fmt_arg, args)) = call.args.split_first() else {
            return;
        };
        let Some(fmt) = fmt_arg.as_string_literal() else {
            return;
        };

        let placeholders = format_placeholders(fmt);

        if let Some(&max) = placeholders.last()
            && max >= args.len()
        {
            self.errs.push(ExprError::semantic(
                format!(
                    "format string \"{fmt}\" contains placeholder {{{max}}} but only {n} arguments are given to format",
                    n = args.len()
                ),
                fmt_arg.origin.span,
            ));
        }

        for (idx, arg) in args.iter().enumerate() {
            if !placeholders.contains(&idx) {
                self.errs.push(ExprError::semantic(
                    format!(
                        "format string \"{fmt}\" does not contain placeholder {{{idx}}}. remove argument which is unused in the format string"
                    ),
                    arg.origin.span,
                ));
            }
        }
    }

    fn check_variable(&mut self, expr: &SpannedExpr<'_>, ident: &Identifier<'_>) {
        if self.contexts.iter().any(|ctx| *ident == *ctx.name) {
            return;
        }

        let msg = if contexts::lookup(ident.as_str()).is_some() {
            format!(
                "context \"{ident}\" is not allowed here. available contexts are {}",
                self.available_contexts()
            )
        } else {
            format!(
                "undefined variable \"{ident}\". available variables are {}",
                self.available_contexts()
            )
        };

        self.errs.push(ExprError::semantic(msg, expr.origin.span));
    }

    /// Checks `root.property` where `root` has a fixed set of properties.
    fn check_root_property(&mut self, expr: &SpannedExpr<'_>, receiver: &Expr<'_>, prop: &str) {
        let Expr::Variable(root) = receiver else {
            return;
        };
        let Some(ctx) = self.contexts.iter().find(|ctx| *root == *ctx.name) else {
            return;
        };

        if let Some(props) = ctx.properties
            && !ctx.has_property(prop)
        {
            let props = props.iter().map(|p| format!("\"{p}\"")).join(", ");
            self.errs.push(ExprError::semantic(
                format!(
                    "property \"{prop}\" is not defined in object type \"{}\". available properties are {props}",
                    ctx.name
                ),
                expr.origin.span,
            ));
        }
    }
}

impl<'src> Visitor<'src> for SemanticsChecker {
    fn leave(&mut self, expr: &SpannedExpr<'src>) {
        match &expr.inner {
            Expr::Call(call) => self.check_call(expr, call),
            Expr::Variable(ident) => self.check_variable(expr, ident),
            Expr::Deref { receiver, property } => {
                self.check_root_property(expr, receiver, property.as_str())
            }
            Expr::Index { receiver, index } => {
                if let Some(prop) = index.as_string_literal() {
                    self.check_root_property(expr, receiver, prop);
                }
            }
            _ => {}
        }
    }
}

/// Returns the indices of every `{N}` placeholder in a `format` string.
/// `{{` and `}}` are escapes and never start or end a placeholder.
fn format_placeholders(fmt: &str) -> BTreeSet<usize> {
    let mut found = BTreeSet::new();
    let bytes = fmt.as_bytes();
    let mut idx = 0;

    while let Some(&b) = bytes.get(idx) {
        match b {
            b'{' if bytes.get(idx + 1) == Some(&b'{') => idx += 2,
            b'}' if bytes.get(idx + 1) == Some(&b'}') => idx += 2,
            b'{' => {
                let digits = bytes[idx + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();

                if digits > 0 && bytes.get(idx + 1 + digits) == Some(&b'}') {
                    if let Ok(n) = fmt[idx + 1..idx + 1 + digits].parse() {
                        found.insert(n);
                    }
                    idx += digits + 2;
                } else {
                    idx += 1;
                }
            }
            _ => idx += 1,
        }
    }

    found
}
