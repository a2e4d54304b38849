//! A recursive-descent parser for workflow expressions.
//!
//! Precedence, from loosest to tightest:
//!
//! 1. `||`
//! 2. `&&`
//! 3. `==`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 5. prefix `!`
//! 6. postfix `.prop`, `.*`, `[index]`
//! 7. primaries: variables, calls, literals and parenthesized expressions
//!
//! All binary operators are left-associative.

use itertools::Itertools as _;

use crate::{
    BinOp, Call, Expr, ExprError, Function, Identifier, Literal, Origin, Span, SpannedExpr, UnOp,
    lexer::{Token, TokenKind},
};

type ParseResult<'src> = Result<SpannedExpr<'src>, ExprError>;

/// How deeply expressions may nest before parsing gives up. Every
/// parenthesis, `!`, call, index, postfix link and binary operator counts
/// as a level, since each one adds a level to the tree.
const MAX_DEPTH: usize = 256;

/// Parses a token stream (see [`crate::tokenize`]) into an expression tree.
pub struct Parser<'src> {
    src: &'src str,
    tokens: Vec<Token<'src>>,
    pos: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for `tokens`, which must have been produced
    /// from `src`.
    pub fn new(src: &'src str, mut tokens: Vec<Token<'src>>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::End) {
            tokens.push(Token {
                kind: TokenKind::End,
                value: "",
                offset: src.len(),
            });
        }

        Self {
            src,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses the token stream into a single expression.
    ///
    /// Returns the parsed tree (if any) along with any errors. When a
    /// complete expression is followed by stray tokens, both the expression
    /// and an error for the first stray token are returned.
    pub fn parse(mut self) -> (Option<SpannedExpr<'src>>, Vec<ExprError>) {
        let expr = match self.parse_or() {
            Ok(expr) => expr,
            Err(err) => return (None, vec![err]),
        };

        let tok = self.peek();
        if tok.kind == TokenKind::End {
            (Some(expr), vec![])
        } else {
            let err = ExprError::syntax(
                format!(
                    "unexpected {} after the end of expression. expecting \"END\"",
                    tok.describe()
                ),
                tok.span(),
            );
            (Some(expr), vec![err])
        }
    }

    fn peek(&self) -> Token<'src> {
        // `new` guarantees a trailing `End`, which is never consumed.
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .copied()
            .unwrap_or(Token {
                kind: TokenKind::End,
                value: "",
                offset: self.src.len(),
            })
    }

    fn bump(&mut self) -> Token<'src> {
        let tok = self.peek();
        if tok.kind != TokenKind::End {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, parsing: &str) -> Result<Token<'src>, ExprError> {
        let tok = self.bump();
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(unexpected(&tok, parsing, &[kind]))
        }
    }

    /// Enters one more level of nesting at `tok`.
    fn descend(&mut self, tok: &Token<'src>) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::syntax("expression nests too deeply", tok.span()));
        }
        Ok(())
    }

    fn spanned(&self, span: Span, inner: Expr<'src>) -> SpannedExpr<'src> {
        let raw = self.src.get(span.as_range()).unwrap_or_default();
        SpannedExpr::new(Origin::new(span, raw), inner)
    }

    /// Parses a left-associative chain of binary operators.
    fn parse_binops(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<'src>,
        op_for: fn(TokenKind) -> Option<BinOp>,
    ) -> ParseResult<'src> {
        let depth = self.depth;
        let mut lhs = operand(self)?;

        while let Some(op) = op_for(self.peek().kind) {
            let tok = self.bump();
            self.descend(&tok)?;
            let rhs = operand(self)?;
            let span = lhs.origin.span.join(rhs.origin.span);
            lhs = self.spanned(
                span,
                Expr::BinOp {
                    lhs: lhs.into(),
                    op,
                    rhs: rhs.into(),
                },
            );
        }

        self.depth = depth;
        Ok(lhs)
    }

    fn parse_or(&mut self) -> ParseResult<'src> {
        self.parse_binops(Self::parse_and, |kind| {
            (kind == TokenKind::Or).then_some(BinOp::Or)
        })
    }

    fn parse_and(&mut self) -> ParseResult<'src> {
        self.parse_binops(Self::parse_equality, |kind| {
            (kind == TokenKind::And).then_some(BinOp::And)
        })
    }

    fn parse_equality(&mut self) -> ParseResult<'src> {
        self.parse_binops(Self::parse_comparison, |kind| match kind {
            TokenKind::Eq => Some(BinOp::Eq),
            TokenKind::NotEq => Some(BinOp::Neq),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> ParseResult<'src> {
        self.parse_binops(Self::parse_unary, |kind| match kind {
            TokenKind::Less => Some(BinOp::Lt),
            TokenKind::LessEq => Some(BinOp::Le),
            TokenKind::Greater => Some(BinOp::Gt),
            TokenKind::GreaterEq => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> ParseResult<'src> {
        if self.peek().kind != TokenKind::Not {
            return self.parse_postfix();
        }

        let not = self.bump();
        self.descend(&not)?;
        let operand = self.parse_unary()?;
        self.depth -= 1;
        let span = not.span().join(operand.origin.span);
        Ok(self.spanned(
            span,
            Expr::UnOp {
                op: UnOp::Not,
                expr: operand.into(),
            },
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<'src> {
        let depth = self.depth;
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    let dot = self.bump();
                    self.descend(&dot)?;
                    let tok = self.bump();
                    let span = expr.origin.span.join(tok.span());
                    let inner = match tok.kind {
                        TokenKind::Ident => Expr::Deref {
                            receiver: expr.into(),
                            property: Identifier(tok.value),
                        },
                        TokenKind::Star => Expr::ArrayDeref(expr.into()),
                        _ => {
                            return Err(unexpected(
                                &tok,
                                "object property dereference like 'a.b' or array element dereference like 'a.*'",
                                &[TokenKind::Ident, TokenKind::Star],
                            ));
                        }
                    };
                    expr = self.spanned(span, inner);
                }
                TokenKind::LeftBracket => {
                    let open = self.bump();
                    self.descend(&open)?;
                    let index = self.parse_or()?;
                    let close = self.expect(TokenKind::RightBracket, "closing bracket of index access")?;
                    let span = expr.origin.span.join(close.span());
                    expr = self.spanned(
                        span,
                        Expr::Index {
                            receiver: expr.into(),
                            index: index.into(),
                        },
                    );
                }
                _ => {
                    self.depth = depth;
                    return Ok(expr);
                }
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<'src> {
        let tok = self.bump();

        match tok.kind {
            TokenKind::Ident if self.peek().kind == TokenKind::LeftParen => self.parse_call(tok),
            TokenKind::Ident => {
                let inner = match tok.value {
                    "true" => Expr::Literal(Literal::Boolean(true)),
                    "false" => Expr::Literal(Literal::Boolean(false)),
                    "null" => Expr::Literal(Literal::Null),
                    name => Expr::Variable(Identifier(name)),
                };
                Ok(self.spanned(tok.span(), inner))
            }
            TokenKind::String => Ok(self.spanned(
                tok.span(),
                Expr::Literal(Literal::from_quoted(tok.value)),
            )),
            TokenKind::Int | TokenKind::Float => {
                let value = parse_number(tok.value).ok_or_else(|| {
                    ExprError::syntax(
                        format!("invalid number literal \"{}\"", tok.value),
                        tok.span(),
                    )
                })?;
                Ok(self.spanned(tok.span(), Expr::Literal(Literal::Number(value))))
            }
            TokenKind::LeftParen => {
                self.descend(&tok)?;
                let inner = self.parse_or()?;
                let close =
                    self.expect(TokenKind::RightParen, "closing parenthesis of nested expression")?;
                self.depth -= 1;
                // The parenthesized node keeps its own shape, but its span
                // grows to include the parentheses.
                let span = tok.span().join(close.span());
                Ok(self.spanned(span, inner.inner))
            }
            _ => Err(unexpected(
                &tok,
                "variable access, function call, null, bool, int, float or string",
                &[
                    TokenKind::Ident,
                    TokenKind::LeftParen,
                    TokenKind::Int,
                    TokenKind::Float,
                    TokenKind::String,
                ],
            )),
        }
    }

    fn parse_call(&mut self, name: Token<'src>) -> ParseResult<'src> {
        let open = self.bump();
        self.descend(&open)?;

        let mut args = vec![];
        let close = if self.peek().kind == TokenKind::RightParen {
            self.bump()
        } else {
            loop {
                args.push(self.parse_or()?);

                let tok = self.bump();
                match tok.kind {
                    TokenKind::Comma => continue,
                    TokenKind::RightParen => break tok,
                    _ => {
                        return Err(unexpected(
                            &tok,
                            &format!("arguments of function call \"{}\"", name.value),
                            &[TokenKind::Comma, TokenKind::RightParen],
                        ));
                    }
                }
            }
        };
        self.depth -= 1;

        Ok(self.spanned(
            name.span().join(close.span()),
            Expr::Call(Call {
                func: Function(name.value),
                args,
            }),
        ))
    }
}

fn unexpected(tok: &Token<'_>, parsing: &str, expected: &[TokenKind]) -> ExprError {
    let expecting = expected.iter().map(|k| format!("\"{k}\"")).join(", ");
    ExprError::syntax(
        format!(
            "unexpected {} while parsing {parsing}. expecting {expecting}",
            tok.describe()
        ),
        tok.span(),
    )
}

fn parse_number(raw: &str) -> Option<f64> {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()? as f64,
        None => digits.parse::<f64>().ok()?,
    };

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::Parser;
    use crate::{BinOp, ErrorKind, Expr, Literal, Span, UnOp, tokenize};

    /// Renders an expression as an S-expression, which keeps the
    /// tree-shape assertions readable.
    fn sexpr(expr: &Expr<'_>) -> String {
        match expr {
            Expr::Literal(Literal::String(s)) => format!("'{s}'"),
            Expr::Literal(lit) => lit.as_str().into_owned(),
            Expr::Variable(ident) => ident.to_string(),
            Expr::Deref { receiver, property } => format!("(. {} {property})", sexpr(receiver)),
            Expr::Index { receiver, index } => {
                format!("([] {} {})", sexpr(receiver), sexpr(index))
            }
            Expr::ArrayDeref(receiver) => format!("(.* {})", sexpr(receiver)),
            Expr::Call(call) => {
                let mut out = format!("({}", call.func);
                for arg in &call.args {
                    out.push(' ');
                    out.push_str(&sexpr(arg));
                }
                out.push(')');
                out
            }
            Expr::BinOp { lhs, op, rhs } => format!("({op} {} {})", sexpr(lhs), sexpr(rhs)),
            Expr::UnOp {
                op: UnOp::Not,
                expr,
            } => format!("(! {})", sexpr(expr)),
        }
    }

    #[test]
    fn test_parse_shapes() -> Result<()> {
        for (case, expected) in &[
            ("github", "github"),
            ("github.event.issue.title", "(. (. (. github event) issue) title)"),
            ("inputs.foo-bar", "(. inputs foo-bar)"),
            ("foo.*.bar", "(. (.* foo) bar)"),
            (
                "github.event.issue.labels.*.name",
                "(. (.* (. (. (. github event) issue) labels)) name)",
            ),
            ("foo.bar.baz[1][2]", "([] ([] (. (. foo bar) baz) 1) 2)"),
            (
                "github['event']['inputs']['dry-run']",
                "([] ([] ([] github 'event') 'inputs') 'dry-run')",
            ),
            (
                "github[format('{0}', 'event')]",
                "([] github (format '{0}' 'event'))",
            ),
            ("foo()[0]", "([] (foo) 0)"),
            (
                "fromJson(steps.runs.outputs.data).workflow_runs[0].id",
                "(. ([] (. (fromJson (. (. (. steps runs) outputs) data)) workflow_runs) 0) id)",
            ),
            ("github['event']['inputs'].*", "(.* ([] ([] github 'event') 'inputs'))"),
            ("!true || false || true", "(|| (|| (! true) false) true)"),
            ("'foo '' bar'", "'foo ' bar'"),
            ("((('foo '' bar')))", "'foo ' bar'"),
            ("foo(1, 2, 3)", "(foo 1 2 3)"),
            (
                "github.ref == 'refs/heads/main' && 'value_for_main_branch' || 'value_for_other_branches'",
                "(|| (&& (== (. github ref) 'refs/heads/main') 'value_for_main_branch') 'value_for_other_branches')",
            ),
            ("(true || false) == true", "(== (|| true false) true)"),
            ("!(!true || false)", "(! (|| (! true) false))"),
            ("a == b < c", "(== a (< b c))"),
            ("a < b == c", "(== (< a b) c)"),
            ("a || b && c", "(|| a (&& b c))"),
            ("a && b || c && d", "(|| (&& a b) (&& c d))"),
            ("!!a", "(! (! a))"),
            ("!a.b", "(! (. a b))"),
            ("a.true", "(. a true)"),
            ("null == null", "(== null null)"),
            ("case(a, 1, b, 2, 3)", "(case a 1 b 2 3)"),
            ("github.event.commits.*.message[0]", "([] (. (.* (. (. github event) commits)) message) 0)"),
        ] {
            let expr = Expr::parse(case)?;
            assert_eq!(sexpr(&expr), *expected, "failed for {case}");
        }

        Ok(())
    }

    #[test]
    fn test_parse_multiline() -> Result<()> {
        let multiline = "github.repository_owner == 'Homebrew' &&
        ((github.event_name == 'pull_request_review' && github.event.review.state == 'approved') ||
        (github.event_name == 'pull_request_target' &&
        (github.event.action == 'ready_for_review' || github.event.label.name == 'automerge-skip')))";

        let expr = Expr::parse(multiline)?;
        let Expr::BinOp { op, rhs, .. } = &expr.inner else {
            panic!("expected binop");
        };
        assert_eq!(*op, BinOp::And);
        assert!(rhs.origin.raw.starts_with("((github.event_name"));
        assert!(rhs.origin.raw.ends_with("'automerge-skip')))"));

        Ok(())
    }

    #[test]
    fn test_parse_spans() -> Result<()> {
        let expr = Expr::parse("toJSON(github.event.pull_request)")?;
        assert_eq!(expr.origin.span, Span::from(0..33));

        let Expr::Call(call) = &expr.inner else {
            panic!("expected call");
        };
        assert_eq!(call.args[0].origin.raw, "github.event.pull_request");
        assert_eq!(call.args[0].origin.span, Span::from(7..32));

        let expr = Expr::parse("( a )")?;
        assert_eq!(expr.origin.raw, "( a )");

        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        for (case, span, message) in [
            (
                "github.",
                7..7,
                "unexpected end of input while parsing object property dereference like 'a.b' or array element dereference like 'a.*'. expecting \"IDENT\", \"*\"",
            ),
            (
                "github.event.1",
                13..14,
                "unexpected token \"1\" while parsing object property dereference like 'a.b' or array element dereference like 'a.*'. expecting \"IDENT\", \"*\"",
            ),
            (
                "foo(1 2)",
                6..7,
                "unexpected token \"2\" while parsing arguments of function call \"foo\". expecting \",\", \")\"",
            ),
            (
                "foo[0",
                5..5,
                "unexpected end of input while parsing closing bracket of index access. expecting \"]\"",
            ),
            (
                "(a || b",
                7..7,
                "unexpected end of input while parsing closing parenthesis of nested expression. expecting \")\"",
            ),
            (
                "a ==",
                4..4,
                "unexpected end of input while parsing variable access, function call, null, bool, int, float or string. expecting \"IDENT\", \"(\", \"INTEGER\", \"FLOAT\", \"STRING\"",
            ),
            (
                "",
                0..0,
                "unexpected end of input while parsing variable access, function call, null, bool, int, float or string. expecting \"IDENT\", \"(\", \"INTEGER\", \"FLOAT\", \"STRING\"",
            ),
            (
                "foo[*]",
                4..5,
                "unexpected token \"*\" while parsing variable access, function call, null, bool, int, float or string. expecting \"IDENT\", \"(\", \"INTEGER\", \"FLOAT\", \"STRING\"",
            ),
        ] {
            let err = Expr::parse(case).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax, "bad kind for {case:?}");
            assert_eq!(err.span, Span::from(span), "bad span for {case:?}");
            assert_eq!(err.message, message, "bad message for {case:?}");
        }
    }

    #[test]
    fn test_parse_nesting_limit() {
        let deep_parens = format!("{}a{}", "(".repeat(5000), ")".repeat(5000));
        let deep_nots = format!("{}a", "!".repeat(5000));
        let long_chain = format!("a{}", ".b".repeat(5000));
        let long_index = format!("a{}", "[0]".repeat(5000));
        let long_binops = format!("a{}", " || a".repeat(5000));
        let deep_calls = format!("{}a{}", "f(".repeat(5000), ")".repeat(5000));

        for (case, span) in [
            (&deep_parens, 256..257),
            (&deep_nots, 256..257),
            (&long_chain, 513..514),
            (&long_index, 769..770),
            (&long_binops, 1282..1284),
            (&deep_calls, 513..514),
        ] {
            let err = Expr::parse(case).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax);
            assert_eq!(err.message, "expression nests too deeply");
            assert_eq!(err.span, Span::from(span), "bad span for {:?}", &case[..10]);
        }
    }

    #[test]
    fn test_parse_nesting_within_limit() -> Result<()> {
        // Depth is per path, not per expression.
        for case in [
            format!("{}a{}", "(".repeat(100), ")".repeat(100)),
            format!("a{}", ".b".repeat(200)),
            vec!["github.event.issue.title"; 200].join(" || "),
            vec!["(!a.b[0])"; 200].join(" && "),
        ] {
            Expr::parse(&case)?;
        }

        Ok(())
    }

    #[test]
    fn test_parse_partial_result() -> Result<()> {
        let src = "github.actor 'trailing'";
        let (expr, errors) = Parser::new(src, tokenize(src)?).parse();

        let expr = expr.expect("complete prefix should still parse");
        assert_eq!(expr.origin.raw, "github.actor");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span, Span::from(13..23));
        assert_eq!(
            errors[0].message,
            "unexpected token \"'trailing'\" after the end of expression. expecting \"END\""
        );

        Ok(())
    }

    #[test]
    fn test_parse_without_end_token() {
        // A caller-built token stream without a trailing `End` still parses.
        let src = "foo";
        let mut tokens = tokenize(src).unwrap();
        tokens.pop();

        let (expr, errors) = Parser::new(src, tokens).parse();
        assert!(errors.is_empty());
        assert_eq!(expr.unwrap().origin.raw, "foo");
    }
}
