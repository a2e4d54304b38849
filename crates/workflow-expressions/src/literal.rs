//! Literal values.

use std::borrow::Cow;

/// Represents a literal value in a workflow expression.
#[derive(Debug, PartialEq)]
pub enum Literal<'src> {
    /// A number literal. Integers (including hex integers) are widened.
    Number(f64),
    /// A string literal, with `''` escapes already collapsed.
    String(Cow<'src, str>),
    /// A boolean literal.
    Boolean(bool),
    /// The `null` literal.
    Null,
}

impl<'src> Literal<'src> {
    /// Returns a string representation of the literal.
    ///
    /// This is not guaranteed to be an exact equivalent of the literal
    /// as it appears in its source expression. For example, the string
    /// representation of a floating point literal is subject to normalization,
    /// and string literals are returned without surrounding quotes.
    pub fn as_str(&self) -> Cow<'src, str> {
        match self {
            Literal::String(s) => s.clone(),
            Literal::Number(n) => Cow::Owned(n.to_string()),
            Literal::Boolean(b) => Cow::Owned(b.to_string()),
            Literal::Null => Cow::Borrowed("null"),
        }
    }

    /// Builds a string literal from its quoted source form, e.g. `'it''s'`.
    ///
    /// Borrows from the source unless there are escapes to collapse.
    pub(crate) fn from_quoted(quoted: &'src str) -> Self {
        let inner = quoted
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(quoted);

        if inner.contains("''") {
            Literal::String(Cow::Owned(inner.replace("''", "'")))
        } else {
            Literal::String(Cow::Borrowed(inner))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use anyhow::Result;

    use super::Literal;
    use crate::Expr;

    #[test]
    fn test_from_quoted() {
        for (quoted, expected) in &[
            ("''", ""),
            ("' '", " "),
            ("''''", "'"),
            ("'test'", "test"),
            ("'spaces are ok'", "spaces are ok"),
            ("'escaping '' works'", "escaping ' works"),
        ] {
            assert_eq!(
                Literal::from_quoted(quoted),
                Literal::String(Cow::Borrowed(*expected))
            );
        }

        assert!(matches!(
            Literal::from_quoted("'plain'"),
            Literal::String(Cow::Borrowed(_))
        ));
    }

    #[test]
    fn test_parse_literals() -> Result<()> {
        let test_cases = &[
            ("'hello'", Literal::String("hello".into())),
            ("42", Literal::Number(42.0)),
            ("-42", Literal::Number(-42.0)),
            ("3.5", Literal::Number(3.5)),
            ("1e3", Literal::Number(1000.0)),
            ("0xff", Literal::Number(255.0)),
            ("true", Literal::Boolean(true)),
            ("false", Literal::Boolean(false)),
            ("null", Literal::Null),
        ];

        for (expr_str, expected) in test_cases {
            let expr = Expr::parse(expr_str)?;
            let Expr::Literal(lit) = &expr.inner else {
                panic!("expected literal for {expr_str}, got {expr:?}");
            };
            assert_eq!(lit, expected, "Failed for expression: {expr_str}");
        }

        Ok(())
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Literal::Number(1.0).as_str(), "1");
        assert_eq!(Literal::Number(1.5).as_str(), "1.5");
        assert_eq!(Literal::Boolean(true).as_str(), "true");
        assert_eq!(Literal::Null.as_str(), "null");
        assert_eq!(Literal::String("abc".into()).as_str(), "abc");
    }
}
