//! Tokenization of workflow expressions.
//!
//! The lexer operates on the text *inside* `${{ ... }}`; the caller is
//! responsible for stripping the delimiters.

use std::fmt;

use crate::{ExprError, Span};

/// The kind of a [`Token`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// The end of the input.
    End,
    /// An identifier, including `true`, `false` and `null`.
    Ident,
    /// A single-quoted string literal.
    String,
    /// An integer literal, including hex integers.
    Int,
    /// A floating point literal.
    Float,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `*`
    Star,
    /// `!`
    Not,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl TokenKind {
    /// Returns a short human-readable name for the token kind, used
    /// in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::End => "END",
            TokenKind::Ident => "IDENT",
            TokenKind::String => "STRING",
            TokenKind::Int => "INTEGER",
            TokenKind::Float => "FLOAT",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Star => "*",
            TokenKind::Not => "!",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A single token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Token<'src> {
    /// The token's kind.
    pub kind: TokenKind,
    /// The token's source text. Empty for [`TokenKind::End`].
    pub value: &'src str,
    /// The byte offset of the token within the expression.
    pub offset: usize,
}

impl Token<'_> {
    /// Returns the token's span.
    pub fn span(&self) -> Span {
        Span::from(self.offset..self.offset + self.value.len())
    }

    /// Renders the token for use in a diagnostic.
    pub(crate) fn describe(&self) -> String {
        match self.kind {
            TokenKind::End => "end of input".into(),
            _ => format!("token \"{}\"", self.value),
        }
    }
}

/// Every character class that can start a token.
const EXPECTED_START: &str = "'a'..'z', 'A'..'Z', '_', '0'..'9', '-', ''', '(', ')', '[', ']', '.', ',', '*', '!', '<', '>', '=', '&', '|'";

/// Tokenizes the given expression.
///
/// On success the returned stream always ends with a [`TokenKind::End`]
/// token positioned at the end of the input.
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, ExprError> {
    Lexer::new(src).collect()
}

/// An iterator of tokens over an expression's source.
///
/// Yields a single [`TokenKind::End`] token and then stops. Stops after
/// the first error, since the remaining input can't be meaningfully
/// re-synchronized.
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    done: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer over `src`.
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            done: false,
        }
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek_byte(0).is_some_and(&pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'src> {
        Token {
            kind,
            value: &self.src[start..self.pos],
            offset: start,
        }
    }

    /// Builds an error for whatever is at the current position.
    fn unexpected(&self, lexing: &str, expecting: &str) -> ExprError {
        match self.src[self.pos..].chars().next() {
            Some(c) => {
                let mut message = format!(
                    "unexpected character {c:?} while lexing {lexing}, expecting {expecting}"
                );
                if c == '"' {
                    message.push_str(
                        ". do you mean string literals? only single quotes are available for string delimiter",
                    );
                }
                ExprError::lexical(message, self.pos..self.pos + c.len_utf8())
            }
            None => ExprError::lexical(
                format!("unexpected end of input while lexing {lexing}, expecting {expecting}"),
                self.pos..self.pos,
            ),
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<Token<'src>, ExprError> {
        if self.peek_byte(0) == Some(b'-') {
            self.pos += 1;
            if !self.peek_byte(0).is_some_and(|b| b.is_ascii_digit()) {
                return Err(self.unexpected("number", "'0'..'9'"));
            }
        }

        let mut kind = TokenKind::Int;

        if self.peek_byte(0) == Some(b'0') && matches!(self.peek_byte(1), Some(b'x' | b'X')) {
            self.pos += 2;
            if self.eat_while(|b| b.is_ascii_hexdigit()) == 0 {
                return Err(self.unexpected("hex integer", "'0'..'9', 'a'..'f', 'A'..'F'"));
            }
        } else {
            self.eat_while(|b| b.is_ascii_digit());

            if self.peek_byte(0) == Some(b'.') && self.peek_byte(1).is_some_and(|b| b.is_ascii_digit())
            {
                self.pos += 1;
                self.eat_while(|b| b.is_ascii_digit());
                kind = TokenKind::Float;
            }

            if matches!(self.peek_byte(0), Some(b'e' | b'E')) {
                self.pos += 1;
                if matches!(self.peek_byte(0), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                if self.eat_while(|b| b.is_ascii_digit()) == 0 {
                    return Err(self.unexpected("exponent part of float", "'0'..'9'"));
                }
                kind = TokenKind::Float;
            }
        }

        // `1abc` is never valid.
        if self.peek_byte(0).is_some_and(is_ident_continue) {
            return Err(self.unexpected("number", "operator or punctuation"));
        }

        Ok(self.token(kind, start))
    }

    fn lex_string(&mut self, start: usize) -> Result<Token<'src>, ExprError> {
        // Opening quote.
        self.pos += 1;

        loop {
            match self.src[self.pos..].find('\'') {
                Some(idx) => {
                    self.pos += idx + 1;
                    // `''` is an escaped quote, not the end of the string.
                    if self.peek_byte(0) == Some(b'\'') {
                        self.pos += 1;
                    } else {
                        return Ok(self.token(TokenKind::String, start));
                    }
                }
                None => {
                    return Err(ExprError::lexical(
                        "unexpected end of input while lexing end of string literal, expecting '''",
                        start..self.src.len(),
                    ));
                }
            }
        }
    }

    /// Lexes a two-character operator whose first character has already
    /// been seen, e.g. `&&`.
    fn lex_pair(&mut self, second: u8, kind: TokenKind, start: usize) -> Result<Token<'src>, ExprError> {
        self.pos += 1;
        if self.peek_byte(0) == Some(second) {
            self.pos += 1;
            Ok(self.token(kind, start))
        } else {
            Err(self.unexpected(
                &format!("\"{kind}\" operator"),
                &format!("{:?}", second as char),
            ))
        }
    }

    fn next_token(&mut self) -> Result<Token<'src>, ExprError> {
        self.eat_while(|b| b.is_ascii_whitespace());
        let start = self.pos;

        let Some(b) = self.peek_byte(0) else {
            return Ok(self.token(TokenKind::End, start));
        };

        let kind = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_while(is_ident_continue);
                return Ok(self.token(TokenKind::Ident, start));
            }
            b'0'..=b'9' | b'-' => return self.lex_number(start),
            b'\'' => return self.lex_string(start),
            b'=' => return self.lex_pair(b'=', TokenKind::Eq, start),
            b'&' => return self.lex_pair(b'&', TokenKind::And, start),
            b'|' => return self.lex_pair(b'|', TokenKind::Or, start),
            b'!' | b'<' | b'>' if self.peek_byte(1) == Some(b'=') => {
                self.pos += 2;
                let kind = match b {
                    b'!' => TokenKind::NotEq,
                    b'<' => TokenKind::LessEq,
                    _ => TokenKind::GreaterEq,
                };
                return Ok(self.token(kind, start));
            }
            b'!' => TokenKind::Not,
            b'<' => TokenKind::Less,
            b'>' => TokenKind::Greater,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b'.' => TokenKind::Dot,
            b',' => TokenKind::Comma,
            b'*' => TokenKind::Star,
            _ => return Err(self.unexpected("expression", EXPECTED_START)),
        };

        self.pos += 1;
        Ok(self.token(kind, start))
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, ExprError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.next_token();
        self.done = matches!(
            result,
            Err(_)
                | Ok(Token {
                    kind: TokenKind::End,
                    ..
                })
        );
        Some(result)
    }
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}
