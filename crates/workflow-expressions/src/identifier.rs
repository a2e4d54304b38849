//! Identifiers.

use std::fmt;

/// Represents a single identifier in a workflow expression: a context
/// root like `github` or a property name like `pull_request`.
///
/// Identifiers are case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct Identifier<'src>(pub(crate) &'src str);

impl<'src> Identifier<'src> {
    /// Returns the identifier as a string slice, as it appears in the
    /// expression.
    ///
    /// Important: identifiers are case-insensitive, so this should not
    /// be used for comparisons.
    pub fn as_str(&self) -> &'src str {
        self.0
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl PartialEq for Identifier<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}

impl PartialEq<str> for Identifier<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

#[cfg(test)]
mod tests {
    use super::Identifier;

    #[test]
    fn test_identifier_eq() {
        let ident = Identifier("pull_request");
        assert_eq!(&ident, "pull_request");
        assert_eq!(&ident, "PULL_REQUEST");
        assert_eq!(ident, Identifier("Pull_Request"));
        assert_ne!(&ident, "pull-request");
        assert_eq!(ident.to_string(), "pull_request");
    }
}
