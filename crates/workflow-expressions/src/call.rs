//! Representation of function calls in workflow expressions.

use std::fmt;

use crate::SpannedExpr;

/// Represents a function in a workflow expression.
///
/// Function names are case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct Function<'src>(pub(crate) &'src str);

impl<'src> Function<'src> {
    /// Returns the function name as it appears in the expression.
    pub fn as_str(&self) -> &'src str {
        self.0
    }
}

impl fmt::Display for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl PartialEq for Function<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(other.0)
    }
}
impl PartialEq<str> for Function<'_> {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

/// Represents a function call in a workflow expression.
#[derive(Debug, PartialEq)]
pub struct Call<'src> {
    /// The function name, e.g. `foo` in `foo()`.
    pub func: Function<'src>,
    /// The function's arguments.
    pub args: Vec<SpannedExpr<'src>>,
}
