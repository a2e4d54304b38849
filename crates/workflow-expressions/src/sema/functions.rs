//! Signatures of the builtin functions available in expressions.
//!
//! See: <https://docs.github.com/en/actions/reference/workflows-and-actions/expressions#functions>

use std::fmt;

/// A single function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// The parameter's name, for diagnostics only.
    pub name: &'static str,
    /// Whether the parameter may be omitted.
    pub optional: bool,
}

const fn required(name: &'static str) -> Param {
    Param {
        name,
        optional: false,
    }
}

const fn optional(name: &'static str) -> Param {
    Param {
        name,
        optional: true,
    }
}

/// The signature of a builtin function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// The function's canonical name. Lookups are case-insensitive.
    pub name: &'static str,
    /// The fixed parameters.
    pub params: &'static [Param],
    /// Whether any number of arguments may follow the fixed parameters.
    pub variadic: bool,
}

impl Signature {
    /// The minimum number of arguments a call must have.
    pub fn min_args(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// The maximum number of arguments a call may have, or `None` for
    /// variadic functions.
    pub fn max_args(&self) -> Option<usize> {
        (!self.variadic).then_some(self.params.len())
    }

    /// Checks a call with `nargs` arguments against this signature,
    /// returning a description of the mismatch if there is one.
    pub fn check_arity(&self, nargs: usize) -> Option<String> {
        let min = self.min_args();

        let expected = match self.max_args() {
            _ if nargs < min && self.variadic => format!("at least {min}"),
            Some(max) if nargs < min || nargs > max => {
                if min == max {
                    format!("{min}")
                } else {
                    format!("{min} to {max}")
                }
            }
            _ => return None,
        };

        Some(format!(
            "number of arguments is wrong. function \"{}\" takes {expected} parameters but {nargs} arguments are given",
            self
        ))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(param.name)?;
            if param.optional {
                f.write_str("?")?;
            }
        }
        if self.variadic {
            f.write_str(", ...")?;
        }
        f.write_str(")")
    }
}

/// Every builtin function, sorted by name.
pub static BUILTIN_FUNCTIONS: &[Signature] = &[
    Signature {
        name: "always",
        params: &[],
        variadic: false,
    },
    Signature {
        name: "cancelled",
        params: &[],
        variadic: false,
    },
    // case(pred1, val1, [pred2, val2, ...], default)
    Signature {
        name: "case",
        params: &[required("pred"), required("val"), required("default")],
        variadic: true,
    },
    Signature {
        name: "contains",
        params: &[required("search"), required("item")],
        variadic: false,
    },
    Signature {
        name: "endsWith",
        params: &[required("searchString"), required("searchValue")],
        variadic: false,
    },
    Signature {
        name: "failure",
        params: &[],
        variadic: false,
    },
    Signature {
        name: "format",
        params: &[required("string")],
        variadic: true,
    },
    Signature {
        name: "fromJSON",
        params: &[required("value")],
        variadic: false,
    },
    Signature {
        name: "hashFiles",
        params: &[required("path")],
        variadic: true,
    },
    Signature {
        name: "join",
        params: &[required("array"), optional("separator")],
        variadic: false,
    },
    Signature {
        name: "startsWith",
        params: &[required("searchString"), required("searchValue")],
        variadic: false,
    },
    Signature {
        name: "success",
        params: &[],
        variadic: false,
    },
    Signature {
        name: "toJSON",
        params: &[required("value")],
        variadic: false,
    },
];

/// Looks up a builtin function by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static Signature> {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|sig| sig.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::{BUILTIN_FUNCTIONS, lookup};

    #[test]
    fn test_lookup_case_insensitive() {
        assert_eq!(lookup("toJSON").map(|s| s.name), Some("toJSON"));
        assert_eq!(lookup("tojson").map(|s| s.name), Some("toJSON"));
        assert_eq!(lookup("STARTSWITH").map(|s| s.name), Some("startsWith"));
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn test_builtins_sorted() {
        let names = BUILTIN_FUNCTIONS
            .iter()
            .map(|s| s.name.to_ascii_lowercase())
            .collect::<Vec<_>>();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_arity() {
        for (func, nargs, ok) in [
            ("case", 1, false),
            ("case", 2, false),
            ("case", 3, true),
            ("case", 5, true),
            ("case", 100, true),
            ("format", 0, false),
            ("format", 1, true),
            ("format", 4, true),
            ("join", 0, false),
            ("join", 1, true),
            ("join", 2, true),
            ("join", 3, false),
            ("toJSON", 0, false),
            ("toJSON", 1, true),
            ("toJSON", 2, false),
            ("always", 0, true),
            ("always", 1, false),
        ] {
            let sig = lookup(func).unwrap();
            assert_eq!(sig.check_arity(nargs).is_none(), ok, "{func} with {nargs} args");
        }
    }

    #[test]
    fn test_arity_messages() {
        let case = lookup("case").unwrap();
        assert_eq!(
            case.check_arity(1).unwrap(),
            "number of arguments is wrong. function \"case(pred, val, default, ...)\" takes at least 3 parameters but 1 arguments are given"
        );

        let join = lookup("join").unwrap();
        assert_eq!(
            join.check_arity(3).unwrap(),
            "number of arguments is wrong. function \"join(array, separator?)\" takes 1 to 2 parameters but 3 arguments are given"
        );

        let contains = lookup("contains").unwrap();
        assert_eq!(
            contains.check_arity(1).unwrap(),
            "number of arguments is wrong. function \"contains(search, item)\" takes 2 parameters but 1 arguments are given"
        );
    }
}
