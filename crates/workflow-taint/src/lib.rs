//! Untrusted input tracking for CI workflow expressions.
//!
//! Given a parsed expression and a set of [`SearchRoots`] describing which
//! context paths are attacker-controlled, the [`UntrustedInputChecker`]
//! reports every untrusted path the expression's value can come from.
//!
//! ```rust
//! use workflow_expressions::Expr;
//! use workflow_taint::{SearchRoots, check_untrusted};
//! use workflow_taint::builtin::TriggerPrivilege;
//!
//! let mut roots = TriggerPrivilege::from_event("issues").search_roots().clone();
//! roots.merge(SearchRoots::tainted_step_outputs([("meta", "title")]));
//!
//! let expr = Expr::parse("format('{0}: {1}', github.event.issue.title, steps.meta.outputs.title)").unwrap();
//! assert_eq!(check_untrusted(&roots, &expr).len(), 2);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub use crate::checker::{UntrustedInputChecker, check_untrusted};
pub use crate::property::PropertyMap;
pub use crate::roots::{RootsError, SearchRoots};

pub mod builtin;
pub mod checker;
pub mod property;
pub mod roots;
