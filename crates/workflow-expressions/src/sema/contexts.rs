//! The context roots available to expressions, and the properties of
//! those whose shape is fixed.
//!
//! See: <https://docs.github.com/en/actions/reference/workflows-and-actions/contexts>

/// A context root such as `github` or `matrix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSchema {
    /// The root's name.
    pub name: &'static str,
    /// The root's top-level properties, or `None` if the root is an
    /// open mapping (e.g. `env` or `steps`) whose keys are user-defined.
    pub properties: Option<&'static [&'static str]>,
}

impl ContextSchema {
    /// Returns whether `property` is a valid top-level property of this
    /// root. Always true for open roots.
    pub fn has_property(&self, property: &str) -> bool {
        match self.properties {
            Some(props) => props.iter().any(|p| p.eq_ignore_ascii_case(property)),
            None => true,
        }
    }
}

const GITHUB_PROPERTIES: &[&str] = &[
    "action",
    "action_path",
    "action_ref",
    "action_repository",
    "action_status",
    "actor",
    "actor_id",
    "api_url",
    "base_ref",
    "env",
    "event",
    "event_name",
    "event_path",
    "graphql_url",
    "head_ref",
    "job",
    "path",
    "ref",
    "ref_name",
    "ref_protected",
    "ref_type",
    "repository",
    "repository_id",
    "repository_owner",
    "repository_owner_id",
    "repositoryurl",
    "retention_days",
    "run_attempt",
    "run_id",
    "run_number",
    "secret_source",
    "server_url",
    "sha",
    "token",
    "triggering_actor",
    "workflow",
    "workflow_ref",
    "workflow_sha",
    "workspace",
];

const JOB_PROPERTIES: &[&str] = &[
    "check_run_id",
    "container",
    "services",
    "status",
    "workflow_ref",
    "workflow_repository",
    "workflow_sha",
    "workflow_file_path",
];

const RUNNER_PROPERTIES: &[&str] = &[
    "arch",
    "debug",
    "environment",
    "name",
    "os",
    "temp",
    "tool_cache",
];

const STRATEGY_PROPERTIES: &[&str] = &["fail-fast", "job-index", "job-total", "max-parallel"];

/// Every builtin context root, sorted by name.
pub static BUILTIN_CONTEXTS: &[ContextSchema] = &[
    ContextSchema {
        name: "env",
        properties: None,
    },
    ContextSchema {
        name: "github",
        properties: Some(GITHUB_PROPERTIES),
    },
    ContextSchema {
        name: "inputs",
        properties: None,
    },
    ContextSchema {
        name: "job",
        properties: Some(JOB_PROPERTIES),
    },
    ContextSchema {
        name: "jobs",
        properties: None,
    },
    ContextSchema {
        name: "matrix",
        properties: None,
    },
    ContextSchema {
        name: "needs",
        properties: None,
    },
    ContextSchema {
        name: "runner",
        properties: Some(RUNNER_PROPERTIES),
    },
    ContextSchema {
        name: "secrets",
        properties: None,
    },
    ContextSchema {
        name: "steps",
        properties: None,
    },
    ContextSchema {
        name: "strategy",
        properties: Some(STRATEGY_PROPERTIES),
    },
    ContextSchema {
        name: "vars",
        properties: None,
    },
];

/// Looks up a builtin context root by name, case-insensitively.
pub fn lookup(name: &str) -> Option<&'static ContextSchema> {
    BUILTIN_CONTEXTS
        .iter()
        .find(|ctx| ctx.name.eq_ignore_ascii_case(name))
}
