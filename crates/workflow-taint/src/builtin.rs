//! The builtin tables of untrusted context paths, and the classification of
//! triggers that decides which table applies.
//!
//! See: <https://securitylab.github.com/resources/github-actions-untrusted-input/>

use std::sync::LazyLock;

use crate::roots::SearchRoots;

/// Paths whose values are controlled by whoever triggered the workflow,
/// under any trigger.
const UNTRUSTED_PATHS: &[&str] = &[
    "github.head_ref",
    "github.event.issue.title",
    "github.event.issue.body",
    "github.event.pull_request.title",
    "github.event.pull_request.body",
    "github.event.pull_request.head.ref",
    "github.event.pull_request.head.label",
    "github.event.pull_request.head.repo.default_branch",
    "github.event.discussion.title",
    "github.event.discussion.body",
    "github.event.comment.body",
    "github.event.review.body",
    "github.event.review_comment.body",
    "github.event.pages.*.page_name",
    "github.event.commits.*.message",
    "github.event.commits.*.author.email",
    "github.event.commits.*.author.name",
    "github.event.head_commit.message",
    "github.event.head_commit.author.email",
    "github.event.head_commit.author.name",
    "github.event.workflow_run.head_branch",
    "github.event.workflow_run.head_commit.message",
    "github.event.workflow_run.head_commit.author.email",
    "github.event.workflow_run.head_commit.author.name",
    "github.event.workflow_run.pull_requests.*.head.ref",
];

/// Paths that are only worth flagging when the workflow runs with the
/// base repository's privileges, e.g. because they're used to check out
/// or address attacker-controlled refs.
const PRIVILEGED_ONLY_PATHS: &[&str] = &[
    "github.event.pull_request.head.sha",
    "github.event.pull_request.head.repo.full_name",
    "github.event.pull_request.user.login",
    "github.event.issue.user.login",
    "github.event.comment.user.login",
    "github.event.workflow_run.head_sha",
    "github.event.workflow_run.head_repository.full_name",
];

fn build(tables: &[&[&str]]) -> SearchRoots {
    let mut roots = SearchRoots::new();
    for path in tables.iter().flat_map(|t| t.iter()) {
        roots.insert_segments(&path.split('.').collect::<Vec<_>>());
    }
    roots
}

static UNTRUSTED_INPUTS: LazyLock<SearchRoots> = LazyLock::new(|| build(&[UNTRUSTED_PATHS]));

static PRIVILEGED_UNTRUSTED_INPUTS: LazyLock<SearchRoots> =
    LazyLock::new(|| build(&[UNTRUSTED_PATHS, PRIVILEGED_ONLY_PATHS]));

/// Untrusted inputs for workflows running under normal triggers.
pub fn untrusted_inputs() -> &'static SearchRoots {
    &UNTRUSTED_INPUTS
}

/// Untrusted inputs for workflows running under privileged triggers.
/// A superset of [`untrusted_inputs`].
pub fn privileged_untrusted_inputs() -> &'static SearchRoots {
    &PRIVILEGED_UNTRUSTED_INPUTS
}

/// How much a workflow trigger exposes to whoever triggers it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum TriggerPrivilege {
    /// The workflow runs without access to the base repository's secrets
    /// or a write token.
    Normal,
    /// The workflow runs in the context of the base repository, with its
    /// secrets and a write token, but can be triggered by third parties.
    Privileged,
}

impl TriggerPrivilege {
    /// Classifies a trigger by its event name, e.g. `pull_request_target`.
    pub fn from_event(event: &str) -> Self {
        match event {
            "pull_request_target"
            | "workflow_run"
            | "issue_comment"
            | "issues"
            | "discussion"
            | "discussion_comment"
            | "pull_request_review"
            | "pull_request_review_comment" => Self::Privileged,
            _ => Self::Normal,
        }
    }

    /// Classifies a workflow by all of its triggers: a workflow with any
    /// privileged trigger is privileged.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a str>) -> Self {
        events
            .into_iter()
            .map(Self::from_event)
            .max()
            .unwrap_or(Self::Normal)
    }

    /// The untrusted inputs that apply under this privilege level.
    pub fn search_roots(self) -> &'static SearchRoots {
        match self {
            Self::Normal => untrusted_inputs(),
            Self::Privileged => privileged_untrusted_inputs(),
        }
    }
}
