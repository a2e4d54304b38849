//! Search roots: the set of untrusted property tries an expression is
//! checked against, keyed by context root.

use std::collections::BTreeMap;

use serde::{Deserialize, de};
use thiserror::Error;

use crate::property::{PropertyMap, WILDCARD};

/// Errors produced while building [`SearchRoots`] from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RootsError {
    /// A dotted path pattern is malformed.
    #[error("invalid path pattern \"{0}\"")]
    InvalidPattern(String),
    /// A single property name is malformed.
    #[error("invalid property name \"{name}\": expected `*` or one or more of [A-Za-z0-9_-]")]
    InvalidSegment {
        /// The offending name.
        name: String,
    },
}

fn valid_segment(segment: &str) -> bool {
    segment == WILDCARD
        || (!segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

fn split_path(path: &str) -> Result<Vec<&str>, RootsError> {
    let segments = path.split('.').collect::<Vec<_>>();

    match segments.first() {
        Some(&root) if root != WILDCARD && !root.is_empty() => {}
        _ => return Err(RootsError::InvalidPattern(path.into())),
    }

    if let Some(bad) = segments.iter().find(|s| !valid_segment(s)) {
        return Err(if bad.is_empty() {
            RootsError::InvalidPattern(path.into())
        } else {
            RootsError::InvalidSegment {
                name: (*bad).into(),
            }
        });
    }

    Ok(segments)
}

/// Untrusted property tries, keyed by case-insensitive root name
/// (`github`, `inputs`, `steps`, ...).
///
/// Roots are plain data: callers pick one of the builtin tables in
/// [`crate::builtin`], or build their own and merge them together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRoots {
    roots: BTreeMap<String, PropertyMap>,
}

impl SearchRoots {
    /// Creates an empty set of roots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds roots from dotted path patterns like `github.event.issue.title`
    /// or `github.event.commits.*.message`.
    pub fn from_paths<I, S>(paths: I) -> Result<Self, RootsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roots = Self::new();
        for path in paths {
            let segments = split_path(path.as_ref())?;
            roots.insert_segments(&segments);
        }
        Ok(roots)
    }

    /// Marks each of `names` as a tainted `inputs.<name>`.
    ///
    /// This is used within a reusable workflow whose caller passes
    /// untrusted values to the given inputs.
    pub fn reusable_workflow_inputs<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let inputs = PropertyMap::new(
            "inputs",
            names.into_iter().map(|n| PropertyMap::leaf(n.as_ref())),
        );

        Self::new().with(inputs)
    }

    /// Marks every input as tainted, i.e. `inputs.*`.
    ///
    /// This is used when a reusable workflow's inputs can't be enumerated.
    pub fn wildcard_inputs() -> Self {
        Self::new().with(PropertyMap::new("inputs", [PropertyMap::leaf(WILDCARD)]))
    }

    /// Picks between [`SearchRoots::reusable_workflow_inputs`] and
    /// [`SearchRoots::wildcard_inputs`], depending on whether the tainted
    /// input names are known.
    pub fn for_reusable_workflow<I, S>(names: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        match names {
            Some(names) => Self::reusable_workflow_inputs(names),
            None => Self::wildcard_inputs(),
        }
    }

    /// Marks each `(step_id, output)` pair as a tainted
    /// `steps.<step_id>.outputs.<output>`.
    pub fn tainted_step_outputs<I, S, T>(outputs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut roots = Self::new();
        for (step, output) in outputs {
            roots.insert_segments(&["steps", step.as_ref(), "outputs", output.as_ref()]);
        }
        roots
    }

    /// Inserts `map` as a root, merging it with any existing root of the
    /// same name.
    pub fn insert(&mut self, map: PropertyMap) {
        let key = map.name().to_ascii_lowercase();
        match self.roots.get_mut(&key) {
            Some(existing) => existing.merge(map),
            None => {
                self.roots.insert(key, map);
            }
        }
    }

    /// Like [`SearchRoots::insert`], but by value.
    pub fn with(mut self, map: PropertyMap) -> Self {
        self.insert(map);
        self
    }

    /// Merges every root of `other` into these roots.
    pub fn merge(&mut self, other: SearchRoots) {
        for map in other.roots.into_values() {
            self.insert(map);
        }
    }

    /// Looks up a root by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&PropertyMap> {
        self.roots.get(&name.to_ascii_lowercase())
    }

    /// Iterates over the roots, ordered by lowercased name.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyMap> {
        self.roots.values()
    }

    /// The number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns whether there are no roots at all.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Inserts an already-validated path.
    pub(crate) fn insert_segments(&mut self, segments: &[&str]) {
        let Some((root, rest)) = segments.split_first() else {
            return;
        };

        self.roots
            .entry(root.to_ascii_lowercase())
            .or_insert_with(|| PropertyMap::leaf(*root))
            .insert_path(rest);
    }
}

impl FromIterator<PropertyMap> for SearchRoots {
    fn from_iter<T: IntoIterator<Item = PropertyMap>>(iter: T) -> Self {
        let mut roots = Self::new();
        for map in iter {
            roots.insert(map);
        }
        roots
    }
}

/// The nested mapping form of roots: `{github: {event: {issue: {title: ~}}}}`.
#[derive(Deserialize)]
#[serde(transparent)]
struct RawTree(Option<BTreeMap<String, RawTree>>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoots {
    Paths(Vec<String>),
    Tree(BTreeMap<String, RawTree>),
}

fn tree_to_map(name: String, tree: RawTree) -> Result<PropertyMap, RootsError> {
    if !valid_segment(&name) {
        return Err(RootsError::InvalidSegment { name });
    }

    let children = tree
        .0
        .unwrap_or_default()
        .into_iter()
        .map(|(name, tree)| tree_to_map(name, tree))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PropertyMap::new(name, children))
}

impl RawRoots {
    fn into_roots(self) -> Result<SearchRoots, RootsError> {
        match self {
            RawRoots::Paths(paths) => SearchRoots::from_paths(paths),
            RawRoots::Tree(tree) => tree
                .into_iter()
                .map(|(name, tree)| {
                    if name == WILDCARD {
                        Err(RootsError::InvalidPattern(name))
                    } else {
                        tree_to_map(name, tree)
                    }
                })
                .collect(),
        }
    }
}

impl<'de> Deserialize<'de> for SearchRoots {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawRoots::deserialize(deserializer)?;
        raw.into_roots().map_err(de::Error::custom)
    }
}
