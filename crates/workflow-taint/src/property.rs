//! Tries of untrusted property paths.

use std::collections::BTreeMap;

/// The child key that matches any property name or array element.
pub const WILDCARD: &str = "*";

/// A node in a trie of untrusted property paths.
///
/// A node with no children is a leaf: a concrete property whose value is
/// untrusted. A node with children is an object (or, via a [`WILDCARD`]
/// child, an array) some of whose contents are untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMap {
    name: String,
    /// Keyed by lowercased name, since property access is case-insensitive.
    children: BTreeMap<String, PropertyMap>,
}

impl PropertyMap {
    /// Creates a leaf node.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// Creates a node with the given children.
    ///
    /// Children with the same (case-insensitive) name are merged.
    pub fn new(name: impl Into<String>, children: impl IntoIterator<Item = PropertyMap>) -> Self {
        let mut node = Self::leaf(name);
        for child in children {
            node.insert_child(child);
        }
        node
    }

    /// This node's name, as given when it was constructed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether this node is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.name == WILDCARD
    }

    /// Returns whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This node's children, ordered by lowercased name.
    pub fn children(&self) -> impl Iterator<Item = &PropertyMap> {
        self.children.values()
    }

    /// Finds the child for the property `name`, falling back to the
    /// wildcard child if there's no child by that name.
    pub fn find_object_prop(&self, name: &str) -> Option<&PropertyMap> {
        self.children
            .get(&name.to_ascii_lowercase())
            .or_else(|| self.find_array_elem())
    }

    /// Finds the wildcard child, which stands for every element of an array.
    pub fn find_array_elem(&self) -> Option<&PropertyMap> {
        self.children.get(WILDCARD)
    }

    fn insert_child(&mut self, child: PropertyMap) {
        let key = child.name.to_ascii_lowercase();
        match self.children.get_mut(&key) {
            Some(existing) => existing.merge(child),
            None => {
                self.children.insert(key, child);
            }
        }
    }

    /// Merges `other`'s children into this node, recursively.
    ///
    /// A leaf merged with an object becomes that object.
    pub(crate) fn merge(&mut self, other: PropertyMap) {
        for child in other.children.into_values() {
            self.insert_child(child);
        }
    }

    /// Inserts the path `segments` below this node, creating nodes as needed.
    pub(crate) fn insert_path(&mut self, segments: &[&str]) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };

        self.children
            .entry(first.to_ascii_lowercase())
            .or_insert_with(|| PropertyMap::leaf(*first))
            .insert_path(rest);
    }
}
