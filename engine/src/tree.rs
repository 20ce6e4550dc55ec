//! Tristate permission tree.
//!
//! Resolves dotted permission paths using longest-defined-prefix semantics:
//! the value of `a.b.c.d` is the value of the deepest node along that path
//! that was explicitly assigned, falling back to the root value.
//!
//! Trees are never mutated after construction. Changes produce a new tree,
//! so a tree can be shared across threads behind an `Arc` without locking.

use std::collections::HashMap;

use perm_common::Tristate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Node {
    value: Tristate,
    children: HashMap<String, Node>,
}

impl Node {
    fn set(&mut self, path: &str, value: Tristate) {
        if path.is_empty() {
            self.value = value;
            return;
        }
        let mut node = self;
        for segment in path.split('.') {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.value = value;
    }
}

/// Immutable permission tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTree {
    root: Node,
}

impl NodeTree {
    /// Build a tree from `path -> value` entries.
    ///
    /// The empty path addresses the root and overrides `default`. Identical
    /// paths are last-write-wins; distinct paths never affect each other.
    pub fn from_map<I, K>(entries: I, default: Tristate) -> Self
    where
        I: IntoIterator<Item = (K, Tristate)>,
        K: AsRef<str>,
    {
        let mut root = Node {
            value: default,
            children: HashMap::new(),
        };
        for (path, value) in entries {
            root.set(path.as_ref(), value);
        }
        Self { root }
    }

    /// An empty tree answering `default` for every path.
    #[must_use]
    pub fn empty(default: Tristate) -> Self {
        Self::from_map(std::iter::empty::<(&str, Tristate)>(), default)
    }

    /// Value at the root of the tree.
    #[must_use]
    pub const fn default_value(&self) -> Tristate {
        self.root.value
    }

    /// Resolve `path` to its effective value.
    #[must_use]
    pub fn get(&self, path: &str) -> Tristate {
        let mut last = self.root.value;
        if path.is_empty() {
            return last;
        }
        let mut node = &self.root;
        for segment in path.split('.') {
            match node.children.get(segment) {
                Some(child) => {
                    node = child;
                    if child.value.is_defined() {
                        last = child.value;
                    }
                }
                None => break,
            }
        }
        last
    }

    /// A copy of this tree with `path` set to `value`.
    #[must_use]
    pub fn with_value(&self, path: &str, value: Tristate) -> Self {
        let mut root = self.root.clone();
        root.set(path, value);
        Self { root }
    }

    /// A copy of this tree with every entry applied in order.
    pub fn with_all<I, K>(&self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Tristate)>,
        K: AsRef<str>,
    {
        let mut root = self.root.clone();
        for (path, value) in entries {
            root.set(path.as_ref(), value);
        }
        Self { root }
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::empty(Tristate::Undefined)
    }
}
