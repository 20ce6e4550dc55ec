//! Subject Data Model
//!
//! A subject's stored grants, grouped into segments by the context set they
//! apply under. All mutation methods are pure and return a new value.

use std::collections::BTreeMap;

use perm_common::{ContextSet, SubjectRef, Tristate};
use serde::{Deserialize, Serialize};

use super::error::LoadFailure;

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_undefined(value: &Tristate) -> bool {
    !value.is_defined()
}

/// Grants that apply while every context in `contexts` is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, skip_serializing_if = "ContextSet::is_empty")]
    contexts: ContextSet,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    permissions: BTreeMap<String, Tristate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    parents: Vec<SubjectRef>,
    #[serde(default, skip_serializing_if = "is_undefined")]
    default_value: Tristate,
}

impl Segment {
    /// An empty segment for `contexts`.
    #[must_use]
    pub const fn new(contexts: ContextSet) -> Self {
        Self {
            contexts,
            permissions: BTreeMap::new(),
            options: BTreeMap::new(),
            parents: Vec::new(),
            default_value: Tristate::Undefined,
        }
    }

    #[must_use]
    pub const fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    #[must_use]
    pub const fn permissions(&self) -> &BTreeMap<String, Tristate> {
        &self.permissions
    }

    #[must_use]
    pub const fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Parents in priority order.
    #[must_use]
    pub fn parents(&self) -> &[SubjectRef] {
        &self.parents
    }

    #[must_use]
    pub const fn default_value(&self) -> Tristate {
        self.default_value
    }

    /// Whether the segment carries nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
            && self.options.is_empty()
            && self.parents.is_empty()
            && !self.default_value.is_defined()
    }
}

/// All stored data for one subject.
///
/// Segments are kept sorted by context set with at most one segment per set.
/// Empty segments are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectData {
    #[serde(default)]
    segments: Vec<Segment>,
}

impl SubjectData {
    /// Data with no segments.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Segments in context-set order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment stored for exactly `contexts`.
    #[must_use]
    pub fn segment(&self, contexts: &ContextSet) -> Option<&Segment> {
        self.segments
            .binary_search_by(|s| s.contexts.cmp(contexts))
            .ok()
            .map(|idx| &self.segments[idx])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Permission assigned directly under `contexts`, ignoring inheritance.
    #[must_use]
    pub fn permission(&self, contexts: &ContextSet, permission: &str) -> Tristate {
        self.segment(contexts)
            .and_then(|s| s.permissions.get(permission).copied())
            .unwrap_or_default()
    }

    /// Permissions assigned directly under `contexts`.
    #[must_use]
    pub fn permissions(&self, contexts: &ContextSet) -> BTreeMap<String, Tristate> {
        self.segment(contexts)
            .map(|s| s.permissions.clone())
            .unwrap_or_default()
    }

    /// Option assigned directly under `contexts`.
    #[must_use]
    pub fn option(&self, contexts: &ContextSet, key: &str) -> Option<&str> {
        self.segment(contexts)
            .and_then(|s| s.options.get(key))
            .map(String::as_str)
    }

    /// Options assigned directly under `contexts`.
    #[must_use]
    pub fn options(&self, contexts: &ContextSet) -> BTreeMap<String, String> {
        self.segment(contexts)
            .map(|s| s.options.clone())
            .unwrap_or_default()
    }

    /// Parents declared directly under `contexts`.
    #[must_use]
    pub fn parents(&self, contexts: &ContextSet) -> &[SubjectRef] {
        self.segment(contexts)
            .map_or(&[][..], |s| s.parents.as_slice())
    }

    /// Segment default declared directly under `contexts`.
    #[must_use]
    pub fn default_value(&self, contexts: &ContextSet) -> Tristate {
        self.segment(contexts)
            .map_or(Tristate::Undefined, |s| s.default_value)
    }

    /// Set one permission. `Undefined` removes the assignment.
    #[must_use]
    pub fn with_permission(
        &self,
        contexts: &ContextSet,
        permission: impl Into<String>,
        value: Tristate,
    ) -> Self {
        let permission = permission.into();
        self.with_segment(contexts, |s| {
            if value.is_defined() {
                s.permissions.insert(permission, value);
            } else {
                s.permissions.remove(&permission);
            }
        })
    }

    /// Replace every permission under `contexts`. `Undefined` entries are skipped.
    #[must_use]
    pub fn with_permissions<I, K>(&self, contexts: &ContextSet, permissions: I) -> Self
    where
        I: IntoIterator<Item = (K, Tristate)>,
        K: Into<String>,
    {
        let permissions: BTreeMap<String, Tristate> = permissions
            .into_iter()
            .filter(|(_, v)| v.is_defined())
            .map(|(k, v)| (k.into(), v))
            .collect();
        self.with_segment(contexts, |s| s.permissions = permissions)
    }

    #[must_use]
    pub fn without_permissions(&self, contexts: &ContextSet) -> Self {
        self.with_segment(contexts, |s| s.permissions.clear())
    }

    /// Set or (with `None`) remove one option.
    #[must_use]
    pub fn with_option(
        &self,
        contexts: &ContextSet,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let key = key.into();
        self.with_segment(contexts, |s| match value {
            Some(value) => {
                s.options.insert(key, value);
            }
            None => {
                s.options.remove(&key);
            }
        })
    }

    /// Replace every option under `contexts`.
    #[must_use]
    pub fn with_options<I, K, V>(&self, contexts: &ContextSet, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.with_segment(contexts, |s| s.options = options)
    }

    #[must_use]
    pub fn without_options(&self, contexts: &ContextSet) -> Self {
        self.with_segment(contexts, |s| s.options.clear())
    }

    /// Replace the parent list under `contexts`, dropping repeats.
    #[must_use]
    pub fn with_parents(&self, contexts: &ContextSet, parents: Vec<SubjectRef>) -> Self {
        let mut deduped: Vec<SubjectRef> = Vec::with_capacity(parents.len());
        for parent in parents {
            if !deduped.contains(&parent) {
                deduped.push(parent);
            }
        }
        self.with_segment(contexts, |s| s.parents = deduped)
    }

    /// Add `parent` with the highest priority. An existing entry moves to the front.
    #[must_use]
    pub fn add_parent(&self, contexts: &ContextSet, parent: SubjectRef) -> Self {
        self.with_segment(contexts, |s| {
            s.parents.retain(|p| *p != parent);
            s.parents.insert(0, parent);
        })
    }

    #[must_use]
    pub fn remove_parent(&self, contexts: &ContextSet, parent: &SubjectRef) -> Self {
        self.with_segment(contexts, |s| s.parents.retain(|p| p != parent))
    }

    #[must_use]
    pub fn without_parents(&self, contexts: &ContextSet) -> Self {
        self.with_segment(contexts, |s| s.parents.clear())
    }

    #[must_use]
    pub fn with_default_value(&self, contexts: &ContextSet, value: Tristate) -> Self {
        self.with_segment(contexts, |s| s.default_value = value)
    }

    /// Drop the whole segment for `contexts`.
    #[must_use]
    pub fn clear(&self, contexts: &ContextSet) -> Self {
        self.with_segment(contexts, |s| *s = Segment::new(s.contexts.clone()))
    }

    /// Sort segments and reject duplicate context sets.
    ///
    /// The subject cache runs this on every snapshot a store hands back;
    /// `key` names the subject in the error.
    pub fn validate(mut self, key: &str) -> Result<Self, LoadFailure> {
        self.segments.sort_by(|a, b| a.contexts.cmp(&b.contexts));
        if let Some(pair) = self
            .segments
            .windows(2)
            .find(|pair| pair[0].contexts == pair[1].contexts)
        {
            return Err(LoadFailure::Malformed {
                key: key.to_string(),
                reason: format!("duplicate segment for contexts {}", pair[0].contexts),
            });
        }
        self.segments.retain(|s| !s.is_empty());
        Ok(self)
    }

    fn with_segment<F>(&self, contexts: &ContextSet, f: F) -> Self
    where
        F: FnOnce(&mut Segment),
    {
        let mut segments = self.segments.clone();
        let idx = match segments.binary_search_by(|s| s.contexts.cmp(contexts)) {
            Ok(idx) => idx,
            Err(idx) => {
                segments.insert(idx, Segment::new(contexts.clone()));
                idx
            }
        };
        f(&mut segments[idx]);
        if segments[idx].is_empty() {
            segments.remove(idx);
        }
        Self { segments }
    }
}
