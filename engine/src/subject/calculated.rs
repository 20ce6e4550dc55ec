//! Calculated subjects.
//!
//! A `CalculatedSubject` wraps one snapshot of a subject's data and lazily
//! bakes a flattened view per active context set. A new snapshot means a
//! new `CalculatedSubject`; baked views are never invalidated in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use perm_common::{ContextSet, SubjectRef, Tristate};

use crate::data::{Segment, SubjectData};
use crate::tree::NodeTree;

/// A subject's own data flattened for one active context set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedSubject {
    permissions: NodeTree,
    default: Tristate,
    options: BTreeMap<String, String>,
    parents: Vec<SubjectRef>,
}

impl BakedSubject {
    /// Flatten the segments of `data` that apply under `active`.
    ///
    /// Segments apply from least to most specific, so a grant scoped to more
    /// contexts overrides the same key granted globally.
    pub fn bake(data: &SubjectData, active: &ContextSet) -> Self {
        let mut eligible: Vec<&Segment> = data
            .segments()
            .iter()
            .filter(|s| s.contexts().is_subset_of(active))
            .collect();
        // Segments arrive ordered by context set; the stable sort keeps that as the tie-break.
        eligible.sort_by_key(|s| s.contexts().len());

        let mut permissions = BTreeMap::new();
        let mut options = BTreeMap::new();
        let mut default = Tristate::Undefined;
        for segment in &eligible {
            for (key, value) in segment.permissions() {
                permissions.insert(key.as_str(), *value);
            }
            for (key, value) in segment.options() {
                options.insert(key.clone(), value.clone());
            }
            default = segment.default_value().or_else(default);
        }

        let mut parents: Vec<SubjectRef> = Vec::new();
        for segment in eligible.iter().rev() {
            for parent in segment.parents() {
                if !parents.contains(parent) {
                    parents.push(parent.clone());
                }
            }
        }

        Self {
            permissions: NodeTree::from_map(permissions, Tristate::Undefined),
            default,
            options,
            parents,
        }
    }

    /// Explicit grant for `permission`, ignoring the segment default.
    pub fn permission(&self, permission: &str) -> Tristate {
        self.permissions.get(permission)
    }

    /// Most specific defined segment default. Applies only once inheritance
    /// has produced nothing.
    pub const fn default_value(&self) -> Tristate {
        self.default
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub const fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Parents, most specific segment first.
    pub fn parents(&self) -> &[SubjectRef] {
        &self.parents
    }

    pub const fn tree(&self) -> &NodeTree {
        &self.permissions
    }
}

/// One loaded snapshot of a subject.
#[derive(Debug)]
pub struct CalculatedSubject {
    subject: SubjectRef,
    data: Arc<SubjectData>,
    baked: DashMap<ContextSet, Arc<BakedSubject>>,
}

impl CalculatedSubject {
    pub fn new(subject: SubjectRef, data: Arc<SubjectData>) -> Self {
        Self {
            subject,
            data,
            baked: DashMap::new(),
        }
    }

    /// A subject with no stored data.
    pub fn empty(subject: SubjectRef) -> Self {
        Self::new(subject, Arc::new(SubjectData::empty()))
    }

    pub const fn subject(&self) -> &SubjectRef {
        &self.subject
    }

    pub const fn data(&self) -> &Arc<SubjectData> {
        &self.data
    }

    /// Baked view for `contexts`, computed once per context set.
    pub fn baked(&self, contexts: &ContextSet) -> Arc<BakedSubject> {
        if let Some(baked) = self.baked.get(contexts) {
            return Arc::clone(&baked);
        }
        let baked = self
            .baked
            .entry(contexts.clone())
            .or_insert_with(|| Arc::new(BakedSubject::bake(&self.data, contexts)));
        Arc::clone(&baked)
    }

    /// Own permission value under `contexts`, ignoring inheritance.
    ///
    /// Falls back to the subject's own default when nothing is granted.
    pub fn permission(&self, contexts: &ContextSet, permission: &str) -> Tristate {
        let baked = self.baked(contexts);
        baked.permission(permission).or_else(baked.default_value())
    }

    /// Own option value under `contexts`, ignoring inheritance.
    pub fn option(&self, contexts: &ContextSet, key: &str) -> Option<String> {
        self.baked(contexts).option(key).map(str::to_string)
    }

    /// Direct parents under `contexts`.
    pub fn parents(&self, contexts: &ContextSet) -> Vec<SubjectRef> {
        self.baked(contexts).parents().to_vec()
    }

    /// Number of memoized context views.
    pub fn baked_count(&self) -> usize {
        self.baked.len()
    }
}
