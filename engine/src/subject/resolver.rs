//! Inheritance resolution.
//!
//! Resolution happens in two phases. [`InheritanceGraph::load`] fetches the
//! queried subject, its fallbacks, and every ancestor reachable under the
//! active contexts, one inheritance level at a time. Queries over the loaded
//! graph are then synchronous.
//!
//! Lookup order for a subject: its own grants, then each parent in order
//! (first defined answer wins), then its own segment default. For the queried
//! subject only, the fallback subjects are consulted last. A visited set breaks inheritance cycles and
//! recursion stops past the configured maximum depth.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use perm_common::{ContextSet, SubjectRef, Tristate};
use tracing::debug;

use super::calculated::CalculatedSubject;
use crate::cache::CacheError;

/// Anything that can hand out calculated subjects by reference.
pub trait SubjectSource: Send + Sync {
    fn load<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<Arc<CalculatedSubject>, CacheError>>;
}

/// The loaded inheritance graph of one subject under one context set.
#[derive(Debug)]
pub struct InheritanceGraph {
    root: SubjectRef,
    fallbacks: Vec<SubjectRef>,
    contexts: ContextSet,
    max_depth: usize,
    subjects: HashMap<SubjectRef, Arc<CalculatedSubject>>,
}

impl InheritanceGraph {
    /// Load `root`, `fallbacks` and their ancestors up to `max_depth` levels.
    pub async fn load(
        source: &dyn SubjectSource,
        root: SubjectRef,
        fallbacks: Vec<SubjectRef>,
        contexts: ContextSet,
        max_depth: usize,
    ) -> Result<Self, CacheError> {
        let mut subjects: HashMap<SubjectRef, Arc<CalculatedSubject>> = HashMap::new();
        let mut frontier: Vec<SubjectRef> = vec![root.clone()];
        for fallback in &fallbacks {
            if !frontier.contains(fallback) {
                frontier.push(fallback.clone());
            }
        }

        let mut depth = 0;
        while !frontier.is_empty() && depth <= max_depth {
            let loaded = try_join_all(frontier.iter().map(|s| source.load(s))).await?;

            let mut next: Vec<SubjectRef> = Vec::new();
            for calc in loaded {
                for parent in calc.baked(&contexts).parents() {
                    if !subjects.contains_key(parent)
                        && !frontier.contains(parent)
                        && !next.contains(parent)
                    {
                        next.push(parent.clone());
                    }
                }
                subjects.insert(calc.subject().clone(), calc);
            }

            frontier = next;
            depth += 1;
        }

        if !frontier.is_empty() {
            debug!(
                %root,
                max_depth,
                unloaded = frontier.len(),
                "Inheritance depth limit reached"
            );
        }

        Ok(Self {
            root,
            fallbacks,
            contexts,
            max_depth,
            subjects,
        })
    }

    pub const fn root(&self) -> &SubjectRef {
        &self.root
    }

    pub const fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    /// Number of subjects loaded into the graph.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Effective permission value for the root subject.
    pub fn permission(&self, permission: &str) -> Tristate {
        let defined = |value: Tristate| value.is_defined().then_some(value);
        self.resolve(
            |calc| defined(calc.baked(&self.contexts).permission(permission)),
            |calc| defined(calc.baked(&self.contexts).default_value()),
        )
        .unwrap_or_default()
    }

    /// Effective option value for the root subject.
    pub fn option(&self, key: &str) -> Option<String> {
        self.resolve(
            |calc| calc.baked(&self.contexts).option(key).map(str::to_string),
            |_| None,
        )
    }

    /// Direct parents of the root subject, most specific first.
    pub fn parents(&self) -> Vec<SubjectRef> {
        self.subjects
            .get(&self.root)
            .map(|calc| calc.baked(&self.contexts).parents().to_vec())
            .unwrap_or_default()
    }

    fn resolve<T, F, D>(&self, lookup: F, fallback: D) -> Option<T>
    where
        F: Fn(&CalculatedSubject) -> Option<T>,
        D: Fn(&CalculatedSubject) -> Option<T>,
    {
        let mut visited = HashSet::new();
        std::iter::once(&self.root)
            .chain(&self.fallbacks)
            .find_map(|start| self.walk(start, 0, &lookup, &fallback, &mut visited))
    }

    /// `lookup` is tried on the subject, then on its ancestors; `fallback`
    /// only once every ancestor came up empty.
    fn walk<T, F, D>(
        &self,
        subject: &SubjectRef,
        depth: usize,
        lookup: &F,
        fallback: &D,
        visited: &mut HashSet<SubjectRef>,
    ) -> Option<T>
    where
        F: Fn(&CalculatedSubject) -> Option<T>,
        D: Fn(&CalculatedSubject) -> Option<T>,
    {
        if depth > self.max_depth || !visited.insert(subject.clone()) {
            return None;
        }
        let calc = self.subjects.get(subject)?;
        if let Some(found) = lookup(calc) {
            return Some(found);
        }
        calc.baked(&self.contexts)
            .parents()
            .iter()
            .find_map(|parent| self.walk(parent, depth + 1, lookup, fallback, visited))
            .or_else(|| fallback(calc))
    }
}
