//! Permission Service
//!
//! Entry point tying the caches, the resolver and the check notifier
//! together. One subject cache is created per subject type on first use.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use perm_common::{ContextSet, SubjectRef, Tristate};
use tracing::info;

use crate::cache::{CacheError, RankLadderCache, SubjectCache};
use crate::config::EngineConfig;
use crate::data::DataStore;
use crate::subject::{
    CalculatedSubject, CheckNotifier, InheritanceGraph, NoopNotifier, SubjectSource,
    TracingNotifier,
};

/// Identifier of the default subject shared by every type.
const GLOBAL_DEFAULTS: &str = "default";

/// Query and mutation surface over a backing store.
pub struct PermissionService {
    store: Arc<dyn DataStore>,
    config: EngineConfig,
    subjects: DashMap<String, SubjectCache>,
    ladders: RankLadderCache,
    notifier: Arc<dyn CheckNotifier>,
}

impl PermissionService {
    /// Create a service over `store`.
    ///
    /// Checks are reported through [`TracingNotifier`] when `config.debug`
    /// is set.
    pub fn new(store: Arc<dyn DataStore>, config: EngineConfig) -> Self {
        let notifier: Arc<dyn CheckNotifier> = if config.debug {
            Arc::new(TracingNotifier)
        } else {
            Arc::new(NoopNotifier)
        };
        info!(
            debug = config.debug,
            use_type_defaults = config.use_type_defaults,
            max_inheritance_depth = config.max_inheritance_depth,
            "Permission service initialized"
        );
        Self {
            ladders: RankLadderCache::new(Arc::clone(&store)),
            store,
            config,
            subjects: DashMap::new(),
            notifier,
        }
    }

    /// Replace the check notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn CheckNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The subject cache for `subject_type`, created on first use.
    pub fn subjects(&self, subject_type: &str) -> SubjectCache {
        if let Some(cache) = self.subjects.get(subject_type) {
            return cache.clone();
        }
        self.subjects
            .entry(subject_type.to_string())
            .or_insert_with(|| SubjectCache::new(subject_type, Arc::clone(&self.store)))
            .clone()
    }

    /// Subject types with a cache.
    pub fn subject_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.subjects.iter().map(|e| e.key().clone()).collect();
        types.sort();
        types
    }

    pub const fn ladders(&self) -> &RankLadderCache {
        &self.ladders
    }

    pub async fn subject(
        &self,
        subject: &SubjectRef,
    ) -> Result<Arc<CalculatedSubject>, CacheError> {
        self.subjects(subject.subject_type())
            .get(subject.identifier())
            .await
    }

    /// Default subjects consulted after `subject`'s own inheritance chain.
    fn fallbacks(&self, subject: &SubjectRef) -> Vec<SubjectRef> {
        if !self.config.use_type_defaults {
            return Vec::new();
        }
        let defaults_type = self.config.defaults_type.as_str();
        let mut ids = Vec::with_capacity(2);
        if subject.subject_type() != defaults_type {
            ids.push(subject.subject_type());
        }
        ids.push(GLOBAL_DEFAULTS);
        ids.into_iter()
            .filter_map(|id| SubjectRef::new(defaults_type, id).ok())
            .filter(|fallback| fallback != subject)
            .collect()
    }

    /// Load everything needed to answer queries for `subject` under `contexts`.
    pub async fn graph(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
    ) -> Result<InheritanceGraph, CacheError> {
        InheritanceGraph::load(
            self,
            subject.clone(),
            self.fallbacks(subject),
            contexts.clone(),
            self.config.max_inheritance_depth,
        )
        .await
    }

    /// Effective value of `permission` for `subject` under `contexts`.
    pub async fn permission(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
        permission: &str,
    ) -> Result<Tristate, CacheError> {
        let result = self.graph(subject, contexts).await?.permission(permission);
        self.notifier
            .on_permission_check(subject, contexts, permission, result);
        Ok(result)
    }

    /// Like [`permission`](Self::permission), with `Undefined` mapped to the
    /// configured default.
    pub async fn has_permission(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
        permission: &str,
    ) -> Result<bool, CacheError> {
        let result = self.permission(subject, contexts, permission).await?;
        Ok(result.as_bool_or(self.config.default_permission))
    }

    /// Effective value of option `key` for `subject` under `contexts`.
    pub async fn option(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
        key: &str,
    ) -> Result<Option<String>, CacheError> {
        let result = self.graph(subject, contexts).await?.option(key);
        self.notifier
            .on_option_check(subject, contexts, key, result.as_deref());
        Ok(result)
    }

    /// Direct parents of `subject` under `contexts`, most specific first.
    pub async fn parents(
        &self,
        subject: &SubjectRef,
        contexts: &ContextSet,
    ) -> Result<Vec<SubjectRef>, CacheError> {
        let parents = self.subject(subject).await?.parents(contexts);
        self.notifier.on_parent_check(subject, contexts, &parents);
        Ok(parents)
    }

    /// Move `subject` one rank up `ladder` under `contexts`.
    #[tracing::instrument(skip(self), fields(subject = %subject, contexts = %contexts))]
    pub async fn promote(
        &self,
        subject: &SubjectRef,
        ladder: &str,
        contexts: &ContextSet,
    ) -> Result<Arc<CalculatedSubject>, CacheError> {
        let ladder = self.ladders.get(ladder).await?;
        self.subjects(subject.subject_type())
            .update(subject.identifier(), |data| ladder.promote(data, contexts))
            .await
    }

    /// Move `subject` one rank down `ladder` under `contexts`.
    #[tracing::instrument(skip(self), fields(subject = %subject, contexts = %contexts))]
    pub async fn demote(
        &self,
        subject: &SubjectRef,
        ladder: &str,
        contexts: &ContextSet,
    ) -> Result<Arc<CalculatedSubject>, CacheError> {
        let ladder = self.ladders.get(ladder).await?;
        self.subjects(subject.subject_type())
            .update(subject.identifier(), |data| ladder.demote(data, contexts))
            .await
    }

    /// Drop every cached subject and ladder.
    pub fn clear_caches(&self) {
        for cache in self.subjects.iter() {
            cache.clear();
        }
        self.ladders.clear();
    }
}

impl SubjectSource for PermissionService {
    fn load<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<Arc<CalculatedSubject>, CacheError>> {
        self.subject(subject).boxed()
    }
}
