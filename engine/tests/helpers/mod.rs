//! Reusable helpers for engine integration tests.
//!
//! [`InstrumentedStore`] wraps a [`MemoryDataStore`] and lets a test count
//! subject loads, slow them down, or make them fail.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use perm_common::{ContextSet, SubjectRef, Tristate};
use perm_engine::data::{DataStore, LoadFailure, MemoryDataStore, SubjectData};
use perm_engine::{EngineConfig, PermissionService, RankLadder};

// ============================================================================
// Store wrapper
// ============================================================================

/// Store that records and perturbs subject loads.
#[derive(Default)]
pub struct InstrumentedStore {
    pub inner: MemoryDataStore,
    loads: AtomicUsize,
    delay_ms: AtomicU64,
    offline: AtomicBool,
}

impl InstrumentedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `get_data` calls seen.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Delay every subject load by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Make every subject load fail as unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl DataStore for InstrumentedStore {
    fn get_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<Option<SubjectData>, LoadFailure>> {
        async move {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.offline.load(Ordering::SeqCst) {
                return Err(LoadFailure::Unreachable("store offline".into()));
            }
            self.inner.get_data(subject).await
        }
        .boxed()
    }

    fn set_data<'a>(
        &'a self,
        subject: &'a SubjectRef,
        data: Option<&'a SubjectData>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>> {
        self.inner.set_data(subject, data)
    }

    fn is_registered<'a>(
        &'a self,
        subject: &'a SubjectRef,
    ) -> BoxFuture<'a, Result<bool, LoadFailure>> {
        self.inner.is_registered(subject)
    }

    fn identifiers<'a>(
        &'a self,
        subject_type: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>, LoadFailure>> {
        self.inner.identifiers(subject_type)
    }

    fn get_rank_ladder<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<RankLadder>, LoadFailure>> {
        self.inner.get_rank_ladder(name)
    }

    fn set_rank_ladder<'a>(
        &'a self,
        name: &'a str,
        ladder: Option<&'a RankLadder>,
    ) -> BoxFuture<'a, Result<(), LoadFailure>> {
        self.inner.set_rank_ladder(name, ladder)
    }

    fn rank_ladders(&self) -> BoxFuture<'_, Result<Vec<String>, LoadFailure>> {
        self.inner.rank_ladders()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn subject(s: &str) -> SubjectRef {
    s.parse().expect("valid subject")
}

pub fn ctx(values: &[&str]) -> ContextSet {
    ContextSet::parse(values).expect("valid contexts")
}

pub fn global() -> ContextSet {
    ContextSet::empty()
}

/// Service over a fresh in-memory store with test configuration.
pub fn service() -> (Arc<InstrumentedStore>, PermissionService) {
    service_with(EngineConfig::default_for_test())
}

pub fn service_with(config: EngineConfig) -> (Arc<InstrumentedStore>, PermissionService) {
    let store = InstrumentedStore::new();
    let service = PermissionService::new(store.clone(), config);
    (store, service)
}

/// Store `data` for `subject` through the service's cache.
pub async fn seed(service: &PermissionService, subject: &str, data: SubjectData) {
    let subject = self::subject(subject);
    service
        .subjects(subject.subject_type())
        .set(subject.identifier(), data)
        .await
        .expect("seed subject");
}

pub fn grant(permission: &str, value: Tristate) -> SubjectData {
    SubjectData::empty().with_permission(&global(), permission, value)
}
