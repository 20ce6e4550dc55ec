//! Subject Cache
//!
//! One cache per subject type. Loads are single-flight per identifier and
//! writes are serialized per identifier, so listeners observe updates for
//! one subject in the order they were issued.

use std::sync::Arc;

use perm_common::SubjectRef;
use tracing::{debug, info};

use super::error::CacheError;
use super::locks::KeyedLocks;
use super::single_flight::SingleFlight;
use crate::data::{DataStore, SubjectData};
use crate::listeners::{CacheListenerHolder, ListenerHandle};
use crate::subject::CalculatedSubject;

struct Inner {
    subject_type: String,
    store: Arc<dyn DataStore>,
    entries: Arc<SingleFlight<String, CalculatedSubject>>,
    listeners: CacheListenerHolder<String, Arc<CalculatedSubject>>,
    writes: KeyedLocks<String>,
}

/// Cache of calculated subjects for one subject type.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct SubjectCache {
    inner: Arc<Inner>,
}

impl SubjectCache {
    pub fn new(subject_type: impl Into<String>, store: Arc<dyn DataStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                subject_type: subject_type.into(),
                store,
                entries: Arc::new(SingleFlight::new()),
                listeners: CacheListenerHolder::new(),
                writes: KeyedLocks::new(),
            }),
        }
    }

    pub fn subject_type(&self) -> &str {
        &self.inner.subject_type
    }

    fn subject_ref(&self, identifier: &str) -> Result<SubjectRef, CacheError> {
        Ok(SubjectRef::new(self.inner.subject_type.as_str(), identifier)?)
    }

    /// Get the calculated subject, loading it from the store on a miss.
    ///
    /// Unknown subjects load as empty subjects.
    #[tracing::instrument(skip(self), fields(subject_type = %self.inner.subject_type))]
    pub async fn get(&self, identifier: &str) -> Result<Arc<CalculatedSubject>, CacheError> {
        let subject = self.subject_ref(identifier)?;
        let store = Arc::clone(&self.inner.store);

        let calc = self
            .inner
            .entries
            .get_or_load(identifier.to_string(), move || async move {
                let data = match store.get_data(&subject).await? {
                    Some(data) => data.validate(&subject.to_string())?,
                    None => SubjectData::empty(),
                };
                Ok(CalculatedSubject::new(subject, Arc::new(data)))
            })
            .await?;
        Ok(calc)
    }

    /// Register `listener` for `identifier`, then get the subject.
    ///
    /// The listener is in place before the load resolves, so no update that
    /// lands after the load can be missed. It is removed again if the load fails.
    pub async fn get_with_listener<F>(
        &self,
        identifier: &str,
        listener: F,
    ) -> Result<(Arc<CalculatedSubject>, ListenerHandle), CacheError>
    where
        F: Fn(&Arc<CalculatedSubject>) + Send + Sync + 'static,
    {
        self.subject_ref(identifier)?;
        let handle = self.add_listener(identifier, listener);
        match self.get(identifier).await {
            Ok(calc) => Ok((calc, handle)),
            Err(e) => {
                self.remove_listener(identifier, handle);
                Err(e)
            }
        }
    }

    /// Cached subject, without loading.
    pub fn get_if_cached(&self, identifier: &str) -> Option<Arc<CalculatedSubject>> {
        self.inner.entries.get_if_present(&identifier.to_string())
    }

    /// Apply `f` to the subject's current data, persist the result, and
    /// notify listeners.
    ///
    /// An unchanged result skips the write and notification.
    #[tracing::instrument(skip(self, f), fields(subject_type = %self.inner.subject_type))]
    pub async fn update<F>(
        &self,
        identifier: &str,
        f: F,
    ) -> Result<Arc<CalculatedSubject>, CacheError>
    where
        F: FnOnce(&SubjectData) -> SubjectData + Send,
    {
        let subject = self.subject_ref(identifier)?;
        let key = identifier.to_string();
        let _guard = self.inner.writes.lock(&key).await;

        let current = self.get(identifier).await?;
        let data = f(current.data().as_ref());
        if data == **current.data() {
            debug!("Update produced no change");
            return Ok(current);
        }
        self.commit(subject, key, data).await
    }

    /// Replace the subject's data wholesale.
    ///
    /// Always persists and notifies, even when `data` equals the cached
    /// snapshot, since the store may have changed underneath the cache.
    #[tracing::instrument(skip(self, data), fields(subject_type = %self.inner.subject_type))]
    pub async fn set(
        &self,
        identifier: &str,
        data: SubjectData,
    ) -> Result<Arc<CalculatedSubject>, CacheError> {
        let subject = self.subject_ref(identifier)?;
        let key = identifier.to_string();
        let _guard = self.inner.writes.lock(&key).await;
        self.commit(subject, key, data).await
    }

    /// Caller holds the write lock for `key`.
    async fn commit(
        &self,
        subject: SubjectRef,
        key: String,
        data: SubjectData,
    ) -> Result<Arc<CalculatedSubject>, CacheError> {
        self.inner.store.set_data(&subject, Some(&data)).await?;
        let updated = Arc::new(CalculatedSubject::new(subject, Arc::new(data)));
        self.inner.entries.replace(key.clone(), Arc::clone(&updated));
        self.inner.listeners.call(&key, &updated);
        Ok(updated)
    }

    /// Delete the subject from the store and cache it as empty.
    #[tracing::instrument(skip(self), fields(subject_type = %self.inner.subject_type))]
    pub async fn remove(&self, identifier: &str) -> Result<(), CacheError> {
        let subject = self.subject_ref(identifier)?;
        let key = identifier.to_string();
        let _guard = self.inner.writes.lock(&key).await;

        self.inner.store.set_data(&subject, None).await?;
        let empty = Arc::new(CalculatedSubject::empty(subject));
        self.inner.entries.replace(key.clone(), Arc::clone(&empty));
        self.inner.listeners.call(&key, &empty);
        info!("Subject removed");
        Ok(())
    }

    /// Whether the store holds data for `identifier`. Does not populate the cache.
    pub async fn has(&self, identifier: &str) -> Result<bool, CacheError> {
        let subject = self.subject_ref(identifier)?;
        Ok(self.inner.store.is_registered(&subject).await?)
    }

    /// Identifiers of this type known to the store.
    pub async fn names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .inner
            .store
            .identifiers(&self.inner.subject_type)
            .await?)
    }

    /// Mark the subject stale. The next `get` reloads it.
    pub fn invalidate(&self, identifier: &str) {
        self.inner.entries.invalidate(&identifier.to_string());
    }

    /// Drop every cached subject of this type.
    pub fn clear(&self) {
        self.inner.entries.clear();
        debug!(subject_type = %self.inner.subject_type, "Subject cache cleared");
    }

    /// Number of cached subjects.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn add_listener<F>(&self, identifier: &str, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<CalculatedSubject>) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .add_listener(identifier.to_string(), listener)
    }

    pub fn remove_listener(&self, identifier: &str, handle: ListenerHandle) -> bool {
        self.inner
            .listeners
            .remove_listener(&identifier.to_string(), handle)
    }

    pub fn listener_count(&self, identifier: &str) -> usize {
        self.inner.listeners.listener_count(&identifier.to_string())
    }
}
