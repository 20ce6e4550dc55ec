//! Rank Ladder Cache

use std::sync::Arc;

use tracing::debug;

use super::error::CacheError;
use super::locks::KeyedLocks;
use super::single_flight::SingleFlight;
use crate::data::DataStore;
use crate::ladder::RankLadder;
use crate::listeners::{CacheListenerHolder, ListenerHandle};

struct Inner {
    store: Arc<dyn DataStore>,
    entries: Arc<SingleFlight<String, RankLadder>>,
    listeners: CacheListenerHolder<String, Arc<RankLadder>>,
    writes: KeyedLocks<String>,
}

/// Cache of rank ladders keyed by name. Unknown ladders load as empty.
#[derive(Clone)]
pub struct RankLadderCache {
    inner: Arc<Inner>,
}

const fn check_name(name: &str) -> Result<(), CacheError> {
    if name.is_empty() {
        return Err(CacheError::EmptyLadderName);
    }
    Ok(())
}

impl RankLadderCache {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                entries: Arc::new(SingleFlight::new()),
                listeners: CacheListenerHolder::new(),
                writes: KeyedLocks::new(),
            }),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, name: &str) -> Result<Arc<RankLadder>, CacheError> {
        check_name(name)?;
        let store = Arc::clone(&self.inner.store);
        let owned = name.to_string();

        let ladder = self
            .inner
            .entries
            .get_or_load(owned.clone(), move || async move {
                let ladder = store.get_rank_ladder(&owned).await?;
                Ok(ladder.unwrap_or_else(|| RankLadder::new(owned)))
            })
            .await?;
        Ok(ladder)
    }

    pub fn get_if_cached(&self, name: &str) -> Option<Arc<RankLadder>> {
        self.inner.entries.get_if_present(&name.to_string())
    }

    /// Apply `f` to the current ladder, persist, and notify listeners.
    #[tracing::instrument(skip(self, f))]
    pub async fn update<F>(&self, name: &str, f: F) -> Result<Arc<RankLadder>, CacheError>
    where
        F: FnOnce(&RankLadder) -> RankLadder + Send,
    {
        check_name(name)?;
        let key = name.to_string();
        let _guard = self.inner.writes.lock(&key).await;

        let current = self.get(name).await?;
        let ladder = f(current.as_ref());
        if ladder == *current {
            return Ok(current);
        }
        self.commit(key, ladder).await
    }

    /// Overwrite the ladder, persist it, and notify listeners, even when it
    /// equals the cached one.
    #[tracing::instrument(skip(self, ladder))]
    pub async fn set(
        &self,
        name: &str,
        ladder: RankLadder,
    ) -> Result<Arc<RankLadder>, CacheError> {
        check_name(name)?;
        let key = name.to_string();
        let _guard = self.inner.writes.lock(&key).await;
        self.commit(key, ladder).await
    }

    /// Caller holds the write lock for `key`.
    async fn commit(
        &self,
        key: String,
        ladder: RankLadder,
    ) -> Result<Arc<RankLadder>, CacheError> {
        let stored = if ladder.ranks().is_empty() {
            None
        } else {
            Some(&ladder)
        };
        self.inner.store.set_rank_ladder(&key, stored).await?;

        let updated = Arc::new(ladder);
        self.inner.entries.replace(key.clone(), Arc::clone(&updated));
        self.inner.listeners.call(&key, &updated);
        debug!(ranks = updated.ranks().len(), "Rank ladder updated");
        Ok(updated)
    }

    /// Whether the store holds a ladder named `name`.
    pub async fn has(&self, name: &str) -> Result<bool, CacheError> {
        check_name(name)?;
        Ok(self.inner.store.get_rank_ladder(name).await?.is_some())
    }

    pub async fn names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.inner.store.rank_ladders().await?)
    }

    pub fn invalidate(&self, name: &str) {
        self.inner.entries.invalidate(&name.to_string());
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    pub fn add_listener<F>(&self, name: &str, listener: F) -> ListenerHandle
    where
        F: Fn(&Arc<RankLadder>) + Send + Sync + 'static,
    {
        self.inner.listeners.add_listener(name.to_string(), listener)
    }

    pub fn remove_listener(&self, name: &str, handle: ListenerHandle) -> bool {
        self.inner
            .listeners
            .remove_listener(&name.to_string(), handle)
    }
}
