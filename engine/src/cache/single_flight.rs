//! Single-Flight Keyed Cache
//!
//! At most one load per key is in flight at a time. Concurrent callers for
//! the same key await the same shared load. Loads run as spawned tasks, so a
//! caller dropping its future never cancels a load others are waiting on.
//!
//! A finished load only publishes its value while its in-flight slot is still
//! the current one. `replace`, `invalidate` and `clear` drop the slot first,
//! so a load they overtook is discarded. The slot check and the insert happen
//! under the same in-flight entry lock. Nothing is kept for a key once its
//! value and load are gone.

use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::data::LoadFailure;

type SharedLoad<V> = Shared<BoxFuture<'static, Result<Arc<V>, LoadFailure>>>;

struct InFlight<V> {
    token: u64,
    load: SharedLoad<V>,
}

/// Keyed cache with deduplicated loads.
pub struct SingleFlight<K, V> {
    entries: DashMap<K, Arc<V>>,
    in_flight: DashMap<K, InFlight<V>>,
    next_token: AtomicU64,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            next_token: AtomicU64::new(1),
        }
    }

    /// Return the cached value for `key`, loading it with `loader` if absent.
    ///
    /// `loader` is only called when no load for `key` is already running.
    /// A failed load is not cached; the next call starts a fresh one.
    pub async fn get_or_load<F, Fut>(
        self: &Arc<Self>,
        key: K,
        loader: F,
    ) -> Result<Arc<V>, LoadFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, LoadFailure>> + Send + 'static,
    {
        if let Some(value) = self.entries.get(&key) {
            return Ok(Arc::clone(&value));
        }

        let load = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(slot) => slot.get().load.clone(),
            Entry::Vacant(slot) => {
                // A load may have finished between the fast path and taking the slot.
                if let Some(value) = self.entries.get(&key) {
                    return Ok(Arc::clone(&value));
                }

                let token = self.next_token.fetch_add(1, Ordering::Relaxed);
                debug!(?key, token, "Starting load");

                let load = self.spawn_load(key, token, loader());
                slot.insert(InFlight {
                    token,
                    load: load.clone(),
                });
                load
            }
        };

        load.await
    }

    fn spawn_load<Fut>(self: &Arc<Self>, key: K, token: u64, fut: Fut) -> SharedLoad<V>
    where
        Fut: Future<Output = Result<V, LoadFailure>> + Send + 'static,
    {
        let this = Arc::clone(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = fut.await.map(Arc::new);
            if let Err(e) = &result {
                warn!(key = ?task_key, error = %e, "Load failed");
            }
            this.finish(&task_key, token, result.as_ref().ok());
            result
        });

        let this = Arc::clone(self);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    this.in_flight.remove_if(&key, |_, slot| slot.token == token);
                    Err(LoadFailure::Unreachable(format!("load task aborted: {e}")))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Publish `value` and release the slot, if `token` still owns it.
    fn finish(&self, key: &K, token: u64, value: Option<&Arc<V>>) {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(slot) if slot.get().token == token => {
                if let Some(value) = value {
                    self.entries.insert(key.clone(), Arc::clone(value));
                }
                slot.remove();
            }
            _ => debug!(?key, token, "Discarding stale load"),
        }
    }

    /// Cached value for `key`, without loading.
    pub fn get_if_present(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|v| Arc::clone(&v))
    }

    /// Replace the cached value for `key`.
    ///
    /// Any load still running for `key` will not overwrite `value`.
    pub fn replace(&self, key: K, value: Arc<V>) {
        self.in_flight.remove(&key);
        self.entries.insert(key, value);
    }

    /// Drop the cached value and any running load for `key`.
    ///
    /// Callers arriving after this returns start a fresh load.
    pub fn invalidate(&self, key: &K) {
        self.in_flight.remove(key);
        self.entries.remove(key);
    }

    /// Drop every cached value and running load.
    pub fn clear(&self) {
        self.in_flight.clear();
        self.entries.clear();
    }

    /// Number of cached values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a load for `key` is currently running.
    pub fn is_loading(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }
}
