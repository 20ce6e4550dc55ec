//! Keyed listener registry.
//!
//! Listeners are registered per key and identified by the
//! [`ListenerHandle`] returned at registration, so removing one never
//! depends on comparing closures. Registering the same closure twice yields
//! two independent registrations.

use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

/// Callback invoked with the new value for a key.
pub type Listener<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Token identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Thread-safe mapping from key to registered listeners.
pub struct CacheListenerHolder<K, V> {
    listeners: DashMap<K, Vec<(ListenerHandle, Listener<V>)>>,
    next_handle: AtomicU64,
}

impl<K, V> Default for CacheListenerHolder<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheListenerHolder<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Register `listener` for `key`.
    pub fn add_listener<F>(&self, key: K, listener: F) -> ListenerHandle
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.add_shared(key, Arc::new(listener))
    }

    /// Register an already shared listener for `key`.
    pub fn add_shared(&self, key: K, listener: Listener<V>) -> ListenerHandle {
        let handle = ListenerHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(key)
            .or_default()
            .push((handle, listener));
        handle
    }

    /// Remove one registration. Returns `false` if it was not registered.
    pub fn remove_listener(&self, key: &K, handle: ListenerHandle) -> bool {
        let Some(mut entry) = self.listeners.get_mut(key) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|(h, _)| *h != handle);
        let removed = entry.len() < before;
        let now_empty = entry.is_empty();
        drop(entry);

        if now_empty {
            self.listeners.remove_if(key, |_, list| list.is_empty());
        }
        removed
    }

    /// Remove every registration for `key`, returning how many were dropped.
    pub fn remove_all(&self, key: &K) -> usize {
        self.listeners
            .remove(key)
            .map_or(0, |(_, list)| list.len())
    }

    /// Number of registrations for `key`.
    pub fn listener_count(&self, key: &K) -> usize {
        self.listeners.get(key).map_or(0, |list| list.len())
    }

    /// Invoke every listener registered for `key` with `value`.
    ///
    /// The listener list is snapshotted and the map lock released before any
    /// listener runs, so listeners may register or remove listeners
    /// themselves. A panicking listener is logged and skipped.
    pub fn call(&self, key: &K, value: &V) {
        let snapshot: Vec<Listener<V>> = match self.listeners.get(key) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        for listener in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener(value)));
            if result.is_err() {
                warn!("Cache listener panicked; continuing with remaining listeners");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move |_: &u32| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_listener_invoked_once_with_value() {
        let holder = CacheListenerHolder::<String, u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        holder.add_listener("alice".to_string(), move |v| sink.lock().unwrap().push(*v));

        holder.call(&"alice".to_string(), &7);

        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_removed_listener_not_invoked() {
        let holder = CacheListenerHolder::<String, u32>::new();
        let (count, listener) = counter();
        let handle = holder.add_listener("alice".to_string(), listener);

        assert!(holder.remove_listener(&"alice".to_string(), handle));
        holder.call(&"alice".to_string(), &1);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(holder.listener_count(&"alice".to_string()), 0);
    }

    #[test]
    fn test_unregistered_key_is_noop() {
        let holder = CacheListenerHolder::<String, u32>::new();
        holder.call(&"nobody".to_string(), &1);
        assert!(!holder.remove_listener(&"nobody".to_string(), ListenerHandle(42)));
    }

    #[test]
    fn test_duplicate_registrations_are_distinct() {
        let holder = CacheListenerHolder::<String, u32>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener: Listener<u32> = {
            let count = Arc::clone(&count);
            Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let first = holder.add_shared("k".to_string(), Arc::clone(&listener));
        let second = holder.add_shared("k".to_string(), listener);
        assert_ne!(first, second);

        holder.call(&"k".to_string(), &0);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        holder.remove_listener(&"k".to_string(), first);
        holder.call(&"k".to_string(), &0);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let holder = CacheListenerHolder::<String, u32>::new();
        let (count, listener) = counter();
        holder.add_listener("k".to_string(), |_| panic!("listener failure"));
        holder.add_listener("k".to_string(), listener);

        holder.call(&"k".to_string(), &0);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_reenter_registry() {
        let holder = Arc::new(CacheListenerHolder::<String, u32>::new());
        let inner = Arc::clone(&holder);
        holder.add_listener("k".to_string(), move |_| {
            inner.add_listener("other".to_string(), |_| {});
        });

        holder.call(&"k".to_string(), &0);

        assert_eq!(holder.listener_count(&"other".to_string()), 1);
    }

    #[test]
    fn test_remove_all() {
        let holder = CacheListenerHolder::<String, u32>::new();
        holder.add_listener("k".to_string(), |_| {});
        holder.add_listener("k".to_string(), |_| {});
        assert_eq!(holder.remove_all(&"k".to_string()), 2);
        assert_eq!(holder.listener_count(&"k".to_string()), 0);
    }
}
