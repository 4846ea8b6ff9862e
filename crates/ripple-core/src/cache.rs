//! Explicit memoization of expensive, immutable values.
//!
//! A [`Memo`] maps keys to values computed at most once. Each key has its
//! own slot lock, so concurrent callers asking for the same key wait for a
//! single computation while callers for different keys proceed
//! independently. A failed computation stores nothing; the next caller
//! tries again.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-key storage: empty until a computation succeeds.
type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Thread-safe compute-once cache. Safe to share via `Arc<Memo<K, V>>`.
#[derive(Debug)]
pub struct Memo<K, V> {
    slots: Mutex<BTreeMap<K, Slot<V>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Clone, V> Memo<K, V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `init` if absent.
    ///
    /// `init` runs at most once per key among successful calls; while it
    /// runs, other callers for the same key block.
    ///
    /// # Errors
    ///
    /// Returns whatever `init` returns on failure. Nothing is cached then.
    pub fn get_or_try_init<E>(
        &self,
        key: &K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key.clone()).or_default())
        };

        let mut value = lock(&slot);
        if let Some(existing) = value.as_ref() {
            return Ok(Arc::clone(existing));
        }
        let computed = Arc::new(init()?);
        *value = Some(Arc::clone(&computed));
        Ok(computed)
    }

    /// The cached value for `key`, if one has been computed.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = lock(&self.slots).get(key).map(Arc::clone)?;
        let value = lock(&slot);
        value.as_ref().map(Arc::clone)
    }

    /// Number of keys holding a computed value.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = lock(&self.slots).values().map(Arc::clone).collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }

    /// Whether no value has been computed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
