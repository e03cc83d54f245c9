//! Bounded LRU cache of encoded image bytes.
//!
//! Shared between the foreground and the prefetch worker. Every operation
//! takes the one mutex for its whole duration, and callers only ever get
//! copies of the stored buffers. Each entry costs 1 against the capacity.

use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

struct CacheState {
    entries: LruCache<String, Vec<u8>>,
    capacity: usize,
}

impl CacheState {
    fn evict_to_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            if self.entries.pop_lru().is_none() {
                break;
            }
        }
    }
}

pub struct ByteCache {
    state: Mutex<CacheState>,
}

impl ByteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                capacity,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The map stays consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains(key)
    }

    /// Presence test that also marks the entry as recently used.
    pub fn touch(&self, key: &str) -> bool {
        self.lock().entries.get(key).is_some()
    }

    /// A private copy of the cached bytes; counts as a use for LRU ordering.
    pub fn get_copy(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().entries.get(key).cloned()
    }

    /// Store `bytes` under `key`, evicting least recently used entries until
    /// the total cost fits. A zero capacity makes this a no-op.
    pub fn insert(&self, key: String, bytes: Vec<u8>) {
        let mut state = self.lock();
        if state.capacity == 0 {
            return;
        }
        state.entries.put(key, bytes);
        state.evict_to_capacity();
    }

    pub fn set_capacity(&self, capacity: usize) {
        let mut state = self.lock();
        state.capacity = capacity;
        state.evict_to_capacity();
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Snapshot of the keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.iter().map(|(k, _)| k.clone()).collect()
    }
}
