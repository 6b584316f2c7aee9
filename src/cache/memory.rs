use lru::LruCache;
use std::sync::Mutex;

struct Inner {
    entries: LruCache<String, String>,
    used_bytes: usize,
}

/// In-process LRU bounded by the total byte length of its values.
///
/// Inserting evicts least-recently-used entries until the budget holds again.
/// A value larger than the whole budget is not stored.
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_bytes: usize,
}

impl MemoryCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                used_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Look up an entry and mark it most recently used.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(key).cloned()
    }

    /// Store an entry. Returns `false` if it exceeds the whole budget.
    pub fn insert(&self, key: impl Into<String>, value: String) -> bool {
        let size = value.len();
        if size > self.max_bytes {
            return false;
        }
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = inner.entries.put(key.into(), value) {
            inner.used_bytes -= old.len();
        }
        inner.used_bytes += size;
        while inner.used_bytes > self.max_bytes {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => inner.used_bytes -= evicted.len(),
                None => break,
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the byte lengths of all stored values.
    pub fn used_bytes(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .used_bytes
    }
}
