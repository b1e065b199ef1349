//! Document cache
//!
//! URL -> snapshot store scoped to one page session. Entries are immutable;
//! anything that changes rendered output (theme, locale) flushes the store
//! wholesale instead of patching entries. Keys are expected to be already
//! normalized by the session layer.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::document::DocumentSnapshot;

/// In-memory store of prefetched document snapshots
pub struct DocumentCache {
    entries: RwLock<HashMap<String, DocumentSnapshot>>,
}

impl DocumentCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store a snapshot under a normalized URL, replacing any previous entry
    pub fn insert(&self, url: &str, snapshot: DocumentSnapshot) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(url.to_string(), snapshot);
        }
    }

    /// Store a snapshot only while `allow` still holds.
    ///
    /// `allow` is evaluated under the write lock, so a caller that clears
    /// the cache after flipping the condition cannot interleave with the
    /// insert. Returns whether the snapshot was stored. Late-settling
    /// prefetches use this so they cannot resurrect entries past a flush.
    pub fn insert_if(
        &self,
        url: &str,
        snapshot: DocumentSnapshot,
        allow: impl FnOnce() -> bool,
    ) -> bool {
        if let Ok(mut entries) = self.entries.write() {
            if allow() {
                entries.insert(url.to_string(), snapshot);
                return true;
            }
        }
        false
    }

    /// Look up the snapshot for a URL
    pub fn get(&self, url: &str) -> Option<DocumentSnapshot> {
        let entries = self.entries.read().ok()?;
        entries.get(url).cloned()
    }

    /// Check whether a URL has a cached snapshot
    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(url))
            .unwrap_or(false)
    }

    /// Evict a single entry
    pub fn remove(&self, url: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(url);
        }
    }

    /// Evict everything
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of cached snapshots
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().ok();
        let (count, size_bytes) = entries
            .map(|e| (e.len(), e.values().map(DocumentSnapshot::size_bytes).sum()))
            .unwrap_or((0, 0));

        CacheStats {
            entries: count,
            size_bytes,
        }
    }
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached snapshots
    pub entries: usize,
    /// Total snapshot size in bytes
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(body: &str) -> DocumentSnapshot {
        DocumentSnapshot {
            head: String::new(),
            body: body.to_string(),
            title: String::new(),
        }
    }

    #[test]
    fn test_insert_get() {
        let cache = DocumentCache::new();
        cache.insert("/about", snapshot("Hi"));

        let cached = cache.get("/about");
        assert!(cached.is_some());
        assert_eq!(cached.unwrap().body, "Hi");
        assert!(cache.get("/missing").is_none());
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let cache = DocumentCache::new();
        cache.insert("/a", snapshot("old"));
        cache.insert("/a", snapshot("new"));
        assert_eq!(cache.get("/a").unwrap().body, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_if_respects_condition() {
        let cache = DocumentCache::new();

        assert!(cache.insert_if("/a", snapshot("a"), || true));
        assert!(cache.contains("/a"));

        assert!(!cache.insert_if("/b", snapshot("b"), || false));
        assert!(!cache.contains("/b"));
    }

    #[test]
    fn test_remove_evicts_only_one_entry() {
        let cache = DocumentCache::new();
        cache.insert("/a", snapshot("a"));
        cache.insert("/b", snapshot("b"));

        cache.remove("/a");
        assert!(!cache.contains("/a"));
        assert!(cache.contains("/b"));
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = DocumentCache::new();
        cache.insert("/a", snapshot("a"));
        cache.insert("/b", snapshot("b"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats() {
        let cache = DocumentCache::new();
        cache.insert("/a", snapshot("1234"));
        cache.insert("/b", snapshot("12"));

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.size_bytes, 6);
    }
}
