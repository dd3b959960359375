//! Cache Store Module
//!
//! Main cache engine: HashMap storage with TTL expiration.
//!
//! The store is not synchronized; `Cache` wraps it in a single reader/writer
//! lock shared with the reaper.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::current_timestamp_ns;
use crate::cache::{CacheEntry, Ttl, Value};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Key-value storage with per-entry expiration.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// TTL applied for `Ttl::Default`
    default_ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL used for `Ttl::Default`; zero means never expire
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are reported as absent but left in place; only a sweep
    /// or an explicit delete reclaims them.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.live_entry(key, current_timestamp_ns())
            .map(|entry| entry.value.clone())
    }

    /// Remaining lifetime of a live entry: `Some(None)` if it never expires.
    pub fn ttl_remaining(&self, key: &str) -> Option<Option<Duration>> {
        self.live_entry(key, current_timestamp_ns())
            .map(CacheEntry::ttl_remaining)
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    pub fn set(&mut self, key: String, value: Value, ttl: Ttl) {
        let entry = CacheEntry::new(value, ttl.resolve(self.default_ttl));
        self.entries.insert(key, entry);
    }

    // == Add ==
    /// Stores a value only if no live entry exists for `key`.
    pub fn add(&mut self, key: String, value: Value, ttl: Ttl) -> Result<()> {
        if self.live_entry(&key, current_timestamp_ns()).is_some() {
            return Err(CacheError::AlreadyExists(key));
        }
        self.set(key, value, ttl);
        Ok(())
    }

    // == Replace ==
    /// Overwrites a value only if a live entry exists for `key`.
    pub fn replace(&mut self, key: String, value: Value, ttl: Ttl) -> Result<()> {
        if self.live_entry(&key, current_timestamp_ns()).is_none() {
            return Err(CacheError::NotFound(key));
        }
        self.set(key, value, ttl);
        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key. Returns true if something was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Sweep Expired ==
    /// Removes all entries expired as of the start of the sweep.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ns();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    // == Merge Snapshot ==
    /// Merges loaded entries without clobbering live data.
    ///
    /// A loaded entry is kept only where the current entry is absent or
    /// expired. Returns the number of entries taken from the snapshot.
    pub fn merge_snapshot(&mut self, loaded: Vec<(String, CacheEntry)>) -> usize {
        let now = current_timestamp_ns();
        let mut merged = 0;

        for (key, entry) in loaded {
            let keep_current = self
                .entries
                .get(&key)
                .is_some_and(|current| !current.is_expired_at(now));
            if !keep_current {
                self.entries.insert(key, entry);
                merged += 1;
            }
        }

        merged
    }

    /// Iterates over every stored entry, expired ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_entry(&self, key: &str, now: i64) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const SHORT: Duration = Duration::from_millis(30);
    const WAIT: Duration = Duration::from_millis(60);

    fn text(s: &str) -> Value {
        Value::new(s.to_string())
    }

    fn get_text(store: &CacheStore, key: &str) -> Option<String> {
        store
            .get(key)
            .and_then(|v| v.downcast_ref::<String>().cloned())
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(Duration::from_secs(300));
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("value1"), Ttl::Default);

        assert_eq!(get_text(&store, "key1").as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = CacheStore::new(Duration::from_secs(300));
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_delete() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("value1"), Ttl::Default);
        assert!(store.delete("key1"));

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_delete_nonexistent_is_noop() {
        let mut store = CacheStore::new(Duration::from_secs(300));
        assert!(!store.delete("nonexistent"));
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("value1"), Ttl::Default);
        store.set("key1".to_string(), text("value2"), Ttl::Default);

        assert_eq!(get_text(&store, "key1").as_deref(), Some("value2"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_expiration_is_lazy() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("value1"), Ttl::After(SHORT));
        assert!(store.get("key1").is_some());

        sleep(WAIT);

        assert!(store.get("key1").is_none());
        // Reads never reclaim space.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_never_expires() {
        let mut store = CacheStore::new(SHORT);

        store.set("key1".to_string(), text("value1"), Ttl::Never);
        sleep(WAIT);

        assert!(store.get("key1").is_some());
        assert_eq!(store.ttl_remaining("key1"), Some(None));
    }

    #[test]
    fn test_store_default_ttl_applies() {
        let mut store = CacheStore::new(SHORT);

        store.set("key1".to_string(), text("value1"), Ttl::Default);
        assert!(store.get("key1").is_some());

        sleep(WAIT);
        assert!(store.get("key1").is_none());
    }

    #[test]
    fn test_store_zero_default_ttl_never_expires() {
        let mut store = CacheStore::new(Duration::ZERO);

        store.set("key1".to_string(), text("value1"), Ttl::Default);

        assert!(store.get("key1").is_some());
        assert_eq!(store.ttl_remaining("key1"), Some(None));
    }

    #[test]
    fn test_store_add() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.add("key1".to_string(), text("v1"), Ttl::Default).unwrap();
        let result = store.add("key1".to_string(), text("v2"), Ttl::Default);

        assert!(matches!(result, Err(CacheError::AlreadyExists(ref k)) if k == "key1"));
        assert_eq!(get_text(&store, "key1").as_deref(), Some("v1"));
    }

    #[test]
    fn test_store_add_over_expired_entry() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("old"), Ttl::After(SHORT));
        sleep(WAIT);

        store.add("key1".to_string(), text("new"), Ttl::Default).unwrap();
        assert_eq!(get_text(&store, "key1").as_deref(), Some("new"));
    }

    #[test]
    fn test_store_replace() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        let missing = store.replace("key1".to_string(), text("v1"), Ttl::Default);
        assert!(matches!(missing, Err(CacheError::NotFound(_))));
        assert!(store.is_empty());

        store.set("key1".to_string(), text("v1"), Ttl::Default);
        store.replace("key1".to_string(), text("v2"), Ttl::Default).unwrap();
        assert_eq!(get_text(&store, "key1").as_deref(), Some("v2"));
    }

    #[test]
    fn test_store_replace_expired_is_not_found() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("v1"), Ttl::After(SHORT));
        sleep(WAIT);

        let result = store.replace("key1".to_string(), text("v2"), Ttl::Default);
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_clear() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("v1"), Ttl::Default);
        store.set("key2".to_string(), text("v2"), Ttl::Never);
        store.clear();

        assert!(store.is_empty());
    }

    #[test]
    fn test_store_sweep_expired() {
        let mut store = CacheStore::new(Duration::from_secs(300));

        store.set("key1".to_string(), text("value1"), Ttl::After(SHORT));
        store.set("key2".to_string(), text("value2"), Ttl::After(Duration::from_secs(10)));
        store.set("key3".to_string(), text("value3"), Ttl::Never);

        sleep(WAIT);

        let removed = store.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
    }

    #[test]
    fn test_store_merge_keeps_live_entries() {
        let mut store = CacheStore::new(Duration::from_secs(300));
        store.set("live".to_string(), text("current"), Ttl::Default);
        store.set("stale".to_string(), text("current"), Ttl::After(SHORT));
        sleep(WAIT);

        let loaded = vec![
            ("live".to_string(), CacheEntry::new(text("loaded"), None)),
            ("stale".to_string(), CacheEntry::new(text("loaded"), None)),
            ("fresh".to_string(), CacheEntry::new(text("loaded"), None)),
        ];
        let merged = store.merge_snapshot(loaded);

        assert_eq!(merged, 2);
        assert_eq!(get_text(&store, "live").as_deref(), Some("current"));
        assert_eq!(get_text(&store, "stale").as_deref(), Some("loaded"));
        assert_eq!(get_text(&store, "fresh").as_deref(), Some("loaded"));
    }
}
