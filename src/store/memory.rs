//! In-Process Store Module
//!
//! HashMap keyspace with LRU capacity eviction and per-key millisecond TTL,
//! exposed through the same `KvStore` interface as Redis.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::pattern::glob_match;
use super::{KeyInfo, KvStore, LruTracker, RawItem, StoreInfo, StoredEntry};
use super::{MAX_STORED_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};

// == Keyspace ==
/// Synchronous keyspace state guarded by `MemoryStore`.
#[derive(Debug)]
pub struct Keyspace {
    entries: HashMap<String, StoredEntry>,
    lru: LruTracker,
    /// Registered namespace labels, kept apart from `entries`
    namespaces: BTreeSet<String>,
    max_entries: usize,
    /// Bytes of keys plus values currently held
    memory_bytes: usize,
    evictions: u64,
    expired: u64,
}

impl Keyspace {
    // == Constructor ==
    /// Creates an empty keyspace holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            namespaces: BTreeSet::new(),
            max_entries: max_entries.max(1),
            memory_bytes: 0,
            evictions: 0,
            expired: 0,
        }
    }

    fn validate(key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_STORED_KEY_LENGTH {
            return Err(CacheError::InvalidKey(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_STORED_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
        Ok(())
    }

    // == Set ==
    /// Stores a value, replacing any previous one and resetting its TTL.
    ///
    /// When a new key arrives at capacity, the least recently used key is evicted.
    pub fn set(&mut self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        Self::validate(key, &value)?;

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.remove_entry(&evicted);
                self.evictions += 1;
            }
        }

        let entry = StoredEntry::new(value, ttl);
        self.memory_bytes += entry.footprint(key);
        if let Some(previous) = self.entries.insert(key.to_string(), entry) {
            self.memory_bytes -= previous.footprint(key);
        }
        self.lru.touch(key);
        Ok(())
    }

    // == Get ==
    /// Returns the value if present and not expired. Expired entries are dropped.
    pub fn get(&mut self, key: &str) -> Option<String> {
        if self.drop_if_expired(key) {
            return None;
        }
        let value = self.entries.get(key)?.value.clone();
        self.lru.touch(key);
        Some(value)
    }

    // == Delete ==
    /// Removes a key, returning whether a live entry existed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.drop_if_expired(key) {
            return false;
        }
        self.remove_entry(key).is_some()
    }

    // == Scan ==
    /// Returns live keys matching `pattern`, at most `limit` of them.
    pub fn scan(&self, pattern: &str, limit: Option<usize>) -> Vec<String> {
        let matching = self
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && glob_match(pattern, key))
            .map(|(key, _)| key.clone());

        match limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    // == Key Info ==
    pub fn key_info(&self, key: &str) -> Option<KeyInfo> {
        let entry = self.entries.get(key).filter(|entry| !entry.is_expired())?;
        Some(KeyInfo {
            key: key.to_string(),
            kind: "string".to_string(),
            ttl_ms: entry.ttl_remaining_ms(),
            size_bytes: Some(entry.footprint(key) as u64),
        })
    }

    // == Info ==
    pub fn info(&self) -> StoreInfo {
        StoreInfo {
            key_count: self.entries.len() as u64,
            memory_usage_bytes: Some(self.memory_bytes as u64),
            evictions: Some(self.evictions),
            expired: Some(self.expired),
        }
    }

    // == Namespace Registry ==
    pub fn register_namespace(&mut self, label: &str) {
        if !self.namespaces.contains(label) {
            self.namespaces.insert(label.to_string());
        }
    }

    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.iter().cloned().collect()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        self.expired += expired_keys.len() as u64;
        expired_keys.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn drop_if_expired(&mut self, key: &str) -> bool {
        let expired = self.entries.get(key).is_some_and(StoredEntry::is_expired);
        if expired {
            self.remove_entry(key);
            self.expired += 1;
        }
        expired
    }

    fn remove_entry(&mut self, key: &str) -> Option<StoredEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.memory_bytes -= entry.footprint(key);
        Some(entry)
    }
}

// == Memory Store ==
/// Shared handle to an in-process keyspace.
///
/// Every operation takes the keyspace lock once, so each call is atomic
/// with respect to concurrent callers.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    keyspace: Arc<RwLock<Keyspace>>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            keyspace: Arc::new(RwLock::new(Keyspace::new(max_entries))),
        }
    }

    /// Removes expired entries; used by the background sweeper.
    pub async fn purge_expired(&self) -> usize {
        self.keyspace.write().await.cleanup_expired()
    }

    pub async fn len(&self) -> usize {
        self.keyspace.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keyspace.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Write lock: reads refresh recency and may drop an expired entry
        Ok(self.keyspace.write().await.get(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        self.keyspace.write().await.set(key, value, ttl)
    }

    async fn set_many(&self, items: Vec<RawItem>) -> Result<()> {
        for item in &items {
            Keyspace::validate(&item.key, &item.value)?;
        }
        let mut keyspace = self.keyspace.write().await;
        for item in items {
            keyspace.set(&item.key, item.value, item.ttl)?;
        }
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        let mut keyspace = self.keyspace.write().await;
        Ok(keys.iter().filter(|key| keyspace.delete(key)).count() as u64)
    }

    async fn scan(&self, pattern: &str, limit: Option<usize>) -> Result<Vec<String>> {
        Ok(self.keyspace.read().await.scan(pattern, limit))
    }

    async fn key_info(&self, key: &str) -> Result<Option<KeyInfo>> {
        Ok(self.keyspace.read().await.key_info(key))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo> {
        Ok(self.keyspace.read().await.info())
    }

    async fn register_namespace(&self, label: &str) -> Result<()> {
        self.keyspace.write().await.register_namespace(label);
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        Ok(self.keyspace.read().await.namespaces())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const LONG: Option<Duration> = Some(Duration::from_secs(300));

    #[test]
    fn test_keyspace_new() {
        let keyspace = Keyspace::new(100);
        assert_eq!(keyspace.len(), 0);
        assert!(keyspace.is_empty());
    }

    #[test]
    fn test_keyspace_set_and_get() {
        let mut keyspace = Keyspace::new(100);

        keyspace.set("ns:key1", "\"value1\"".to_string(), LONG).unwrap();

        assert_eq!(keyspace.get("ns:key1").as_deref(), Some("\"value1\""));
        assert_eq!(keyspace.len(), 1);
        assert!(keyspace.get("ns:missing").is_none());
    }

    #[test]
    fn test_keyspace_overwrite_keeps_single_entry() {
        let mut keyspace = Keyspace::new(100);

        keyspace.set("k", "1".to_string(), LONG).unwrap();
        keyspace.set("k", "22".to_string(), None).unwrap();

        assert_eq!(keyspace.get("k").as_deref(), Some("22"));
        assert_eq!(keyspace.len(), 1);
        assert_eq!(keyspace.info().memory_usage_bytes, Some(3));
        assert_eq!(keyspace.key_info("k").unwrap().ttl_ms, None);
    }

    #[test]
    fn test_keyspace_delete_reports_presence() {
        let mut keyspace = Keyspace::new(100);
        keyspace.set("k", "1".to_string(), LONG).unwrap();

        assert!(keyspace.delete("k"));
        assert!(!keyspace.delete("k"));
        assert!(keyspace.is_empty());
        assert_eq!(keyspace.info().memory_usage_bytes, Some(0));
    }

    #[test]
    fn test_keyspace_ttl_expiration() {
        let mut keyspace = Keyspace::new(100);
        keyspace
            .set("k", "1".to_string(), Some(Duration::from_millis(30)))
            .unwrap();
        assert!(keyspace.get("k").is_some());

        sleep(Duration::from_millis(50));

        assert!(keyspace.get("k").is_none());
        assert!(!keyspace.delete("k"), "expired key is not reported as deleted");
        assert_eq!(keyspace.info().expired, Some(1));
    }

    #[test]
    fn test_namespace_registry_is_not_a_key() {
        let mut keyspace = Keyspace::new(1);
        keyspace.register_namespace("reports");
        keyspace.register_namespace("reports");
        keyspace.set("a", "1".to_string(), LONG).unwrap();
        keyspace.set("b", "2".to_string(), LONG).unwrap();

        assert_eq!(keyspace.namespaces(), vec!["reports".to_string()]);
        assert_eq!(keyspace.len(), 1);
        assert!(keyspace.scan("*", None).iter().all(|key| key == "b"));
    }

    #[test]
    fn test_keyspace_lru_eviction() {
        let mut keyspace = Keyspace::new(3);

        keyspace.set("key1", "1".to_string(), LONG).unwrap();
        keyspace.set("key2", "2".to_string(), LONG).unwrap();
        keyspace.set("key3", "3".to_string(), LONG).unwrap();
        // Reading key1 makes key2 the eviction candidate
        keyspace.get("key1");
        keyspace.set("key4", "4".to_string(), LONG).unwrap();

        assert_eq!(keyspace.len(), 3);
        assert!(keyspace.get("key1").is_some());
        assert!(keyspace.get("key2").is_none());
        assert_eq!(keyspace.info().evictions, Some(1));
    }

    #[test]
    fn test_keyspace_scan_matches_pattern() {
        let mut keyspace = Keyspace::new(100);
        keyspace.set("STORAGE:a", "1".to_string(), LONG).unwrap();
        keyspace.set("STORAGE:b", "1".to_string(), LONG).unwrap();
        keyspace.set("settings:a", "1".to_string(), LONG).unwrap();

        let mut keys = keyspace.scan("STORAGE:*", None);
        keys.sort();
        assert_eq!(keys, vec!["STORAGE:a", "STORAGE:b"]);
        assert_eq!(keyspace.scan("*", Some(2)).len(), 2);
    }

    #[test]
    fn test_keyspace_cleanup_expired() {
        let mut keyspace = Keyspace::new(100);
        keyspace
            .set("short", "1".to_string(), Some(Duration::from_millis(20)))
            .unwrap();
        keyspace.set("long", "1".to_string(), LONG).unwrap();

        sleep(Duration::from_millis(40));

        assert_eq!(keyspace.cleanup_expired(), 1);
        assert_eq!(keyspace.len(), 1);
        assert!(keyspace.get("long").is_some());
    }

    #[test]
    fn test_keyspace_rejects_oversized_input() {
        let mut keyspace = Keyspace::new(100);

        let long_key = "x".repeat(MAX_STORED_KEY_LENGTH + 1);
        assert!(matches!(
            keyspace.set(&long_key, "1".to_string(), None),
            Err(CacheError::InvalidKey(_))
        ));

        let large_value = "x".repeat(MAX_VALUE_SIZE + 1);
        assert!(keyspace.set("k", large_value, None).is_err());
    }

    #[tokio::test]
    async fn test_memory_store_set_many_is_all_or_nothing() {
        let store = MemoryStore::new(100);
        let items = vec![
            RawItem {
                key: "ok".to_string(),
                value: "1".to_string(),
                ttl: None,
            },
            RawItem {
                key: String::new(),
                value: "1".to_string(),
                ttl: None,
            },
        ];

        assert!(store.set_many(items).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_store_delete_counts_existing() {
        let store = MemoryStore::new(100);
        store.set("a", "1".to_string(), None).await.unwrap();
        store.set("b", "1".to_string(), None).await.unwrap();

        let removed = store
            .delete(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.len().await, 0);
    }
}
