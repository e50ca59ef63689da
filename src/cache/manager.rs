//! Cache Manager Module
//!
//! Namespaced, JSON-serializing front end over a `KvStore`.
//!
//! Hot-path reads and writes never fail from the caller's point of view:
//! a store error on `get` is a miss and a failed `set` is logged and
//! dropped, so handlers always fall back to the source of truth.
//! Administrative operations return `Result` so the admin surface can
//! report an unhealthy store.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::stats::{CacheReport, CacheStats, StatsSnapshot};
use super::{Namespace, MAX_KEY_LENGTH, MAX_LISTED_KEYS};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::pattern::validate_pattern;
use crate::store::{KeyInfo, KvStore, RawItem, MAX_VALUE_SIZE};

/// Default TTL when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default per-operation store timeout.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

// == Cache Item ==
/// One entry of a batch write.
#[derive(Debug, Clone)]
pub struct CacheItem<T> {
    pub key: String,
    pub value: T,
    pub ttl: Option<Duration>,
    pub namespace: Namespace,
}

impl<T> CacheItem<T> {
    pub fn new(key: impl Into<String>, value: T, ttl: Option<Duration>, namespace: Namespace) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
            namespace,
        }
    }
}

/// A value returned by `read_through`, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub from_cache: bool,
}

// == Cache Manager ==
pub struct CacheManager {
    store: Arc<dyn KvStore>,
    default_ttl: Option<Duration>,
    op_timeout: Duration,
    stats: CacheStats,
    /// Namespaces this manager has registered with the store
    namespaces: Mutex<BTreeSet<Namespace>>,
}

impl CacheManager {
    // == Constructors ==
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            default_ttl: Some(DEFAULT_TTL),
            op_timeout: DEFAULT_OP_TIMEOUT,
            stats: CacheStats::new(),
            namespaces: Mutex::new(Namespace::builtin().into_iter().collect()),
        }
    }

    pub fn from_config(store: Arc<dyn KvStore>, config: &Config) -> Self {
        Self::new(store)
            .with_default_ttl(config.default_ttl())
            .with_op_timeout(config.op_timeout())
    }

    /// TTL applied when a write passes `None`; `None` here means no expiry.
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn counters(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Namespaces known to this manager without asking the store.
    pub fn known_namespaces(&self) -> Vec<Namespace> {
        self.registry().iter().cloned().collect()
    }

    // == Get ==
    /// Reads and decodes a cached value. Any failure is reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, namespace: &Namespace) -> Option<T> {
        match self.try_get(key, namespace).await {
            Ok(Some(value)) => {
                self.stats.record_hit();
                debug!(key = %key, namespace = %namespace, "cache hit");
                Some(value)
            }
            Ok(None) => {
                self.stats.record_miss();
                debug!(key = %key, namespace = %namespace, "cache miss");
                None
            }
            Err(e) => {
                self.stats.record_miss();
                self.stats.record_error();
                if e.is_store_failure() {
                    warn!(key = %key, namespace = %namespace, error = %e, "cache read failed, treating as miss");
                } else {
                    warn!(key = %key, namespace = %namespace, error = %e, "unreadable cache entry, treating as miss");
                }
                None
            }
        }
    }

    /// Like `get`, but surfaces store and decoding errors.
    pub async fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
        namespace: &Namespace,
    ) -> Result<Option<T>> {
        let full_key = full_key(key, namespace)?;
        let raw = self.run(self.store.get(&full_key)).await?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(CacheError::from))
            .transpose()
    }

    // == Set ==
    /// Encodes and stores a value. Failures are logged, never returned.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        namespace: &Namespace,
    ) {
        if let Err(e) = self.try_set(key, value, ttl, namespace).await {
            self.stats.record_error();
            warn!(key = %key, namespace = %namespace, error = %e, "cache write dropped");
        }
    }

    /// Like `set`, but surfaces the failure.
    pub async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        namespace: &Namespace,
    ) -> Result<()> {
        let full_key = full_key(key, namespace)?;
        let raw = encode(value)?;
        self.run(self.store.set(&full_key, raw, self.effective_ttl(ttl)))
            .await?;
        self.stats.record_writes(1);
        self.remember(namespace).await;
        Ok(())
    }

    // == Batch Set ==
    /// Writes several entries in one store round trip.
    ///
    /// Items that fail to encode are skipped; a store failure drops the batch.
    pub async fn mset<T: Serialize>(&self, items: Vec<CacheItem<T>>) {
        let mut raw_items = Vec::with_capacity(items.len());
        let mut written = BTreeSet::new();
        for item in &items {
            let encoded = full_key(&item.key, &item.namespace)
                .and_then(|key| Ok((key, encode(&item.value)?)));
            match encoded {
                Ok((key, value)) => {
                    written.insert(&item.namespace);
                    raw_items.push(RawItem {
                        key,
                        value,
                        ttl: self.effective_ttl(item.ttl),
                    });
                }
                Err(e) => {
                    self.stats.record_error();
                    warn!(key = %item.key, namespace = %item.namespace, error = %e, "skipping batch item");
                }
            }
        }

        if raw_items.is_empty() {
            return;
        }
        let count = raw_items.len() as u64;
        match self.run(self.store.set_many(raw_items)).await {
            Ok(()) => {
                self.stats.record_writes(count);
                for namespace in written {
                    self.remember(namespace).await;
                }
            }
            Err(e) => {
                self.stats.record_error();
                warn!(count, error = %e, "cache batch write dropped");
            }
        }
    }

    // == Read Through ==
    /// Returns the cached value, or computes it, caches it and returns it.
    ///
    /// Concurrent misses all compute; the last write wins. A failed
    /// computation is returned unchanged and nothing is cached.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: &str,
        namespace: &Namespace,
        ttl: Option<Duration>,
        compute: F,
    ) -> std::result::Result<Fetched<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key, namespace).await {
            return Ok(Fetched {
                value,
                from_cache: true,
            });
        }
        let value = compute().await?;
        self.set(key, &value, ttl, namespace).await;
        Ok(Fetched {
            value,
            from_cache: false,
        })
    }

    // == Delete ==
    /// Removes one key, returning whether it existed. Failures read as `false`.
    pub async fn delete(&self, key: &str, namespace: &Namespace) -> bool {
        match self.try_delete(key, namespace).await {
            Ok(removed) => removed,
            Err(e) => {
                self.stats.record_error();
                warn!(key = %key, namespace = %namespace, error = %e, "cache delete failed");
                false
            }
        }
    }

    pub async fn try_delete(&self, key: &str, namespace: &Namespace) -> Result<bool> {
        let full_key = full_key(key, namespace)?;
        self.delete_raw(&full_key).await
    }

    /// Removes a key given in its full `<namespace>:<key>` form.
    pub async fn delete_raw(&self, full_key: &str) -> Result<bool> {
        if full_key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }
        let removed = self.run(self.store.delete(&[full_key.to_string()])).await?;
        self.stats.record_deletes(removed);
        Ok(removed > 0)
    }

    // == Namespace Invalidation ==
    /// Removes every key in `namespace`, returning the count. Failures read as 0.
    pub async fn invalidate_namespace(&self, namespace: &Namespace) -> u64 {
        match self.try_invalidate_namespace(namespace).await {
            Ok(removed) => removed,
            Err(e) => {
                self.stats.record_error();
                warn!(namespace = %namespace, error = %e, "namespace invalidation failed");
                0
            }
        }
    }

    pub async fn try_invalidate_namespace(&self, namespace: &Namespace) -> Result<u64> {
        let keys = self
            .run(self.store.scan(&namespace.pattern(), None))
            .await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let removed = self.run(self.store.delete(&keys)).await?;
        self.stats.record_deletes(removed);
        info!(namespace = %namespace, removed, "namespace invalidated");
        Ok(removed)
    }

    /// Invalidates every namespace ("clear all cache").
    ///
    /// Covers the builtin namespaces, those this manager has seen and those
    /// the store's registry holds, so namespaces written by another replica
    /// or before a restart are cleared too.
    pub async fn invalidate_all(&self) -> Result<u64> {
        let mut namespaces: BTreeSet<Namespace> = self.known_namespaces().into_iter().collect();
        for label in self.run(self.store.namespaces()).await? {
            match Namespace::new(label.as_str()) {
                Ok(namespace) => {
                    namespaces.insert(namespace);
                }
                Err(e) => warn!(label = %label, error = %e, "ignoring unusable registered namespace"),
            }
        }

        let mut removed = 0;
        for namespace in namespaces {
            removed += self.try_invalidate_namespace(&namespace).await?;
        }
        info!(removed, "all cache namespaces invalidated");
        Ok(removed)
    }

    // == Introspection ==
    /// Full keys matching `pattern`, sorted, at most `MAX_LISTED_KEYS`.
    pub async fn list_keys(&self, pattern: &str) -> Result<Vec<String>> {
        validate_pattern(pattern)?;
        let mut keys = self
            .run(self.store.scan(pattern, Some(MAX_LISTED_KEYS)))
            .await?;
        keys.sort();
        Ok(keys)
    }

    /// TTL, type and size of one full key.
    pub async fn key_info(&self, full_key: &str) -> Result<KeyInfo> {
        if full_key.is_empty() {
            return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
        }
        self.run(self.store.key_info(full_key))
            .await?
            .ok_or_else(|| CacheError::NotFound(full_key.to_string()))
    }

    /// Liveness of the backing store.
    pub async fn ping(&self) -> bool {
        match self.run(self.store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(backend = self.backend(), error = %e, "cache ping failed");
                false
            }
        }
    }

    pub async fn stats(&self) -> Result<CacheReport> {
        let info = self.run(self.store.info()).await?;
        Ok(CacheReport::new(self.backend(), self.stats.snapshot(), info))
    }

    // == Internals ==
    async fn run<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }

    fn effective_ttl(&self, ttl: Option<Duration>) -> Option<Duration> {
        ttl.or(self.default_ttl)
    }

    /// Records `namespace` in the store's registry the first time it is written.
    async fn remember(&self, namespace: &Namespace) {
        let known = self.registry().contains(namespace);
        if known {
            return;
        }
        match self
            .run(self.store.register_namespace(namespace.as_str()))
            .await
        {
            Ok(()) => {
                self.registry().insert(namespace.clone());
            }
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "namespace registration failed");
            }
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, BTreeSet<Namespace>> {
        // The set is always left consistent, so a poisoned lock is still usable
        self.namespaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Serializes a value, rejecting payloads the store would refuse.
fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let raw = serde_json::to_string(value)?;
    if raw.len() > MAX_VALUE_SIZE {
        return Err(CacheError::Serialization(format!(
            "Encoded value of {} bytes exceeds maximum of {} bytes",
            raw.len(),
            MAX_VALUE_SIZE
        )));
    }
    Ok(raw)
}

fn full_key(key: &str, namespace: &Namespace) -> Result<String> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(namespace.key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::store::{MemoryStore, StoreInfo};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FileMeta {
        id: u64,
        name: String,
        size: u64,
    }

    fn meta(id: u64) -> FileMeta {
        FileMeta {
            id,
            name: format!("file-{}.png", id),
            size: id * 100,
        }
    }

    fn manager() -> CacheManager {
        CacheManager::new(Arc::new(MemoryStore::new(1000)))
    }

    /// Store whose every operation fails, as if the server were down.
    struct DownStore;

    #[async_trait]
    impl KvStore for DownStore {
        fn name(&self) -> &'static str {
            "down"
        }
        async fn get(&self, _: &str) -> Result<Option<String>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _: &str, _: String, _: Option<Duration>) -> Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set_many(&self, _: Vec<RawItem>) -> Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &[String]) -> Result<u64> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn scan(&self, _: &str, _: Option<usize>) -> Result<Vec<String>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn key_info(&self, _: &str) -> Result<Option<KeyInfo>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn info(&self) -> Result<StoreInfo> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn register_namespace(&self, _: &str) -> Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn namespaces(&self) -> Result<Vec<String>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    /// Store that never answers within the timeout.
    struct HangingStore;

    #[async_trait]
    impl KvStore for HangingStore {
        fn name(&self) -> &'static str {
            "hanging"
        }
        async fn get(&self, _: &str) -> Result<Option<String>> {
            std::future::pending().await
        }
        async fn set(&self, _: &str, _: String, _: Option<Duration>) -> Result<()> {
            std::future::pending().await
        }
        async fn set_many(&self, _: Vec<RawItem>) -> Result<()> {
            std::future::pending().await
        }
        async fn delete(&self, _: &[String]) -> Result<u64> {
            std::future::pending().await
        }
        async fn scan(&self, _: &str, _: Option<usize>) -> Result<Vec<String>> {
            std::future::pending().await
        }
        async fn key_info(&self, _: &str) -> Result<Option<KeyInfo>> {
            std::future::pending().await
        }
        async fn ping(&self) -> Result<()> {
            std::future::pending().await
        }
        async fn info(&self) -> Result<StoreInfo> {
            std::future::pending().await
        }
        async fn register_namespace(&self, _: &str) -> Result<()> {
            std::future::pending().await
        }
        async fn namespaces(&self) -> Result<Vec<String>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let cache = manager();
        cache
            .set("storage-item-1", &meta(1), None, &Namespace::STORAGE)
            .await;

        let cached: Option<FileMeta> = cache.get("storage-item-1", &Namespace::STORAGE).await;
        assert_eq!(cached, Some(meta(1)));
    }

    #[tokio::test]
    async fn test_same_key_in_different_namespaces_does_not_collide() {
        let cache = manager();
        cache.set("k", &1u32, None, &Namespace::STORAGE).await;
        cache.set("k", &2u32, None, &Namespace::SETTINGS).await;

        assert_eq!(cache.get::<u32>("k", &Namespace::STORAGE).await, Some(1));
        assert_eq!(cache.get::<u32>("k", &Namespace::SETTINGS).await, Some(2));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_miss() {
        let cache = manager();
        cache.set("k", &"not a struct", None, &Namespace::DEFAULT).await;

        let cached: Option<FileMeta> = cache.get("k", &Namespace::DEFAULT).await;
        assert!(cached.is_none());
        assert_eq!(cache.counters().errors, 1);
        assert!(matches!(
            cache.try_get::<FileMeta>("k", &Namespace::DEFAULT).await,
            Err(CacheError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_key_existed() {
        let cache = manager();
        cache.set("k", &1u32, None, &Namespace::DEFAULT).await;

        assert!(cache.delete("k", &Namespace::DEFAULT).await);
        assert!(!cache.delete("k", &Namespace::DEFAULT).await);
        assert_eq!(cache.get::<u32>("k", &Namespace::DEFAULT).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_namespace_leaves_others_intact() {
        let cache = manager();
        for id in 1..=3 {
            cache
                .set(&format!("storage-item-{}", id), &meta(id), None, &Namespace::STORAGE)
                .await;
        }
        cache
            .set("public-system-settings", &true, None, &Namespace::SETTINGS)
            .await;

        assert_eq!(cache.invalidate_namespace(&Namespace::STORAGE).await, 3);
        assert!(cache
            .get::<FileMeta>("storage-item-2", &Namespace::STORAGE)
            .await
            .is_none());
        assert_eq!(
            cache
                .get::<bool>("public-system-settings", &Namespace::SETTINGS)
                .await,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_invalidate_all_covers_runtime_namespaces() {
        let cache = manager();
        let reports = Namespace::new("reports").unwrap();
        cache.set("daily", &1u32, None, &reports).await;
        cache.set("k", &1u32, None, &Namespace::MESSAGES).await;

        assert!(cache.known_namespaces().contains(&reports));
        assert_eq!(cache.invalidate_all().await.unwrap(), 2);
        assert!(cache.get::<u32>("daily", &reports).await.is_none());
        assert!(cache.list_keys("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_all_covers_namespaces_from_other_managers() {
        let store = MemoryStore::new(1000);
        let writer = CacheManager::new(Arc::new(store.clone()));
        let reports = Namespace::new("reports").unwrap();
        writer.set("daily", &1u32, None, &reports).await;
        writer
            .mset(vec![CacheItem::new("weekly", 2u32, None, Namespace::new("digests").unwrap())])
            .await;

        // A fresh manager, as after a restart or on another replica
        let admin = CacheManager::new(Arc::new(store));
        assert!(!admin.known_namespaces().contains(&reports));
        assert_eq!(admin.invalidate_all().await.unwrap(), 2);
        assert!(writer.get::<u32>("daily", &reports).await.is_none());
        assert!(admin.list_keys("*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mset_writes_every_item() {
        let cache = manager();
        let items = (1..=5)
            .map(|id| {
                CacheItem::new(
                    format!("storage-item-{}", id),
                    meta(id),
                    Some(Duration::from_secs(600)),
                    Namespace::STORAGE,
                )
            })
            .collect();
        cache.mset(items).await;

        for id in 1..=5 {
            let cached: Option<FileMeta> = cache
                .get(&format!("storage-item-{}", id), &Namespace::STORAGE)
                .await;
            assert_eq!(cached, Some(meta(id)));
        }
        assert_eq!(cache.counters().writes, 5);
    }

    #[tokio::test]
    async fn test_mset_skips_invalid_items() {
        let cache = manager();
        cache
            .mset(vec![
                CacheItem::new("", 1u32, None, Namespace::DEFAULT),
                CacheItem::new("ok", 2u32, None, Namespace::DEFAULT),
            ])
            .await;

        assert_eq!(cache.get::<u32>("ok", &Namespace::DEFAULT).await, Some(2));
        assert_eq!(cache.counters().errors, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache = manager();
        cache
            .set("k", &1u32, Some(Duration::from_millis(30)), &Namespace::DEFAULT)
            .await;
        assert_eq!(cache.get::<u32>("k", &Namespace::DEFAULT).await, Some(1));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get::<u32>("k", &Namespace::DEFAULT).await, None);
    }

    #[tokio::test]
    async fn test_default_ttl_applies_when_none_given() {
        let cache = manager().with_default_ttl(Some(Duration::from_secs(60)));
        cache.set("k", &1u32, None, &Namespace::DEFAULT).await;

        let info = cache.key_info("default:k").await.unwrap();
        let ttl = info.ttl_ms.expect("default TTL should be applied");
        assert!(ttl <= 60_000 && ttl > 50_000);

        let forever = manager().with_default_ttl(None);
        forever.set("k", &1u32, None, &Namespace::DEFAULT).await;
        assert_eq!(forever.key_info("default:k").await.unwrap().ttl_ms, None);
    }

    #[tokio::test]
    async fn test_read_through_computes_once_then_hits() {
        let cache = manager();
        let computed = AtomicUsize::new(0);

        for expected_from_cache in [false, true, true] {
            let fetched = cache
                .read_through("storage-stats-u1", &Namespace::STORAGE, None, || async {
                    computed.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, CacheError>(meta(9))
                })
                .await
                .unwrap();
            assert_eq!(fetched.value, meta(9));
            assert_eq!(fetched.from_cache, expected_from_cache);
        }
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_does_not_cache_failures() {
        let cache = manager();
        let result: std::result::Result<Fetched<FileMeta>, CacheError> = cache
            .read_through("missing", &Namespace::STORAGE, None, || async {
                Err(CacheError::NotFound("missing".into()))
            })
            .await;

        assert!(matches!(result, Err(CacheError::NotFound(_))));
        assert!(cache.list_keys("STORAGE:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_and_key_info() {
        let cache = manager();
        cache.set("b", &1u32, None, &Namespace::STORAGE).await;
        cache.set("a", &1u32, None, &Namespace::STORAGE).await;
        cache.set("a", &1u32, None, &Namespace::SETTINGS).await;

        let keys = cache.list_keys("STORAGE:*").await.unwrap();
        assert_eq!(keys, vec!["STORAGE:a", "STORAGE:b"]);

        let info = cache.key_info("STORAGE:a").await.unwrap();
        assert_eq!(info.kind, "string");
        assert!(matches!(
            cache.key_info("STORAGE:zzz").await,
            Err(CacheError::NotFound(_))
        ));
        assert!(matches!(
            cache.list_keys("[oops").await,
            Err(CacheError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_keys_degrade_on_hot_path() {
        let cache = manager();
        let too_long = "x".repeat(MAX_KEY_LENGTH + 1);

        cache.set(&too_long, &1u32, None, &Namespace::DEFAULT).await;
        assert_eq!(cache.get::<u32>(&too_long, &Namespace::DEFAULT).await, None);
        assert!(matches!(
            cache.try_set("", &1u32, None, &Namespace::DEFAULT).await,
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_oversized_value_is_dropped() {
        let cache = manager();
        let huge = "x".repeat(MAX_VALUE_SIZE + 1);

        cache.set("big", &huge, None, &Namespace::DEFAULT).await;
        assert_eq!(cache.get::<String>("big", &Namespace::DEFAULT).await, None);
        assert!(matches!(
            cache.try_set("big", &huge, None, &Namespace::DEFAULT).await,
            Err(CacheError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_store_down_degrades_reads_and_writes() {
        let cache = CacheManager::new(Arc::new(DownStore));

        cache.set("k", &1u32, None, &Namespace::DEFAULT).await;
        cache
            .mset(vec![CacheItem::new("k", 1u32, None, Namespace::DEFAULT)])
            .await;
        assert_eq!(cache.get::<u32>("k", &Namespace::DEFAULT).await, None);
        assert!(!cache.delete("k", &Namespace::DEFAULT).await);
        assert_eq!(cache.invalidate_namespace(&Namespace::DEFAULT).await, 0);

        let counters = cache.counters();
        assert_eq!(counters.misses, 1);
        assert_eq!(counters.errors, 5);
    }

    #[tokio::test]
    async fn test_store_down_surfaces_admin_failures() {
        let cache = CacheManager::new(Arc::new(DownStore));

        assert!(!cache.ping().await);
        assert!(cache.stats().await.is_err());
        assert!(cache.list_keys("*").await.is_err());
        assert!(cache.key_info("default:k").await.is_err());
        assert!(cache.invalidate_all().await.is_err());
        assert!(cache.delete_raw("default:k").await.is_err());
    }

    #[tokio::test]
    async fn test_timeout_is_a_store_failure() {
        let cache = CacheManager::new(Arc::new(HangingStore))
            .with_op_timeout(Duration::from_millis(20));

        assert_eq!(cache.get::<u32>("k", &Namespace::DEFAULT).await, None);
        assert!(!cache.ping().await);
        assert!(matches!(
            cache.stats().await,
            Err(CacheError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_report() {
        let cache = manager();
        cache.set("k", &1u32, None, &Namespace::DEFAULT).await;
        cache.get::<u32>("k", &Namespace::DEFAULT).await;
        cache.get::<u32>("missing", &Namespace::DEFAULT).await;

        let report = cache.stats().await.unwrap();
        assert_eq!(report.backend, "memory");
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 1);
        assert_eq!(report.key_count, 1);
        assert_eq!(report.hit_rate, 0.5);
        assert!(cache.ping().await);
    }
}
