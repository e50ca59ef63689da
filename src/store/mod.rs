//! Store Module
//!
//! Backing key-value stores the cache manager writes through to.
//! `RedisStore` talks to an external Redis server, `MemoryStore` keeps an
//! in-process keyspace with the same TTL and pattern semantics.

mod entry;
mod lru;
mod memory;
pub mod pattern;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::{BackendKind, Config};
use crate::error::Result;

pub use entry::StoredEntry;
pub use lru::LruTracker;
pub use memory::{Keyspace, MemoryStore};
pub use redis_store::RedisStore;

// == Public Constants ==
/// Maximum allowed full key length in bytes (namespace, separator and logical key)
pub const MAX_STORED_KEY_LENGTH: usize = 512;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// A serialized write destined for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub key: String,
    pub value: String,
    pub ttl: Option<Duration>,
}

/// Introspection data for a single stored key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub key: String,
    /// Store-reported type, e.g. "string"
    pub kind: String,
    /// Remaining time to live, `None` when the key never expires
    pub ttl_ms: Option<u64>,
    pub size_bytes: Option<u64>,
}

/// Store-wide usage figures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreInfo {
    pub key_count: u64,
    pub memory_usage_bytes: Option<u64>,
    pub evictions: Option<u64>,
    pub expired: Option<u64>,
}

// == Store Trait ==
/// Primitive operations every backing store provides.
///
/// Keys passed here are already namespaced. Expiry is the store's job.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for stats and logs.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one. `ttl = None` never expires.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// Writes several values in one round trip.
    async fn set_many(&self, items: Vec<RawItem>) -> Result<()>;

    /// Removes the given keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64>;

    /// Returns keys matching a Redis-style glob pattern, at most `limit` of them.
    async fn scan(&self, pattern: &str, limit: Option<usize>) -> Result<Vec<String>>;

    async fn key_info(&self, key: &str) -> Result<Option<KeyInfo>>;

    async fn ping(&self) -> Result<()>;

    async fn info(&self) -> Result<StoreInfo>;

    /// Adds a namespace label to the registry shared by every manager on this store.
    async fn register_namespace(&self, label: &str) -> Result<()>;

    /// All registered namespace labels.
    async fn namespaces(&self) -> Result<Vec<String>>;
}

/// The store selected by configuration.
#[derive(Clone)]
pub enum StoreHandle {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl StoreHandle {
    /// Type-erased handle for the cache manager.
    pub fn shared(&self) -> Arc<dyn KvStore> {
        match self {
            StoreHandle::Memory(store) => Arc::new(store.clone()),
            StoreHandle::Redis(store) => Arc::new(store.clone()),
        }
    }

    /// The in-process store, if that is the active backend.
    pub fn memory(&self) -> Option<&MemoryStore> {
        match self {
            StoreHandle::Memory(store) => Some(store),
            StoreHandle::Redis(_) => None,
        }
    }
}

/// Builds the backing store described by `config`.
///
/// For Redis this establishes the connection manager, so an unreachable
/// server fails startup rather than every later request.
pub async fn connect(config: &Config) -> Result<StoreHandle> {
    match config.backend {
        BackendKind::Memory => {
            info!(max_entries = config.max_entries, "Using in-process cache store");
            Ok(StoreHandle::Memory(MemoryStore::new(config.max_entries)))
        }
        BackendKind::Redis => {
            let store = RedisStore::connect(&config.redis_url).await?;
            info!("Connected to Redis cache store");
            Ok(StoreHandle::Redis(store))
        }
    }
}
