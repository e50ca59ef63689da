//! Redis-backed store.
//!
//! Uses a `ConnectionManager`, which multiplexes commands over one
//! connection and reconnects on its own after network failures.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::debug;

use super::{KeyInfo, KvStore, RawItem, StoreInfo};
use crate::error::{CacheError, Result};

/// Keys requested per SCAN round trip.
const SCAN_BATCH: usize = 500;

/// Keys removed per DEL command during bulk invalidation.
const DELETE_CHUNK: usize = 500;

/// SET of namespace labels written by any manager on this server.
///
/// `#` is not a valid namespace character and the key has no separator,
/// so no `<ns>:*` pattern can match it.
pub const NAMESPACE_REGISTRY_KEY: &str = "#cache-namespaces";

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("invalid Redis URL: {e}")))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

/// Redis rejects `PX 0`, so sub-millisecond TTLs round up.
fn px(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

/// Reads an unsigned numeric field from `INFO` output.
fn info_field(info: &str, field: &str) -> Option<u64> {
    info.lines().find_map(|line| {
        let (name, value) = line.trim().split_once(':')?;
        if name == field {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

#[async_trait]
impl KvStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(px(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn set_many(&self, items: Vec<RawItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for item in &items {
            pipe.cmd("SET").arg(&item.key).arg(&item.value);
            if let Some(ttl) = item.ttl {
                pipe.arg("PX").arg(px(ttl));
            }
            pipe.ignore();
        }
        let _: () = pipe.query_async(&mut conn).await?;
        debug!(count = items.len(), "pipelined SET batch");
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        let mut conn = self.conn.clone();
        let mut removed = 0u64;
        for chunk in keys.chunks(DELETE_CHUNK) {
            let count: u64 = redis::cmd("DEL").arg(chunk).query_async(&mut conn).await?;
            removed += count;
        }
        Ok(removed)
    }

    async fn scan(&self, pattern: &str, limit: Option<usize>) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        // SCAN may return a key more than once across iterations
        let mut keys = BTreeSet::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch.into_iter().filter(|key| key != NAMESPACE_REGISTRY_KEY));

            if next == 0 || limit.is_some_and(|limit| keys.len() >= limit) {
                break;
            }
            cursor = next;
        }

        let keys = keys.into_iter();
        Ok(match limit {
            Some(limit) => keys.take(limit).collect(),
            None => keys.collect(),
        })
    }

    async fn key_info(&self, key: &str) -> Result<Option<KeyInfo>> {
        let mut conn = self.conn.clone();

        let kind: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        if kind == "none" {
            return Ok(None);
        }

        // -2: key vanished in between, -1: no expiry
        let pttl: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        if pttl == -2 {
            return Ok(None);
        }

        // MEMORY USAGE is missing on some Redis-compatible servers
        let size_bytes: Option<u64> = redis::cmd("MEMORY")
            .arg("USAGE")
            .arg(key)
            .query_async(&mut conn)
            .await
            .unwrap_or(None);

        Ok(Some(KeyInfo {
            key: key.to_string(),
            kind,
            ttl_ms: u64::try_from(pttl).ok(),
            size_bytes,
        }))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let mut conn = self.conn.clone();
        let key_count: u64 = redis::cmd("DBSIZE").query_async(&mut conn).await?;
        let info: String = redis::cmd("INFO").query_async(&mut conn).await?;

        Ok(StoreInfo {
            key_count,
            memory_usage_bytes: info_field(&info, "used_memory"),
            evictions: info_field(&info, "evicted_keys"),
            expired: info_field(&info, "expired_keys"),
        })
    }

    async fn register_namespace(&self, label: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: u64 = redis::cmd("SADD")
            .arg(NAMESPACE_REGISTRY_KEY)
            .arg(label)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let labels: Vec<String> = redis::cmd("SMEMBERS")
            .arg(NAMESPACE_REGISTRY_KEY)
            .query_async(&mut conn)
            .await?;
        Ok(labels)
    }
}
