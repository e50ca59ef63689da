//! Cache Statistics Module
//!
//! Tracks hit, miss, error, write and delete counts for one cache manager.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::store::StoreInfo;

// == Cache Stats ==
/// Lock-free counters updated from concurrent request handlers.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Store failures and undecodable payloads.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_writes(&self, count: u64) {
        self.writes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub writes: u64,
    pub deletes: u64,
}

impl StatsSnapshot {
    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Cache Report ==
/// Health and usage figures for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub backend: &'static str,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub writes: u64,
    pub deletes: u64,
    pub hit_rate: f64,
    pub key_count: u64,
    pub memory_usage_bytes: Option<u64>,
    pub evictions: Option<u64>,
    pub expired: Option<u64>,
}

impl CacheReport {
    pub fn new(backend: &'static str, counters: StatsSnapshot, store: StoreInfo) -> Self {
        Self {
            backend,
            hits: counters.hits,
            misses: counters.misses,
            errors: counters.errors,
            writes: counters.writes,
            deletes: counters.deletes,
            hit_rate: counters.hit_rate(),
            key_count: store.key_count,
            memory_usage_bytes: store.memory_usage_bytes,
            evictions: store.evictions,
            expired: store.expired,
        }
    }
}
