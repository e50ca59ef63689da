//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::{CacheReport, Fetched};
use crate::db::{FileRecord, SystemMessage};

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" when the cache answers a ping, "degraded" otherwise
    pub status: String,
    /// Active cache backend
    pub cache: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn new(cache_reachable: bool, backend: &str) -> Self {
        let status = if cache_reachable { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            cache: backend.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A consumer payload tagged with whether it was served from cache.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedResponse<T> {
    #[serde(flatten)]
    pub data: T,
    pub from_cache: bool,
}

impl<T> From<Fetched<T>> for CachedResponse<T> {
    fn from(fetched: Fetched<T>) -> Self {
        Self {
            data: fetched.value,
            from_cache: fetched.from_cache,
        }
    }
}

/// Response body for GET /admin/cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub healthy: bool,
    #[serde(flatten)]
    pub report: CacheReport,
}

/// Response body for GET /admin/cache/keys
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysResponse {
    pub pattern: String,
    pub count: usize,
    pub keys: Vec<String>,
}

impl CacheKeysResponse {
    pub fn new(pattern: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            pattern: pattern.into(),
            count: keys.len(),
            keys,
        }
    }
}

/// Response body for DELETE /admin/cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub message: String,
    pub removed: u64,
}

impl ClearCacheResponse {
    pub fn new(message: impl Into<String>, removed: u64) -> Self {
        Self {
            message: message.into(),
            removed,
        }
    }
}

/// Cached body of GET /public/messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesPayload {
    pub messages: Vec<SystemMessage>,
}

/// Response body for GET /storage/items
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsPage {
    pub items: Vec<FileRecord>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

/// Response body for DELETE endpoints that remove records
#[derive(Debug, Clone, Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}
