//! Stored Entry Module
//!
//! A serialized value held by the in-process store, with its expiry deadline.

use std::time::{Duration, Instant};

// == Stored Entry ==
/// One value in the in-process keyspace.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Serialized payload
    pub value: String,
    /// Expiry deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl StoredEntry {
    /// Creates an entry that expires `ttl` from now, or never when `ttl` is None.
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    /// An entry is expired once its deadline has been reached.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Remaining lifetime in milliseconds; `Some(0)` once expired, None if it never expires.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at.map(|deadline| {
            deadline
                .saturating_duration_since(Instant::now())
                .as_millis() as u64
        })
    }

    /// Bytes accounted against store memory usage for this entry under `key`.
    pub fn footprint(&self, key: &str) -> usize {
        key.len() + self.value.len()
    }
}
