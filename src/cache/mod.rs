//! Cache Module
//!
//! Namespaced read-through cache over a backing `KvStore`, with TTL,
//! namespace-wide invalidation, batch writes and admin introspection.

mod invalidation;
mod manager;
mod namespace;
mod stats;


// Re-export public types
pub use invalidation::Invalidation;
pub use manager::{CacheItem, CacheManager, Fetched, DEFAULT_OP_TIMEOUT, DEFAULT_TTL};
pub use namespace::Namespace;
pub use stats::{CacheReport, CacheStats, StatsSnapshot};

// == Public Constants ==
/// Maximum allowed logical key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum number of keys returned by one `list_keys` call
pub const MAX_LISTED_KEYS: usize = 1000;
