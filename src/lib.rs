//! FileHost Cache - namespaced cache layer for a file-hosting service
//!
//! Read-through JSON caching over Redis or an in-process store, with
//! namespace invalidation, batch writes and an admin HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheManager, Invalidation, Namespace};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
