//! API Module
//!
//! HTTP handlers and routing.
//!
//! # Endpoints
//! - `GET /health` - Liveness, with cache reachability
//! - `/admin/cache/*` - Cache stats, key listing, key info and clearing
//! - `/public/*`, `/admin/settings`, `/admin/messages` - Cached site content
//! - `/storage/*` - Per-user storage stats, files and optimization

pub mod admin;
pub mod content;
pub mod handlers;
pub mod routes;
pub mod storage;

pub use handlers::{AppState, CurrentUser, GUEST_USER, USER_ID_HEADER};
pub use routes::create_router;
