//! API Handlers
//!
//! Shared application state, the health check and request helpers used by
//! the admin, content and storage handlers.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};

use crate::cache::CacheManager;
use crate::db::Database;
use crate::error::{CacheError, Result};
use crate::models::HealthResponse;
use crate::store::MemoryStore;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Cache scope used for requests without a user.
pub const GUEST_USER: &str = "guest";

/// Longest accepted `x-user-id`, keeping per-user cache keys within bounds.
pub const MAX_USER_ID_LENGTH: usize = 128;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub db: Database,
}

impl AppState {
    pub fn new(cache: Arc<CacheManager>, db: Database) -> Self {
        Self { cache, db }
    }

    /// State backed by a fresh in-process store and an empty database.
    pub fn in_memory(max_entries: usize) -> Self {
        let store = Arc::new(MemoryStore::new(max_entries));
        Self::new(Arc::new(CacheManager::new(store)), Database::new())
    }
}

/// The caller identified by `x-user-id`, `None` for anonymous requests.
///
/// Anonymous callers share the `guest` cache scope, so no signed-in user
/// may take that id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser(pub Option<String>);

impl CurrentUser {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let Some(raw) = headers.get(USER_ID_HEADER) else {
            return Ok(Self(None));
        };
        let id = raw
            .to_str()
            .map_err(|_| CacheError::InvalidRequest("User id must be visible ASCII".to_string()))?
            .trim();

        if id.is_empty() {
            return Ok(Self(None));
        }
        if id == GUEST_USER {
            return Err(CacheError::InvalidRequest(format!(
                "User id '{}' is reserved",
                GUEST_USER
            )));
        }
        if id.len() > MAX_USER_ID_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "User id exceeds maximum length of {} bytes",
                MAX_USER_ID_LENGTH
            )));
        }
        Ok(Self(Some(id.to_string())))
    }

    /// Owner id for source-of-truth queries.
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Suffix for per-user cache keys.
    pub fn cache_scope(&self) -> &str {
        self.id().unwrap_or(GUEST_USER)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = CacheError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Self::from_headers(&parts.headers)
    }
}

/// Handler for GET /health
///
/// Always 200; a failed ping only downgrades the status.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = state.cache.ping().await;
    Json(HealthResponse::new(reachable, state.cache.backend()))
}
