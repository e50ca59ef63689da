//! Admin Cache Handlers
//!
//! Introspection and manual invalidation for operators. Unlike the
//! consumer endpoints these surface store failures, each with its own
//! generic message.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use super::handlers::AppState;
use crate::cache::Namespace;
use crate::error::{AdminError, CacheError};
use crate::models::{
    CacheKeysResponse, CacheStatsResponse, ClearCacheQuery, ClearCacheResponse, KeysQuery,
};
use crate::store::KeyInfo;

type AdminResult<T> = std::result::Result<Json<T>, AdminError>;

/// Handler for GET /admin/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> AdminResult<CacheStatsResponse> {
    const MESSAGE: &str = "Cache unhealthy";

    let report = state
        .cache
        .stats()
        .await
        .map_err(|e| AdminError::new(MESSAGE, e))?;
    let healthy = state.cache.ping().await;

    Ok(Json(CacheStatsResponse { healthy, report }))
}

/// Handler for GET /admin/cache/keys
pub async fn list_keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> AdminResult<CacheKeysResponse> {
    let pattern = query.pattern.unwrap_or_else(|| "*".to_string());
    let keys = state
        .cache
        .list_keys(&pattern)
        .await
        .map_err(|e| AdminError::new("Failed to fetch cache keys", e))?;

    Ok(Json(CacheKeysResponse::new(pattern, keys)))
}

/// Handler for GET /admin/cache/keys/:key
pub async fn key_info_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AdminResult<KeyInfo> {
    let info = state
        .cache
        .key_info(&key)
        .await
        .map_err(|e| AdminError::new("Failed to fetch key info", e))?;

    Ok(Json(info))
}

/// Handler for DELETE /admin/cache
///
/// `?key=` removes one full key, `?namespace=` one namespace, and no
/// parameter clears every known namespace.
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> AdminResult<ClearCacheResponse> {
    const MESSAGE: &str = "Failed to clear cache";

    if let Some(key) = query.key {
        let removed = state
            .cache
            .delete_raw(&key)
            .await
            .map_err(|e| AdminError::new(MESSAGE, e))?;
        if !removed {
            return Err(AdminError::new(MESSAGE, CacheError::NotFound(key)));
        }
        info!(key = %key, "cache key cleared by admin");
        return Ok(Json(ClearCacheResponse::new(
            format!("Cache key '{}' cleared", key),
            1,
        )));
    }

    if let Some(label) = query.namespace {
        let namespace = Namespace::new(label)
            .map_err(|e| AdminError::new(MESSAGE, CacheError::InvalidRequest(e.to_string())))?;
        let removed = state
            .cache
            .try_invalidate_namespace(&namespace)
            .await
            .map_err(|e| AdminError::new(MESSAGE, e))?;
        info!(namespace = %namespace, removed, "cache namespace cleared by admin");
        return Ok(Json(ClearCacheResponse::new(
            format!("Cache namespace '{}' cleared", namespace),
            removed,
        )));
    }

    let removed = state
        .cache
        .invalidate_all()
        .await
        .map_err(|e| AdminError::new(MESSAGE, e))?;
    Ok(Json(ClearCacheResponse::new("All cache cleared", removed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clear_single_key() {
        let state = AppState::in_memory(100);
        state
            .cache
            .set("public-system-settings", &1u32, None, &Namespace::SETTINGS)
            .await;

        let query = ClearCacheQuery {
            key: Some("settings:public-system-settings".to_string()),
            namespace: None,
        };
        let response = clear_cache_handler(State(state.clone()), Query(query))
            .await
            .unwrap();
        assert_eq!(response.removed, 1);

        let query = ClearCacheQuery {
            key: Some("settings:public-system-settings".to_string()),
            namespace: None,
        };
        let result = clear_cache_handler(State(state), Query(query)).await;
        assert!(matches!(
            result,
            Err(AdminError {
                source: CacheError::NotFound(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_clear_rejects_bad_namespace() {
        let state = AppState::in_memory(100);
        let query = ClearCacheQuery {
            key: None,
            namespace: Some("bad:ns".to_string()),
        };
        let result = clear_cache_handler(State(state), Query(query)).await;
        assert!(matches!(
            result,
            Err(AdminError {
                source: CacheError::InvalidRequest(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_list_keys_defaults_to_everything() {
        let state = AppState::in_memory(100);
        state.cache.set("a", &1u32, None, &Namespace::STORAGE).await;
        state.cache.set("b", &1u32, None, &Namespace::MESSAGES).await;

        let response = list_keys_handler(State(state), Query(KeysQuery::default()))
            .await
            .unwrap();
        assert_eq!(response.pattern, "*");
        assert_eq!(response.count, 2);
    }

    #[tokio::test]
    async fn test_cache_stats_reports_healthy() {
        let state = AppState::in_memory(100);
        let response = cache_stats_handler(State(state)).await.unwrap();
        assert!(response.healthy);
        assert_eq!(response.report.backend, "memory");
    }
}
