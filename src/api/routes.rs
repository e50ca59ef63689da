//! API Routes
//!
//! Configures the Axum router with every endpoint.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::admin::{
    cache_stats_handler, clear_cache_handler, key_info_handler, list_keys_handler,
};
use super::content::{
    create_message_handler, delete_message_handler, public_messages_handler,
    public_settings_handler, update_message_handler, update_settings_handler,
};
use super::handlers::{health_handler, AppState};
use super::storage::{
    create_item_handler, delete_items_handler, get_item_handler, list_items_handler,
    optimization_handler, optimize_item_handler, storage_stats_handler,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/cache", delete(clear_cache_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/keys", get(list_keys_handler))
        .route("/cache/keys/:key", get(key_info_handler))
        .route("/settings", put(update_settings_handler))
        .route("/messages", post(create_message_handler))
        .route(
            "/messages/:id",
            put(update_message_handler).delete(delete_message_handler),
        );

    let public = Router::new()
        .route("/settings", get(public_settings_handler))
        .route("/messages", get(public_messages_handler));

    let storage = Router::new()
        .route("/stats", get(storage_stats_handler))
        .route("/optimization", get(optimization_handler))
        .route(
            "/items",
            get(list_items_handler)
                .post(create_item_handler)
                .delete(delete_items_handler),
        )
        .route("/items/:id", get(get_item_handler))
        .route("/items/:id/optimize", post(optimize_item_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/admin", admin)
        .nest("/public", public)
        .nest("/storage", storage)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::in_memory(100))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/health").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_admin_stats_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/admin/cache/stats").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_unknown_key_info_is_404() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/admin/cache/keys/STORAGE:nope").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_public_settings_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/public/settings").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_missing_item_is_404() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/storage/items/42").await,
            StatusCode::NOT_FOUND
        );
    }
}
