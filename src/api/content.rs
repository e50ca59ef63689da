//! Public Content Handlers
//!
//! System settings and banner messages: read-through cached for the
//! public pages, invalidated by the admin mutations.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::handlers::AppState;
use crate::cache::{Invalidation, Namespace};
use crate::db::{SystemMessage, SystemSettings};
use crate::error::{CacheError, Result};
use crate::models::{CachedResponse, MessageUpdate, MessagesPayload, NewMessage, SettingsUpdate};

pub const SETTINGS_KEY: &str = "public-system-settings";
pub const SETTINGS_TTL: Duration = Duration::from_secs(10 * 60);

pub const MESSAGES_KEY: &str = "public-system-messages";
pub const MESSAGES_TTL: Duration = Duration::from_secs(5 * 60);

fn settings_changed() -> [Invalidation; 1] {
    [Invalidation::key(SETTINGS_KEY, Namespace::SETTINGS)]
}

fn messages_changed() -> [Invalidation; 1] {
    [Invalidation::key(MESSAGES_KEY, Namespace::MESSAGES)]
}

// == Settings ==
/// Handler for GET /public/settings
pub async fn public_settings_handler(
    State(state): State<AppState>,
) -> Json<CachedResponse<SystemSettings>> {
    let db = &state.db;
    let fetched = state
        .cache
        .read_through(SETTINGS_KEY, &Namespace::SETTINGS, Some(SETTINGS_TTL), || async {
            Ok::<_, Infallible>(db.settings().await)
        })
        .await;

    match fetched {
        Ok(fetched) => Json(fetched.into()),
        Err(never) => match never {},
    }
}

/// Handler for PUT /admin/settings
pub async fn update_settings_handler(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SystemSettings>> {
    if let Some(error_msg) = update.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let settings = state
        .cache
        .with_invalidation(&settings_changed(), async {
            Ok::<_, CacheError>(state.db.update_settings(update).await)
        })
        .await?;

    Ok(Json(settings))
}

// == Messages ==
/// Handler for GET /public/messages
pub async fn public_messages_handler(
    State(state): State<AppState>,
) -> Json<CachedResponse<MessagesPayload>> {
    let db = &state.db;
    let fetched = state
        .cache
        .read_through(MESSAGES_KEY, &Namespace::MESSAGES, Some(MESSAGES_TTL), || async {
            Ok::<_, Infallible>(MessagesPayload {
                messages: db.active_messages().await,
            })
        })
        .await;

    match fetched {
        Ok(fetched) => Json(fetched.into()),
        Err(never) => match never {},
    }
}

/// Handler for POST /admin/messages
pub async fn create_message_handler(
    State(state): State<AppState>,
    Json(message): Json<NewMessage>,
) -> Result<(StatusCode, Json<SystemMessage>)> {
    if let Some(error_msg) = message.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let created = state
        .cache
        .with_invalidation(&messages_changed(), async {
            Ok::<_, CacheError>(state.db.create_message(message).await)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for PUT /admin/messages/:id
pub async fn update_message_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<MessageUpdate>,
) -> Result<Json<SystemMessage>> {
    let updated = state
        .cache
        .with_invalidation(&messages_changed(), state.db.update_message(id, update))
        .await?;

    Ok(Json(updated))
}

/// Handler for DELETE /admin/messages/:id
pub async fn delete_message_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state
        .cache
        .with_invalidation(&messages_changed(), state.db.delete_message(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
