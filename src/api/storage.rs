//! Storage Handlers
//!
//! Per-user storage usage, file metadata and optimization suggestions.
//! Aggregates are cached per user under `STORAGE`; mutations drop the
//! affected user's views, bulk deletes drop the whole namespace.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::handlers::{AppState, CurrentUser};
use crate::cache::{CacheItem, Invalidation, Namespace};
use crate::db::{FileRecord, OptimizationReport, StorageStats};
use crate::error::{CacheError, Result};
use crate::models::{
    CachedResponse, DeleteFilesQuery, DeletedResponse, ItemsPage, NewFile, PageQuery,
};

pub const STATS_TTL: Duration = Duration::from_secs(5 * 60);
pub const ITEM_TTL: Duration = Duration::from_secs(10 * 60);
pub const OPTIMIZATION_TTL: Duration = Duration::from_secs(15 * 60);

pub fn stats_key(scope: &str) -> String {
    format!("storage-stats-{}", scope)
}

pub fn item_key(id: u64) -> String {
    format!("storage-item-{}", id)
}

pub fn optimization_key(scope: &str) -> String {
    format!("storage-optimization-{}", scope)
}

/// Views derived from one user's file list.
fn user_views(scope: &str) -> Vec<Invalidation> {
    vec![
        Invalidation::key(stats_key(scope), Namespace::STORAGE),
        Invalidation::key(optimization_key(scope), Namespace::STORAGE),
    ]
}

fn file_not_found(id: u64) -> CacheError {
    CacheError::NotFound(format!("File {} not found", id))
}

/// Handler for GET /storage/stats
pub async fn storage_stats_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Json<CachedResponse<StorageStats>> {
    let db = &state.db;
    let fetched = state
        .cache
        .read_through(
            &stats_key(user.cache_scope()),
            &Namespace::STORAGE,
            Some(STATS_TTL),
            || async {
                let files = db.files_for(user.id()).await;
                Ok::<_, Infallible>(StorageStats::compute(&files))
            },
        )
        .await;

    match fetched {
        Ok(fetched) => Json(fetched.into()),
        Err(never) => match never {},
    }
}

/// Handler for GET /storage/optimization
pub async fn optimization_handler(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Json<CachedResponse<OptimizationReport>> {
    let db = &state.db;
    let fetched = state
        .cache
        .read_through(
            &optimization_key(user.cache_scope()),
            &Namespace::STORAGE,
            Some(OPTIMIZATION_TTL),
            || async {
                let files = db.files_for(user.id()).await;
                Ok::<_, Infallible>(OptimizationReport::compute(&files))
            },
        )
        .await;

    match fetched {
        Ok(fetched) => Json(fetched.into()),
        Err(never) => match never {},
    }
}

/// Handler for GET /storage/items
///
/// Warms the per-item cache for every listed row in one batch.
pub async fn list_items_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Json<ItemsPage> {
    let (items, total) = state
        .db
        .list_files(user.id(), query.page, query.per_page)
        .await;

    let warm: Vec<CacheItem<&FileRecord>> = items
        .iter()
        .map(|item| CacheItem::new(item_key(item.id), item, Some(ITEM_TTL), Namespace::STORAGE))
        .collect();
    if !warm.is_empty() {
        state.cache.mset(warm).await;
    }

    Json(ItemsPage {
        items,
        page: query.page,
        per_page: query.per_page,
        total,
    })
}

/// Handler for GET /storage/items/:id
pub async fn get_item_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<CachedResponse<FileRecord>>> {
    let db = &state.db;
    let fetched = state
        .cache
        .read_through(&item_key(id), &Namespace::STORAGE, Some(ITEM_TTL), || async {
            db.file(id).await.ok_or_else(|| file_not_found(id))
        })
        .await?;

    if fetched.value.owner_id.as_deref() != user.id() {
        return Err(file_not_found(id));
    }
    Ok(Json(fetched.into()))
}

/// Handler for POST /storage/items
pub async fn create_item_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(file): Json<NewFile>,
) -> Result<(StatusCode, Json<FileRecord>)> {
    if let Some(error_msg) = file.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let limit = state.db.upload_limit_bytes().await;
    if file.size_bytes > limit {
        return Err(CacheError::InvalidRequest(format!(
            "File size {} exceeds the upload limit of {} bytes",
            file.size_bytes, limit
        )));
    }

    let record = state
        .cache
        .with_invalidation(&user_views(user.cache_scope()), async {
            Ok::<_, CacheError>(state.db.insert_file(user.id(), file).await)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Handler for POST /storage/items/:id/optimize
pub async fn optimize_item_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<u64>,
) -> Result<Json<FileRecord>> {
    let owned = state
        .db
        .file(id)
        .await
        .is_some_and(|file| file.owner_id.as_deref() == user.id());
    if !owned {
        return Err(file_not_found(id));
    }

    let mut targets = user_views(user.cache_scope());
    targets.push(Invalidation::key(item_key(id), Namespace::STORAGE));

    let record = state
        .cache
        .with_invalidation(&targets, state.db.optimize_file(id))
        .await?;

    Ok(Json(record))
}

/// Handler for DELETE /storage/items
///
/// Removes the listed ids, or every file of the caller without `?ids=`.
pub async fn delete_items_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DeleteFilesQuery>,
) -> Result<Json<DeletedResponse>> {
    let ids = query.parse_ids().map_err(CacheError::InvalidRequest)?;

    let deleted = state
        .cache
        .with_invalidation(&[Invalidation::namespace(Namespace::STORAGE)], async {
            Ok::<_, CacheError>(state.db.delete_files(user.id(), ids.as_deref()).await)
        })
        .await?;

    Ok(Json(DeletedResponse { deleted }))
}
