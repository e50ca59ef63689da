//! Source-of-truth repository.
//!
//! An in-process stand-in for the relational database the cache fronts.
//! Every read bumps a query counter so callers can tell a recomputation
//! from a cache hit.

mod records;
mod reports;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{CacheError, Result};
use crate::models::{MessageUpdate, NewFile, NewMessage, SettingsUpdate};

pub use records::{FileRecord, MessageLevel, SystemMessage, SystemSettings};
pub use reports::{
    estimated_savings, OptimizationCandidate, OptimizationReport, StorageStats, TypeBreakdown,
    LARGE_FILE_BYTES,
};

#[derive(Debug, Default)]
struct Tables {
    settings: SystemSettings,
    messages: Vec<SystemMessage>,
    files: Vec<FileRecord>,
    next_message_id: u64,
    next_file_id: u64,
}

/// Cloneable handle to the shared tables.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
    queries: Arc<AtomicU64>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of read queries served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn count_query(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    // == Settings ==
    pub async fn settings(&self) -> SystemSettings {
        self.count_query();
        self.tables.read().await.settings.clone()
    }

    pub async fn update_settings(&self, update: SettingsUpdate) -> SystemSettings {
        let mut tables = self.tables.write().await;
        let settings = &mut tables.settings;
        if let Some(site_name) = update.site_name {
            settings.site_name = site_name;
        }
        if let Some(maintenance_mode) = update.maintenance_mode {
            settings.maintenance_mode = maintenance_mode;
        }
        if let Some(registration_enabled) = update.registration_enabled {
            settings.registration_enabled = registration_enabled;
        }
        if let Some(max_upload_size_mb) = update.max_upload_size_mb {
            settings.max_upload_size_mb = max_upload_size_mb;
        }
        settings.updated_at = Utc::now();
        settings.clone()
    }

    /// Largest accepted upload, from the current settings.
    pub async fn upload_limit_bytes(&self) -> u64 {
        let limit_mb = self.tables.read().await.settings.max_upload_size_mb;
        limit_mb.saturating_mul(1024 * 1024)
    }

    // == Messages ==
    /// Active messages, newest first.
    pub async fn active_messages(&self) -> Vec<SystemMessage> {
        self.count_query();
        let tables = self.tables.read().await;
        let mut messages: Vec<SystemMessage> =
            tables.messages.iter().filter(|m| m.active).cloned().collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages
    }

    pub async fn create_message(&self, new: NewMessage) -> SystemMessage {
        let mut tables = self.tables.write().await;
        tables.next_message_id += 1;
        let now = Utc::now();
        let message = SystemMessage {
            id: tables.next_message_id,
            title: new.title,
            body: new.body,
            level: new.level,
            active: new.active,
            created_at: now,
            updated_at: now,
        };
        tables.messages.push(message.clone());
        message
    }

    pub async fn update_message(&self, id: u64, update: MessageUpdate) -> Result<SystemMessage> {
        let mut tables = self.tables.write().await;
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CacheError::NotFound(format!("Message {} not found", id)))?;

        if let Some(title) = update.title {
            message.title = title;
        }
        if let Some(body) = update.body {
            message.body = body;
        }
        if let Some(level) = update.level {
            message.level = level;
        }
        if let Some(active) = update.active {
            message.active = active;
        }
        message.updated_at = Utc::now();
        Ok(message.clone())
    }

    pub async fn delete_message(&self, id: u64) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.messages.len();
        tables.messages.retain(|m| m.id != id);
        if tables.messages.len() == before {
            return Err(CacheError::NotFound(format!("Message {} not found", id)));
        }
        Ok(())
    }

    // == Files ==
    /// All files owned by `owner` (None = guest uploads).
    pub async fn files_for(&self, owner: Option<&str>) -> Vec<FileRecord> {
        self.count_query();
        self.tables
            .read()
            .await
            .files
            .iter()
            .filter(|f| f.owner_id.as_deref() == owner)
            .cloned()
            .collect()
    }

    /// One page (1-based) of `owner`'s files plus the total count.
    pub async fn list_files(
        &self,
        owner: Option<&str>,
        page: usize,
        per_page: usize,
    ) -> (Vec<FileRecord>, usize) {
        let files = self.files_for(owner).await;
        let total = files.len();
        let per_page = per_page.clamp(1, 100);
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        let rows = files.into_iter().skip(offset).take(per_page).collect();
        (rows, total)
    }

    pub async fn file(&self, id: u64) -> Option<FileRecord> {
        self.count_query();
        self.tables
            .read()
            .await
            .files
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }

    pub async fn insert_file(&self, owner: Option<&str>, new: NewFile) -> FileRecord {
        let mut tables = self.tables.write().await;
        tables.next_file_id += 1;
        let record = FileRecord {
            id: tables.next_file_id,
            owner_id: owner.map(str::to_string),
            name: new.name,
            mime_type: new.mime_type,
            size_bytes: new.size_bytes,
            optimized: false,
            created_at: Utc::now(),
        };
        tables.files.push(record.clone());
        record
    }

    /// Marks a file optimized and shrinks it by the estimated savings.
    pub async fn optimize_file(&self, id: u64) -> Result<FileRecord> {
        let mut tables = self.tables.write().await;
        let file = tables
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| CacheError::NotFound(format!("File {} not found", id)))?;

        if file.optimized {
            return Err(CacheError::InvalidRequest(format!(
                "File {} is already optimized",
                id
            )));
        }
        file.size_bytes -= estimated_savings(file.size_bytes);
        file.optimized = true;
        Ok(file.clone())
    }

    /// Deletes `owner`'s files, restricted to `ids` when given. Returns the count.
    pub async fn delete_files(&self, owner: Option<&str>, ids: Option<&[u64]>) -> u64 {
        let mut tables = self.tables.write().await;
        let before = tables.files.len();
        tables.files.retain(|f| {
            let owned = f.owner_id.as_deref() == owner;
            let selected = ids.map_or(true, |ids| ids.contains(&f.id));
            !(owned && selected)
        });
        (before - tables.files.len()) as u64
    }
}
