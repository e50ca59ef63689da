//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming request bodies and query strings.

use serde::Deserialize;

use crate::db::MessageLevel;

/// Query for GET /admin/cache/keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    /// Glob pattern, defaults to `*`
    pub pattern: Option<String>,
}

/// Query for DELETE /admin/cache
///
/// With neither field set every namespace is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheQuery {
    /// Full `<namespace>:<key>` to remove
    pub key: Option<String>,
    /// Single namespace to invalidate
    pub namespace: Option<String>,
}

/// Partial update for PUT /admin/settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub site_name: Option<String>,
    pub maintenance_mode: Option<bool>,
    pub registration_enabled: Option<bool>,
    pub max_upload_size_mb: Option<u64>,
}

impl SettingsUpdate {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.site_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Some("Site name cannot be empty".to_string());
        }
        if self.max_upload_size_mb == Some(0) {
            return Some("Maximum upload size must be positive".to_string());
        }
        None
    }
}

/// Body for POST /admin/messages
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub level: MessageLevel,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewMessage {
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        if self.body.trim().is_empty() {
            return Some("Body cannot be empty".to_string());
        }
        None
    }
}

/// Body for PUT /admin/messages/:id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub level: Option<MessageLevel>,
    pub active: Option<bool>,
}

/// Body for POST /storage/items
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl NewFile {
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("File name cannot be empty".to_string());
        }
        if !self.mime_type.contains('/') {
            return Some(format!("Invalid MIME type '{}'", self.mime_type));
        }
        None
    }
}

/// Query for GET /storage/items
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Query for DELETE /storage/items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteFilesQuery {
    /// Comma-separated ids; absent means every file of the caller
    pub ids: Option<String>,
}

impl DeleteFilesQuery {
    pub fn parse_ids(&self) -> Result<Option<Vec<u64>>, String> {
        let Some(ids) = self.ids.as_deref() else {
            return Ok(None);
        };
        ids.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| id.parse().map_err(|_| format!("Invalid file id '{}'", id)))
            .collect::<Result<Vec<u64>, String>>()
            .map(Some)
    }
}
