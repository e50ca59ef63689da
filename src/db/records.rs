//! Rows held by the source-of-truth repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Site-wide settings shown on public pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub site_name: String,
    pub maintenance_mode: bool,
    pub registration_enabled: bool,
    pub max_upload_size_mb: u64,
    pub updated_at: DateTime<Utc>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            site_name: "FileHost".to_string(),
            maintenance_mode: false,
            registration_enabled: true,
            max_upload_size_mb: 100,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    #[default]
    Info,
    Warning,
    Critical,
}

/// Banner message published by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub level: MessageLevel,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata of one stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: u64,
    /// None for guest uploads
    pub owner_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub optimized: bool,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Top-level MIME type, e.g. "image" for "image/png".
    pub fn category(&self) -> &str {
        self.mime_type
            .split_once('/')
            .map_or(self.mime_type.as_str(), |(category, _)| category)
    }
}
