//! Namespace Module
//!
//! Key prefixes that group cache entries for collision avoidance and bulk
//! invalidation.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{CacheError, Result};

/// Separator between a namespace and its logical key.
pub const SEPARATOR: char = ':';

/// Maximum namespace label length in bytes.
pub const MAX_NAMESPACE_LENGTH: usize = 64;

// == Namespace ==
/// A validated namespace label.
///
/// Labels are restricted to `[A-Za-z0-9_-]`, so they never contain the
/// separator or glob metacharacters. That makes `<ns>:*` match exactly
/// the keys written under `<ns>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace(Cow<'static, str>);

impl Namespace {
    /// Aggregated storage stats, file metadata and optimization reports
    pub const STORAGE: Namespace = Namespace(Cow::Borrowed("STORAGE"));
    /// Public system settings
    pub const SETTINGS: Namespace = Namespace(Cow::Borrowed("settings"));
    /// Public system messages
    pub const MESSAGES: Namespace = Namespace(Cow::Borrowed("messages"));
    /// Callers that do not pick a namespace
    pub const DEFAULT: Namespace = Namespace(Cow::Borrowed("default"));

    /// Namespaces every manager knows about from startup.
    pub fn builtin() -> [Namespace; 4] {
        [
            Namespace::STORAGE,
            Namespace::SETTINGS,
            Namespace::MESSAGES,
            Namespace::DEFAULT,
        ]
    }

    /// Validates and wraps a runtime label.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        if label.is_empty() || label.len() > MAX_NAMESPACE_LENGTH {
            return Err(CacheError::InvalidNamespace(format!(
                "Namespace must be 1 to {} bytes",
                MAX_NAMESPACE_LENGTH
            )));
        }
        if let Some(bad) = label
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(CacheError::InvalidNamespace(format!(
                "Namespace '{}' contains forbidden character '{}'",
                label, bad
            )));
        }
        Ok(Namespace(Cow::Owned(label)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full store key for a logical key in this namespace.
    pub fn key(&self, logical: &str) -> String {
        format!("{}{}{}", self.0, SEPARATOR, logical)
    }

    /// Glob pattern matching every key in this namespace.
    pub fn pattern(&self) -> String {
        format!("{}{}*", self.0, SEPARATOR)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Namespace {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Namespace::new(s)
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::DEFAULT
    }
}
