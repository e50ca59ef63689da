//! Aggregates computed from file records for the storage endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FileRecord;

/// Files above this size are optimization candidates regardless of type.
pub const LARGE_FILE_BYTES: u64 = 1024 * 1024;

/// Share of a file's size optimization is expected to save, in percent.
pub const OPTIMIZATION_SAVINGS_PERCENT: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeBreakdown {
    pub count: u64,
    pub bytes: u64,
}

/// Per-user storage usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_files: u64,
    pub total_bytes: u64,
    pub optimized_files: u64,
    pub by_type: BTreeMap<String, TypeBreakdown>,
    pub computed_at: DateTime<Utc>,
}

impl StorageStats {
    pub fn compute(files: &[FileRecord]) -> Self {
        let mut by_type: BTreeMap<String, TypeBreakdown> = BTreeMap::new();
        for file in files {
            let breakdown = by_type.entry(file.category().to_string()).or_default();
            breakdown.count += 1;
            breakdown.bytes = breakdown.bytes.saturating_add(file.size_bytes);
        }

        Self {
            total_files: files.len() as u64,
            total_bytes: saturating_sum(files.iter().map(|f| f.size_bytes)),
            optimized_files: files.iter().filter(|f| f.optimized).count() as u64,
            by_type,
            computed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationCandidate {
    pub id: u64,
    pub name: String,
    pub size_bytes: u64,
    pub estimated_savings_bytes: u64,
}

/// Files worth optimizing for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub candidates: Vec<OptimizationCandidate>,
    pub potential_savings_bytes: u64,
    pub computed_at: DateTime<Utc>,
}

pub fn estimated_savings(size_bytes: u64) -> u64 {
    // Widened so the product cannot overflow; the quotient always fits back
    (u128::from(size_bytes) * u128::from(OPTIMIZATION_SAVINGS_PERCENT) / 100) as u64
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

impl OptimizationReport {
    pub fn compute(files: &[FileRecord]) -> Self {
        let mut candidates: Vec<OptimizationCandidate> = files
            .iter()
            .filter(|f| !f.optimized && (f.is_image() || f.size_bytes > LARGE_FILE_BYTES))
            .map(|f| OptimizationCandidate {
                id: f.id,
                name: f.name.clone(),
                size_bytes: f.size_bytes,
                estimated_savings_bytes: estimated_savings(f.size_bytes),
            })
            .collect();
        candidates.sort_by(|a, b| b.estimated_savings_bytes.cmp(&a.estimated_savings_bytes));

        Self {
            potential_savings_bytes: saturating_sum(
                candidates.iter().map(|c| c.estimated_savings_bytes),
            ),
            candidates,
            computed_at: Utc::now(),
        }
    }
}
