use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of source a target was registered with; only URL targets are
/// eligible for scheduled monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Url,
    Pdf,
    Text,
}

/// Review state of a target's last-known content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetStatus {
    UnreviewedNew,
    NeedsReview,
    Reviewed,
}

/// One URL under periodic change surveillance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredTarget {
    /// Opaque unique identifier
    pub id: String,

    /// The URL to fetch; immutable outside explicit version updates
    pub source_url: String,

    pub source_type: SourceType,

    pub monitoring_enabled: bool,

    /// Timestamp of the most recent successful fetch; None before first check
    pub last_checked_at: Option<DateTime<Utc>>,

    /// Hex SHA-256 of the normalized text captured at the last detected
    /// change; None before first check
    pub last_content_hash: Option<String>,

    /// Consecutive no-change checks; resets to 0 on any detected change
    pub stable_count: u32,

    pub status: TargetStatus,

    /// Last-known full normalized text; overwritten only when a change is
    /// detected, not on every check
    pub original_content: Option<String>,
}

impl MonitoredTarget {
    pub fn new(id: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            source_type: SourceType::Url,
            monitoring_enabled: true,
            last_checked_at: None,
            last_content_hash: None,
            stable_count: 0,
            status: TargetStatus::UnreviewedNew,
            original_content: None,
        }
    }

    /// Eligibility rule for the scheduler
    pub fn is_schedulable(&self) -> bool {
        self.source_type == SourceType::Url && self.monitoring_enabled
    }
}

/// Partial field set merged into a stored record by `DataStore::update_target`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetUpdate {
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_content_hash: Option<String>,
    pub stable_count: Option<u32>,
    pub status: Option<TargetStatus>,
    pub original_content: Option<String>,
}

impl TargetUpdate {
    /// Merge the present fields into `target`, leaving absent fields alone
    pub fn apply(&self, target: &mut MonitoredTarget) {
        if let Some(checked_at) = self.last_checked_at {
            target.last_checked_at = Some(checked_at);
        }
        if let Some(ref hash) = self.last_content_hash {
            target.last_content_hash = Some(hash.clone());
        }
        if let Some(count) = self.stable_count {
            target.stable_count = count;
        }
        if let Some(status) = self.status {
            target.status = status;
        }
        if let Some(ref content) = self.original_content {
            target.original_content = Some(content.clone());
        }
    }
}
