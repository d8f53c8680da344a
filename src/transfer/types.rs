//! Transfer Core Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::TransferError;

/// Local attempt ID - ULID, used to correlate log lines of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(ulid::Ulid);

impl AttemptId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AttemptId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Opaque remote identifier of one in-flight transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(pub String);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A site as seen by one authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteRef {
    pub site_id: u64,
    pub username: String,
}

impl SiteRef {
    pub fn new(site_id: u64, username: impl Into<String>) -> Self {
        Self {
            site_id,
            username: username.into(),
        }
    }
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.site_id)
    }
}

/// Plugin directory entry the user asked to install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub slug: String,
    pub name: String,
}

impl PluginEntry {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
        }
    }
}

/// Immutable input of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub site: SiteRef,
    pub plugin: PluginEntry,
}

impl TransferRequest {
    pub fn new(site: SiteRef, plugin: PluginEntry) -> Self {
        Self { site, plugin }
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        if self.site.site_id == 0 {
            return Err(TransferError::InvalidRequest("site id must be non-zero".into()));
        }
        if self.site.username.trim().is_empty() {
            return Err(TransferError::InvalidRequest("username must not be empty".into()));
        }
        if self.plugin.slug.trim().is_empty() {
            return Err(TransferError::InvalidRequest("plugin slug must not be empty".into()));
        }
        Ok(())
    }
}

/// Caller-supplied knobs for one attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Retry eligibility and initiation on failure. Set when the transfer
    /// follows an account change (e.g. a domain purchase) the remote may
    /// not have caught up with yet.
    pub retry_after_failure: bool,
}

/// Remote transfer status, closed at the decoding boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Idle,
    InProgress,
    Complete,
    Error,
}

impl TransferStatus {
    /// Decode the REST `status` string. Any state that is not idle,
    /// complete or an error counts as in progress.
    pub fn from_remote(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "complete" | "completed" => TransferStatus::Complete,
            "error" | "failure" | "failed" => TransferStatus::Error,
            "" | "idle" | "inactive" => TransferStatus::Idle,
            _ => TransferStatus::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Idle => "IDLE",
            TransferStatus::InProgress => "IN_PROGRESS",
            TransferStatus::Complete => "COMPLETE",
            TransferStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a successful initiation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedTransfer {
    pub transfer_id: TransferId,
    pub status: TransferStatus,
}

/// One status poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub status: TransferStatus,
    pub step: Option<u32>,
    pub total_steps: Option<u32>,
}

impl StatusReport {
    pub fn new(status: TransferStatus) -> Self {
        Self {
            status,
            step: None,
            total_steps: None,
        }
    }

    pub fn with_steps(status: TransferStatus, step: u32, total_steps: u32) -> Self {
        Self {
            status,
            step: Some(step),
            total_steps: Some(total_steps),
        }
    }

    /// `step / total_steps` when both are known
    pub fn progress_fraction(&self) -> Option<f32> {
        match (self.step, self.total_steps) {
            (Some(step), Some(total)) if total > 0 => {
                Some((step as f32 / total as f32).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// Installed plugin as reported by the plugins endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePlugin {
    pub id: String,
    pub slug: String,
    pub active: bool,
    pub name: String,
    pub author: String,
    pub version: Option<String>,
    pub autoupdate: bool,
    pub update_available: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCapabilities {
    pub modify_files: bool,
    pub autoupdate_files: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePlugins {
    pub plugins: Vec<SitePlugin>,
    pub capabilities: PluginCapabilities,
}

impl SitePlugins {
    pub fn contains(&self, slug: &str) -> bool {
        self.plugins.iter().any(|p| p.slug == slug)
    }
}

/// Local copy of a site's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub site: SiteRef,
    pub name: String,
    pub url: String,
    pub is_jetpack: bool,
    pub plan_slug: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl SiteRecord {
    pub fn new(site: SiteRef) -> Self {
        Self {
            site,
            name: String::new(),
            url: String::new(),
            is_jetpack: false,
            plan_slug: None,
            synced_at: None,
        }
    }
}
