//! Types shared by all source adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ScrapeTarget;

/// Normalized lift/run status of one resort at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub resort_id: String,
    pub is_open: bool,
    /// Share of terrain open, 0..=100.
    pub percent_open: u8,
    pub lifts_open: u32,
    pub lifts_total: u32,
    pub runs_open: u32,
    pub runs_total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub source_url: String,
    pub captured_at: DateTime<Utc>,
}

/// Raw counts extracted from an upstream page, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusCounts {
    pub lifts_open: u32,
    pub lifts_total: u32,
    pub runs_open: u32,
    pub runs_total: u32,
    /// Explicit open/closed flag, when the upstream publishes one.
    pub is_open: Option<bool>,
    pub message: Option<String>,
}

impl StatusCounts {
    /// Terrain percentage: runs ratio, falling back to the lifts ratio.
    pub fn percent_open(&self) -> u8 {
        let (open, total) = if self.runs_total > 0 {
            (self.runs_open, self.runs_total)
        } else {
            (self.lifts_open, self.lifts_total)
        };
        if total == 0 {
            return 0;
        }
        let pct = (open.min(total) as f64 * 100.0 / total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }

    pub fn into_snapshot(self, target: &ScrapeTarget, captured_at: DateTime<Utc>) -> StatusSnapshot {
        let percent_open = self.percent_open();
        let is_open = self.is_open.unwrap_or(self.lifts_open > 0);
        StatusSnapshot {
            resort_id: target.resort_id.clone(),
            is_open,
            percent_open,
            lifts_open: self.lifts_open,
            lifts_total: self.lifts_total,
            runs_open: self.runs_open,
            runs_total: self.runs_total,
            message: self.message.filter(|m| !m.trim().is_empty()),
            source_url: target.url.clone(),
            captured_at,
        }
    }
}

/// Per-target failure. Never propagates past the orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AdapterError {
    /// Upstream unreachable or answered with a non-2xx status.
    #[error("network error: {0}")]
    Network(String),

    /// Page did not have the expected structure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Adapter exceeded its time bound (milliseconds).
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

impl AdapterError {
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Network(_) => "network",
            AdapterError::Parse(_) => "parse",
            AdapterError::Timeout(_) => "timeout",
        }
    }
}

/// Capability to read one resort's upstream page.
///
/// Implementations hold no state shared with other adapters and must be
/// safe to call concurrently. They never retry.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Strategy name for logs.
    fn name(&self) -> &str;

    /// Fetch and parse the target's page.
    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError>;
}
