use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::health::{DEGRADED_THRESHOLD, HEALTHY_THRESHOLD};
use crate::run::{RunRecord, TriggerSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Degraded,
    Failure,
}

impl AlertSeverity {
    /// `None` when the rate is at or above the healthy threshold.
    pub fn for_rate(rate: f64) -> Option<Self> {
        if rate >= HEALTHY_THRESHOLD {
            None
        } else if rate >= DEGRADED_THRESHOLD {
            Some(AlertSeverity::Degraded)
        } else {
            Some(AlertSeverity::Failure)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Degraded => "degraded",
            AlertSeverity::Failure => "failure",
        }
    }
}

/// Notification about one completed run's own success rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAlert {
    pub run_id: String,
    pub severity: AlertSeverity,
    pub success_rate: f64,
    pub successful: u32,
    pub failed: u32,
    pub total: u32,
    pub trigger: TriggerSource,
    pub batch: Option<u8>,
    pub raised_at: DateTime<Utc>,
}

impl RunAlert {
    /// Alert for a completed run, if its rate warrants one.
    pub fn for_run(run: &RunRecord) -> Option<Self> {
        let (successful, failed) = (run.successful?, run.failed?);
        let success_rate = run.success_rate()?;
        let severity = AlertSeverity::for_rate(success_rate)?;
        Some(Self {
            run_id: run.run_id.clone(),
            severity,
            success_rate,
            successful,
            failed,
            total: run.total,
            trigger: run.trigger,
            batch: run.batch,
            raised_at: Utc::now(),
        })
    }

    /// One-line human summary used by chat-style channels and logs.
    pub fn summary(&self) -> String {
        let scope = match self.batch {
            Some(n) => format!("batch {}", n),
            None => "all resorts".to_string(),
        };
        format!(
            "[liftwatch {}] run {} ({}, {}): {}/{} resorts scraped ({:.1}%)",
            self.severity.as_str(),
            self.run_id,
            scope,
            self.trigger,
            self.successful,
            self.total,
            self.success_rate
        )
    }
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Delivery to {channel} failed: {message}")]
    Delivery { channel: String, message: String },

    #[error("Channel {channel} rejected alert with status {status}")]
    Rejected { channel: String, status: u16 },
}

/// Somewhere an alert can be delivered.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &RunAlert) -> Result<(), AlertError>;
}
