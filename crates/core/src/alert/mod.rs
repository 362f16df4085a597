//! Best-effort alerting on degraded runs.
//!
//! Alerts are handed to a background worker through a bounded queue, so a
//! slow or broken channel never affects the run that raised the alert.

mod channels;
mod handle;
mod types;
mod worker;

pub use channels::{build_channels, LogChannel, WebhookChannel};
pub use handle::AlertHandle;
pub use types::*;
pub use worker::{create_alert_system, AlertWorker};
