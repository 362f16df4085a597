use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AlertChannel, AlertHandle, RunAlert};
use crate::metrics::ALERTS_TOTAL;

/// Background task that delivers queued alerts to every channel
pub struct AlertWorker {
    rx: mpsc::Receiver<RunAlert>,
    channels: Vec<Arc<dyn AlertChannel>>,
}

impl AlertWorker {
    pub fn new(rx: mpsc::Receiver<RunAlert>, channels: Vec<Arc<dyn AlertChannel>>) -> Self {
        Self { rx, channels }
    }

    /// Run the worker, consuming alerts until every handle is dropped
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::info!(channels = self.channels.len(), "Alert worker started");

        while let Some(alert) = self.rx.recv().await {
            for channel in &self.channels {
                let result = match channel.deliver(&alert).await {
                    Ok(()) => "delivered",
                    Err(e) => {
                        tracing::error!(
                            channel = channel.name(),
                            run_id = %alert.run_id,
                            error = %e,
                            "Alert delivery failed"
                        );
                        "failed"
                    }
                };
                ALERTS_TOTAL
                    .with_label_values(&[alert.severity.as_str(), result])
                    .inc();
            }
        }

        tracing::info!("Alert worker shutting down");
    }
}

/// Create a complete alert system
///
/// Returns:
/// - `AlertHandle` - for queueing alerts (clone this to share across tasks)
/// - `AlertWorker` - spawn this as a background task with `tokio::spawn(worker.run())`
pub fn create_alert_system(
    channels: Vec<Arc<dyn AlertChannel>>,
    buffer_size: usize,
) -> (AlertHandle, AlertWorker) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (AlertHandle::new(tx), AlertWorker::new(rx, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertSeverity;
    use crate::run::TriggerSource;
    use crate::testing::MockAlertChannel;
    use chrono::Utc;

    fn alert() -> RunAlert {
        RunAlert {
            run_id: "run-7".to_string(),
            severity: AlertSeverity::Degraded,
            success_rate: 66.7,
            successful: 10,
            failed: 5,
            total: 15,
            trigger: TriggerSource::Cron,
            batch: None,
            raised_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_delivers_to_all_channels() {
        let first = Arc::new(MockAlertChannel::new("first"));
        let second = Arc::new(MockAlertChannel::new("second"));
        let channels: Vec<Arc<dyn AlertChannel>> = vec![first.clone(), second.clone()];
        let (handle, worker) = create_alert_system(channels, 8);

        assert!(handle.dispatch(alert()));
        drop(handle);
        worker.run().await;

        assert_eq!(first.delivered().len(), 1);
        assert_eq!(second.delivered()[0].run_id, "run-7");
    }

    #[tokio::test]
    async fn test_failing_channel_does_not_block_others() {
        let broken = Arc::new(MockAlertChannel::failing("broken"));
        let healthy = Arc::new(MockAlertChannel::new("healthy"));
        let channels: Vec<Arc<dyn AlertChannel>> = vec![broken.clone(), healthy.clone()];
        let (handle, worker) = create_alert_system(channels, 8);

        handle.dispatch(alert());
        handle.dispatch(alert());
        drop(handle);
        worker.run().await;

        assert_eq!(broken.attempts(), 2);
        assert_eq!(healthy.delivered().len(), 2);
    }
}
