use tokio::sync::mpsc;

use super::RunAlert;
use crate::metrics::ALERTS_TOTAL;

/// Handle for queueing alerts
///
/// Cheaply cloneable. Alerts go through a bounded channel to the AlertWorker;
/// a full or closed queue is logged and never reported to the caller.
#[derive(Clone)]
pub struct AlertHandle {
    tx: Option<mpsc::Sender<RunAlert>>,
}

impl AlertHandle {
    pub fn new(tx: mpsc::Sender<RunAlert>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A handle that discards every alert (alerts.enabled = false).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue an alert without blocking.
    ///
    /// Returns true if the alert was queued.
    pub fn dispatch(&self, alert: RunAlert) -> bool {
        let Some(tx) = &self.tx else {
            tracing::debug!(run_id = %alert.run_id, "Alerting disabled, dropping alert");
            return false;
        };

        let severity = alert.severity;
        match tx.try_send(alert) {
            Ok(()) => true,
            Err(e) => {
                ALERTS_TOTAL
                    .with_label_values(&[severity.as_str(), "dropped"])
                    .inc();
                tracing::error!("Failed to queue alert: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertSeverity;
    use crate::run::TriggerSource;
    use chrono::Utc;

    fn alert(run_id: &str) -> RunAlert {
        RunAlert {
            run_id: run_id.to_string(),
            severity: AlertSeverity::Failure,
            success_rate: 20.0,
            successful: 3,
            failed: 12,
            total: 15,
            trigger: TriggerSource::Manual,
            batch: None,
            raised_at: Utc::now(),
        }
    }

    #[test]
    fn test_dispatch_queues_alert() {
        let (tx, mut rx) = mpsc::channel(10);
        let handle = AlertHandle::new(tx);

        assert!(handle.dispatch(alert("a")));

        let queued = rx.try_recv().expect("Should receive alert");
        assert_eq!(queued.run_id, "a");
    }

    #[test]
    fn test_dispatch_full_channel_does_not_fail_caller() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = AlertHandle::new(tx);

        assert!(handle.dispatch(alert("first")));
        assert!(!handle.dispatch(alert("second")));
    }

    #[test]
    fn test_dispatch_closed_channel() {
        let (tx, rx) = mpsc::channel::<RunAlert>(10);
        let handle = AlertHandle::new(tx);
        drop(rx);

        // Logged, not raised.
        assert!(!handle.dispatch(alert("a")));
    }

    #[test]
    fn test_disabled_handle_drops_alerts() {
        let handle = AlertHandle::disabled();
        assert!(!handle.is_enabled());
        assert!(!handle.dispatch(alert("a")));
    }
}
