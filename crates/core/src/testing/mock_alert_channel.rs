//! Mock alert channel for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::alert::{AlertChannel, AlertError, RunAlert};

/// Records delivered alerts; optionally fails every delivery.
#[derive(Debug)]
pub struct MockAlertChannel {
    name: String,
    failing: bool,
    attempts: AtomicUsize,
    delivered: Mutex<Vec<RunAlert>>,
}

impl MockAlertChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            failing: false,
            attempts: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    /// A channel whose every delivery fails.
    pub fn failing(name: &str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    pub fn delivered(&self) -> Vec<RunAlert> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertChannel for MockAlertChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, alert: &RunAlert) -> Result<(), AlertError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AlertError::Delivery {
                channel: self.name.clone(),
                message: "mock channel down".to_string(),
            });
        }
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(alert.clone());
        }
        Ok(())
    }
}
