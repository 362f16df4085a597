//! Mock source adapter for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::adapter::{AdapterError, SourceAdapter, StatusCounts, StatusSnapshot};
use crate::registry::ScrapeTarget;

/// Mock implementation of the SourceAdapter trait.
///
/// Scripted per resort id:
/// - succeed with default or configured counts
/// - fail with a given error
/// - sleep before answering (to exercise timeouts)
/// - panic (to exercise task isolation)
///
/// Every call is recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use liftwatch_core::testing::MockAdapter;
///
/// let adapter = MockAdapter::new()
///     .fail("stevens", AdapterError::Parse("layout changed".into()))
///     .delay("crystal", Duration::from_secs(30));
/// ```
#[derive(Default)]
pub struct MockAdapter {
    counts: HashMap<String, StatusCounts>,
    failures: HashMap<String, AdapterError>,
    delays: HashMap<String, Duration>,
    panics: HashSet<String>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for MockAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockAdapter")
            .field("failures", &self.failures)
            .field("delays", &self.delays)
            .field("panics", &self.panics)
            .finish()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockAdapter {
    /// Every resort succeeds with 5/8 lifts and 30/60 runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed for `resort_id` with these counts.
    pub fn with_counts(mut self, resort_id: &str, counts: StatusCounts) -> Self {
        self.counts.insert(resort_id.to_string(), counts);
        self
    }

    pub fn fail(mut self, resort_id: &str, error: AdapterError) -> Self {
        self.failures.insert(resort_id.to_string(), error);
        self
    }

    pub fn delay(mut self, resort_id: &str, delay: Duration) -> Self {
        self.delays.insert(resort_id.to_string(), delay);
        self
    }

    pub fn panic_on(mut self, resort_id: &str) -> Self {
        self.panics.insert(resort_id.to_string());
        self
    }

    /// Resort ids in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Highest number of concurrent calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn default_counts() -> StatusCounts {
        StatusCounts {
            lifts_open: 5,
            lifts_total: 8,
            runs_open: 30,
            runs_total: 60,
            is_open: None,
            message: None,
        }
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(target.resort_id.clone());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(delay) = self.delays.get(&target.resort_id) {
            tokio::time::sleep(*delay).await;
        }
        if self.panics.contains(&target.resort_id) {
            panic!("mock adapter panic for {}", target.resort_id);
        }
        if let Some(error) = self.failures.get(&target.resort_id) {
            return Err(error.clone());
        }

        let counts = self
            .counts
            .get(&target.resort_id)
            .cloned()
            .unwrap_or_else(Self::default_counts);
        Ok(counts.into_snapshot(target, Utc::now()))
    }
}
