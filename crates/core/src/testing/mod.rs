//! Testing utilities and mock implementations.
//!
//! Lets the pipeline and the HTTP surface be exercised end to end without
//! reaching any real resort website.
//!
//! # Example
//!
//! ```rust,ignore
//! use liftwatch_core::testing::{fixtures, MockAdapter};
//!
//! let registry = fixtures::roster();
//! let adapter = Arc::new(MockAdapter::new().fail("r03", AdapterError::Timeout(15_000)));
//! let adapters = AdapterRegistry::uniform(registry.all_targets(), adapter);
//! ```

mod failing_store;
mod mock_adapter;
mod mock_alert_channel;

pub use failing_store::FailingStore;
pub use mock_adapter::MockAdapter;
pub use mock_alert_channel::MockAlertChannel;

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::adapter::StatusSnapshot;
    use crate::registry::{AdapterKind, ResortRegistry, ScrapeTarget};
    use crate::run::{RunFinish, RunRecord, TriggerSource};
    use crate::store::StatusStore;

    /// A UTC timestamp at whole-minute precision.
    pub fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    /// A target with a synthetic URL.
    pub fn target(resort_id: &str, batch: u8) -> ScrapeTarget {
        ScrapeTarget {
            resort_id: resort_id.to_string(),
            name: format!("Resort {}", resort_id),
            url: format!("https://{}.example.com/conditions", resort_id),
            batch,
            strategy: AdapterKind::TextSummary,
        }
    }

    /// Fifteen targets `r01`..`r15`, five per batch.
    pub fn roster_targets() -> Vec<ScrapeTarget> {
        (1..=15u8)
            .map(|i| target(&format!("r{:02}", i), (i - 1) / 5 + 1))
            .collect()
    }

    pub fn roster() -> ResortRegistry {
        ResortRegistry::new(roster_targets()).expect("valid fixture roster")
    }

    /// A snapshot captured at a fixed instant.
    pub fn snapshot(resort_id: &str, lifts_open: u32, lifts_total: u32) -> StatusSnapshot {
        snapshot_at(resort_id, lifts_open, lifts_total, ts(2025, 1, 10, 8, 0))
    }

    pub fn snapshot_at(
        resort_id: &str,
        lifts_open: u32,
        lifts_total: u32,
        captured_at: DateTime<Utc>,
    ) -> StatusSnapshot {
        let percent_open = if lifts_total == 0 {
            0
        } else {
            (lifts_open * 100 / lifts_total) as u8
        };
        StatusSnapshot {
            resort_id: resort_id.to_string(),
            is_open: lifts_open > 0,
            percent_open,
            lifts_open,
            lifts_total,
            runs_open: 0,
            runs_total: 0,
            message: None,
            source_url: format!("https://{}.example.com/conditions", resort_id),
            captured_at,
        }
    }

    /// Persist a completed run with the given counts.
    pub fn completed_run(
        store: &dyn StatusStore,
        total: u32,
        successful: u32,
        failed: u32,
    ) -> RunRecord {
        let run = RunRecord::start(total, TriggerSource::Manual, None);
        store.create_run(&run).expect("create run");
        store
            .finish_run(
                &run.run_id,
                &RunFinish::Completed {
                    successful,
                    failed,
                    duration_ms: 1_000,
                },
                Utc::now(),
            )
            .expect("finish run")
    }
}
