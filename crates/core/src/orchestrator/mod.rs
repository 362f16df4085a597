//! Scrape orchestration.
//!
//! - **ScrapeOrchestrator**: concurrent settle-all fan-out over adapters
//! - **CollectionPipeline**: one bracketed run (track, scrape, persist, alert)
//! - **Scheduler**: periodic runs with orphan sweeping

mod config;
mod pipeline;
mod runner;
mod scheduler;
mod types;

pub use config::OrchestratorConfig;
pub use pipeline::CollectionPipeline;
pub use runner::ScrapeOrchestrator;
pub use scheduler::{scheduled_selection, Scheduler};
pub use types::{PipelineError, RunReport, SchedulerStatus, ScrapeOutcome, ScrapeOutcomes};
