//! Ski-resort status collection: scrape every resort's upstream page,
//! persist what succeeded, track each run and alert when collection degrades.

pub mod adapter;
pub mod alert;
pub mod auth;
pub mod config;
pub mod health;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod run;
pub mod store;
pub mod testing;

pub use adapter::{AdapterError, AdapterRegistry, PageFetcher, SourceAdapter, StatusSnapshot};
pub use alert::{
    build_channels, create_alert_system, AlertChannel, AlertHandle, AlertSeverity, AlertWorker,
    RunAlert,
};
pub use auth::{create_authenticator, AuthError, AuthRequest, Authenticator, Caller};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use health::{HealthClass, HealthEvaluator, HealthReport, MonitorSummary};
pub use orchestrator::{
    CollectionPipeline, OrchestratorConfig, PipelineError, RunReport, Scheduler,
    ScrapeOrchestrator, ScrapeOutcome, ScrapeOutcomes,
};
pub use registry::{BatchSelection, RegistryError, ResortRegistry, ScrapeTarget};
pub use run::{RunRecord, RunStatus, RunTracker, TriggerSource};
pub use store::{open_store, StatusStore, StoreError};
