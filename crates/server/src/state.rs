use std::sync::Arc;

use liftwatch_core::{
    Authenticator, CollectionPipeline, Config, HealthEvaluator, ResortRegistry, SanitizedConfig,
    Scheduler, StatusStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<CollectionPipeline>,
    evaluator: HealthEvaluator,
    authenticator: Arc<dyn Authenticator>,
    scheduler: Option<Arc<Scheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        pipeline: Arc<CollectionPipeline>,
        authenticator: Arc<dyn Authenticator>,
        scheduler: Option<Arc<Scheduler>>,
    ) -> Self {
        let evaluator = HealthEvaluator::new(Arc::clone(pipeline.store()));
        Self {
            config,
            pipeline,
            evaluator,
            authenticator,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &CollectionPipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &ResortRegistry {
        self.pipeline.registry()
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        self.pipeline.store()
    }

    pub fn evaluator(&self) -> &HealthEvaluator {
        &self.evaluator
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn scheduler(&self) -> Option<&Arc<Scheduler>> {
        self.scheduler.as_ref()
    }
}
