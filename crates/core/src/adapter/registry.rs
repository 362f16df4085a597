//! Per-resort adapter lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    HtmlTableAdapter, LiftFeedAdapter, PageFetcher, SourceAdapter, TableRules,
    TerrainFeedAdapter, TextSummaryAdapter,
};
use crate::registry::{AdapterKind, ScrapeTarget};

/// Instantiate the adapter implementing `kind`.
pub fn build_adapter(kind: &AdapterKind, fetcher: PageFetcher) -> Arc<dyn SourceAdapter> {
    match kind {
        AdapterKind::LiftFeedJson { open_values } => {
            Arc::new(LiftFeedAdapter::new(fetcher, open_values.clone()))
        }
        AdapterKind::TerrainFeedScript => Arc::new(TerrainFeedAdapter::new(fetcher)),
        AdapterKind::HtmlTable {
            lift_selector,
            run_selector,
            open_marker,
            message_selector,
        } => Arc::new(HtmlTableAdapter::new(
            fetcher,
            TableRules {
                lift_selector: lift_selector.clone(),
                run_selector: run_selector.clone(),
                open_marker: open_marker.clone(),
                message_selector: message_selector.clone(),
            },
        )),
        AdapterKind::TextSummary => Arc::new(TextSummaryAdapter::new(fetcher)),
    }
}

/// Maps each resort identifier to the adapter that reads its page.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.adapters.keys().collect();
        ids.sort();
        f.debug_struct("AdapterRegistry").field("resorts", &ids).finish()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One adapter per target, built from the target's strategy. All adapters
    /// share `fetcher`'s connection pool.
    pub fn from_targets(targets: &[ScrapeTarget], fetcher: &PageFetcher) -> Self {
        let adapters = targets
            .iter()
            .map(|t| (t.resort_id.clone(), build_adapter(&t.strategy, fetcher.clone())))
            .collect();
        Self { adapters }
    }

    /// Same adapter for every target. Used with test doubles.
    pub fn uniform(targets: &[ScrapeTarget], adapter: Arc<dyn SourceAdapter>) -> Self {
        let adapters = targets
            .iter()
            .map(|t| (t.resort_id.clone(), Arc::clone(&adapter)))
            .collect();
        Self { adapters }
    }

    pub fn register(&mut self, resort_id: impl Into<String>, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(resort_id.into(), adapter);
    }

    pub fn get(&self, resort_id: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(resort_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::registry::ResortRegistry;

    #[test]
    fn test_from_targets_covers_roster() {
        let registry = ResortRegistry::builtin();
        let fetcher = PageFetcher::new(&ScraperConfig::default()).unwrap();
        let adapters = AdapterRegistry::from_targets(registry.all_targets(), &fetcher);

        assert_eq!(adapters.len(), registry.all_targets().len());
        for target in registry.all_targets() {
            let adapter = adapters.get(&target.resort_id).unwrap();
            assert_eq!(adapter.name(), target.strategy.tag());
        }
    }

    #[test]
    fn test_get_unknown() {
        assert!(AdapterRegistry::new().get("baker").is_none());
        assert!(AdapterRegistry::new().is_empty());
    }
}
