//! Static catalog of resorts to scrape.
//!
//! Every resort is a [`ScrapeTarget`] pinned to one of a fixed number of
//! batches. Batch membership never changes at runtime, so repeated runs of the
//! same batch always cover the same resorts.

mod roster;
mod types;

pub use roster::builtin_targets;
pub use types::*;

use std::collections::HashSet;

/// Ordered, validated set of scrape targets.
#[derive(Debug, Clone)]
pub struct ResortRegistry {
    targets: Vec<ScrapeTarget>,
}

impl ResortRegistry {
    /// Build a registry from an explicit target list.
    ///
    /// Rejects duplicate identifiers, empty URLs and batch numbers outside
    /// `1..=BATCH_COUNT`.
    pub fn new(targets: Vec<ScrapeTarget>) -> Result<Self, RegistryError> {
        if targets.is_empty() {
            return Err(RegistryError::Invalid("registry has no targets".to_string()));
        }

        let mut seen = HashSet::new();
        for target in &targets {
            if target.resort_id.trim().is_empty() {
                return Err(RegistryError::Invalid("empty resort_id".to_string()));
            }
            if !seen.insert(target.resort_id.as_str()) {
                return Err(RegistryError::Invalid(format!(
                    "duplicate resort_id: {}",
                    target.resort_id
                )));
            }
            if !(target.url.starts_with("http://") || target.url.starts_with("https://")) {
                return Err(RegistryError::Invalid(format!(
                    "{}: url must be http(s), got {:?}",
                    target.resort_id, target.url
                )));
            }
            if !(1..=BATCH_COUNT).contains(&target.batch) {
                return Err(RegistryError::Invalid(format!(
                    "{}: batch {} outside 1..={}",
                    target.resort_id, target.batch, BATCH_COUNT
                )));
            }
        }

        Ok(Self { targets })
    }

    /// The built-in Pacific Northwest roster.
    pub fn builtin() -> Self {
        Self {
            targets: builtin_targets(),
        }
    }

    /// All targets in declaration order.
    pub fn all_targets(&self) -> &[ScrapeTarget] {
        &self.targets
    }

    /// Targets belonging to batch `batch`, in declaration order.
    ///
    /// An out-of-range batch yields an empty list; callers validate the
    /// selector first with [`ResortRegistry::validate_selection`].
    pub fn targets_in_batch(&self, batch: u8) -> Vec<&ScrapeTarget> {
        self.targets.iter().filter(|t| t.batch == batch).collect()
    }

    pub fn find(&self, resort_id: &str) -> Result<&ScrapeTarget, RegistryError> {
        self.targets
            .iter()
            .find(|t| t.resort_id == resort_id)
            .ok_or_else(|| RegistryError::UnknownResort(resort_id.to_string()))
    }

    pub fn batch_count(&self) -> u8 {
        BATCH_COUNT
    }

    pub fn validate_selection(&self, selection: BatchSelection) -> Result<(), RegistryError> {
        match selection {
            BatchSelection::All => Ok(()),
            BatchSelection::Batch(n) if (1..=BATCH_COUNT).contains(&n) => Ok(()),
            BatchSelection::Batch(n) => Err(RegistryError::InvalidBatch {
                batch: n,
                max: BATCH_COUNT,
            }),
        }
    }

    /// Validate `selection` and return the owned target list it covers.
    ///
    /// A batch with no members is an error, so a run never starts with
    /// nothing to scrape.
    pub fn resolve(&self, selection: BatchSelection) -> Result<Vec<ScrapeTarget>, RegistryError> {
        self.validate_selection(selection)?;
        match selection {
            BatchSelection::All => Ok(self.targets.clone()),
            BatchSelection::Batch(n) => {
                let targets: Vec<ScrapeTarget> =
                    self.targets_in_batch(n).into_iter().cloned().collect();
                if targets.is_empty() {
                    return Err(RegistryError::EmptyBatch(n));
                }
                Ok(targets)
            }
        }
    }
}

impl Default for ResortRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(id: &str, batch: u8) -> ScrapeTarget {
        ScrapeTarget {
            resort_id: id.to_string(),
            name: id.to_uppercase(),
            url: format!("https://{}.example.com/status", id),
            batch,
            strategy: AdapterKind::TextSummary,
        }
    }

    #[test]
    fn test_builtin_roster_is_valid() {
        let builtin = ResortRegistry::builtin();
        let rebuilt = ResortRegistry::new(builtin.all_targets().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(builtin.all_targets().len(), 15);
    }

    #[test]
    fn test_builtin_batches_partition_roster() {
        let registry = ResortRegistry::builtin();
        let total: usize = (1..=registry.batch_count())
            .map(|n| registry.targets_in_batch(n).len())
            .sum();
        assert_eq!(total, registry.all_targets().len());
        for n in 1..=registry.batch_count() {
            assert_eq!(registry.targets_in_batch(n).len(), 5);
        }
    }

    #[test]
    fn test_batch_membership_is_deterministic() {
        let registry = ResortRegistry::builtin();
        let first: Vec<_> = registry
            .targets_in_batch(2)
            .iter()
            .map(|t| t.resort_id.clone())
            .collect();
        let second: Vec<_> = registry
            .targets_in_batch(2)
            .iter()
            .map(|t| t.resort_id.clone())
            .collect();
        assert_eq!(first, second);
        assert_eq!(first[0], "missionridge");
    }

    #[test]
    fn test_find() {
        let registry = ResortRegistry::builtin();
        assert_eq!(registry.find("baker").unwrap().name, "Mt. Baker");
        assert!(matches!(
            registry.find("nowhere"),
            Err(RegistryError::UnknownResort(_))
        ));
    }

    #[test]
    fn test_invalid_batch_selection() {
        let registry = ResortRegistry::builtin();
        assert!(registry.validate_selection(BatchSelection::Batch(1)).is_ok());
        assert!(registry.validate_selection(BatchSelection::Batch(3)).is_ok());
        assert!(matches!(
            registry.validate_selection(BatchSelection::Batch(0)),
            Err(RegistryError::InvalidBatch { batch: 0, max: 3 })
        ));
        assert!(matches!(
            registry.resolve(BatchSelection::Batch(4)),
            Err(RegistryError::InvalidBatch { batch: 4, .. })
        ));
    }

    #[test]
    fn test_resolve_preserves_order() {
        let registry =
            ResortRegistry::new(vec![target("a", 1), target("b", 2), target("c", 1)]).unwrap();
        let ids: Vec<_> = registry
            .resolve(BatchSelection::Batch(1))
            .unwrap()
            .into_iter()
            .map(|t| t.resort_id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(registry.resolve(BatchSelection::All).unwrap().len(), 3);
    }

    #[test]
    fn test_resolve_empty_batch_is_error() {
        let registry = ResortRegistry::new(vec![target("a", 1), target("b", 1)]).unwrap();
        assert_eq!(registry.resolve(BatchSelection::Batch(1)).unwrap().len(), 2);
        assert_eq!(
            registry.resolve(BatchSelection::Batch(2)),
            Err(RegistryError::EmptyBatch(2))
        );
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = ResortRegistry::new(vec![target("a", 1), target("a", 2)]);
        assert!(matches!(result, Err(RegistryError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_batch() {
        let result = ResortRegistry::new(vec![target("a", 4)]);
        assert!(matches!(result, Err(RegistryError::Invalid(_))));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut t = target("a", 1);
        t.url = "ftp://a.example.com".to_string();
        assert!(ResortRegistry::new(vec![t]).is_err());
    }
}
