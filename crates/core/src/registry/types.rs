use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fixed batches the roster is partitioned into.
pub const BATCH_COUNT: u8 = 3;

/// One resort's scrape definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    /// Stable identifier (e.g. "baker").
    pub resort_id: String,
    /// Display name.
    pub name: String,
    /// Upstream page or feed URL.
    pub url: String,
    /// Batch number, 1..=BATCH_COUNT.
    pub batch: u8,
    /// How the upstream page is read.
    pub strategy: AdapterKind,
}

/// Page format of an upstream source, with the per-resort extraction rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterKind {
    /// JSON document with `lifts` / `runs` arrays of `{name, status}`.
    LiftFeedJson {
        /// Status strings counted as open (case-insensitive).
        #[serde(default = "default_open_values")]
        open_values: Vec<String>,
    },
    /// HTML page embedding a `TerrainStatusFeed = {...};` script object.
    TerrainFeedScript,
    /// HTML lift/run listing read with CSS selectors.
    HtmlTable {
        lift_selector: String,
        run_selector: String,
        #[serde(default = "default_open_marker")]
        open_marker: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_selector: Option<String>,
    },
    /// Free text with "N of M lifts" / "N of M runs" phrases.
    TextSummary,
}

impl AdapterKind {
    /// Short tag used in logs and API output.
    pub fn tag(&self) -> &'static str {
        match self {
            AdapterKind::LiftFeedJson { .. } => "lift_feed_json",
            AdapterKind::TerrainFeedScript => "terrain_feed_script",
            AdapterKind::HtmlTable { .. } => "html_table",
            AdapterKind::TextSummary => "text_summary",
        }
    }
}

fn default_open_values() -> Vec<String> {
    vec!["open".to_string()]
}

fn default_open_marker() -> String {
    "open".to_string()
}

/// Which part of the roster a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSelection {
    All,
    Batch(u8),
}

impl BatchSelection {
    pub fn batch_number(&self) -> Option<u8> {
        match self {
            BatchSelection::All => None,
            BatchSelection::Batch(n) => Some(*n),
        }
    }
}

impl std::fmt::Display for BatchSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchSelection::All => write!(f, "all"),
            BatchSelection::Batch(n) => write!(f, "batch {}", n),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    #[error("unknown resort: {0}")]
    UnknownResort(String),

    #[error("invalid batch {batch}: expected 1..={max}")]
    InvalidBatch { batch: u8, max: u8 },

    #[error("batch {0} has no resorts")]
    EmptyBatch(u8),

    #[error("invalid registry: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_html_table_defaults() {
        let toml = r#"
            resort_id = "crystal"
            name = "Crystal Mountain"
            url = "https://crystal.example.com"
            batch = 1

            [strategy]
            kind = "html_table"
            lift_selector = ".lift"
            run_selector = ".run"
        "#;
        let target: ScrapeTarget = toml::from_str(toml).unwrap();
        match target.strategy {
            AdapterKind::HtmlTable {
                open_marker,
                message_selector,
                ..
            } => {
                assert_eq!(open_marker, "open");
                assert!(message_selector.is_none());
            }
            other => panic!("unexpected strategy: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_lift_feed_default_open_values() {
        let json = r#"{"kind": "lift_feed_json"}"#;
        let kind: AdapterKind = serde_json::from_str(json).unwrap();
        assert_eq!(
            kind,
            AdapterKind::LiftFeedJson {
                open_values: vec!["open".to_string()]
            }
        );
        assert_eq!(kind.tag(), "lift_feed_json");
    }

    #[test]
    fn test_error_display() {
        let err = RegistryError::InvalidBatch { batch: 4, max: 3 };
        assert_eq!(err.to_string(), "invalid batch 4: expected 1..=3");
    }

    #[test]
    fn test_selection_display() {
        assert_eq!(BatchSelection::All.to_string(), "all");
        assert_eq!(BatchSelection::Batch(2).to_string(), "batch 2");
        assert_eq!(BatchSelection::Batch(2).batch_number(), Some(2));
    }
}
