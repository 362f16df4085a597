//! JSON lift feed adapter.
//!
//! Reads documents shaped like:
//!
//! ```json
//! {
//!   "is_open": true,
//!   "message": "Storm cycle, expect holds",
//!   "lifts": [{"name": "Chair 1", "status": "open"}],
//!   "runs":  [{"name": "Upper Canyon", "status": "closed"}]
//! }
//! ```

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::{AdapterError, PageFetcher, SourceAdapter, StatusCounts, StatusSnapshot};
use crate::registry::ScrapeTarget;

pub struct LiftFeedAdapter {
    fetcher: PageFetcher,
    open_values: Vec<String>,
}

impl LiftFeedAdapter {
    pub fn new(fetcher: PageFetcher, open_values: Vec<String>) -> Self {
        Self {
            fetcher,
            open_values,
        }
    }
}

#[async_trait]
impl SourceAdapter for LiftFeedAdapter {
    fn name(&self) -> &str {
        "lift_feed_json"
    }

    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError> {
        let body = self.fetcher.fetch_text(&target.url).await?;
        let counts = parse_lift_feed(&body, &self.open_values)?;
        Ok(counts.into_snapshot(target, Utc::now()))
    }
}

#[derive(Debug, Deserialize)]
struct LiftFeed {
    #[serde(default)]
    is_open: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    lifts: Vec<FeedEntry>,
    #[serde(default)]
    runs: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    status: Option<String>,
}

/// Parse a lift feed body, counting entries whose status matches `open_values`.
pub fn parse_lift_feed(body: &str, open_values: &[String]) -> Result<StatusCounts, AdapterError> {
    let feed: LiftFeed = serde_json::from_str(body)
        .map_err(|e| AdapterError::Parse(format!("invalid lift feed: {}", e)))?;

    if feed.lifts.is_empty() {
        return Err(AdapterError::Parse("lift feed has no lifts".to_string()));
    }

    let is_open_status = |entry: &FeedEntry| {
        entry
            .status
            .as_deref()
            .map(|s| open_values.iter().any(|v| v.eq_ignore_ascii_case(s.trim())))
            .unwrap_or(false)
    };

    Ok(StatusCounts {
        lifts_open: feed.lifts.iter().filter(|e| is_open_status(e)).count() as u32,
        lifts_total: feed.lifts.len() as u32,
        runs_open: feed.runs.iter().filter(|e| is_open_status(e)).count() as u32,
        runs_total: feed.runs.len() as u32,
        is_open: feed.is_open,
        message: feed.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_values() -> Vec<String> {
        vec!["open".to_string(), "open_limited".to_string()]
    }

    #[test]
    fn test_parse_counts() {
        let body = r#"{
            "message": "Powder day",
            "lifts": [
                {"name": "Pine Marten", "status": "open"},
                {"name": "Summit", "status": "OPEN_LIMITED"},
                {"name": "Northwest", "status": "closed"}
            ],
            "runs": [
                {"name": "Healy Heights", "status": "open"},
                {"name": "Cliffhanger", "status": "closed"}
            ]
        }"#;
        let counts = parse_lift_feed(body, &open_values()).unwrap();
        assert_eq!(counts.lifts_open, 2);
        assert_eq!(counts.lifts_total, 3);
        assert_eq!(counts.runs_open, 1);
        assert_eq!(counts.runs_total, 2);
        assert_eq!(counts.message.as_deref(), Some("Powder day"));
        assert_eq!(counts.is_open, None);
    }

    #[test]
    fn test_parse_explicit_flag_and_missing_runs() {
        let body = r#"{"is_open": false, "lifts": [{"name": "A", "status": "closed"}]}"#;
        let counts = parse_lift_feed(body, &open_values()).unwrap();
        assert_eq!(counts.is_open, Some(false));
        assert_eq!(counts.runs_total, 0);
    }

    #[test]
    fn test_parse_missing_status_counts_closed() {
        let body = r#"{"lifts": [{"name": "A"}, {"name": "B", "status": "open"}]}"#;
        let counts = parse_lift_feed(body, &open_values()).unwrap();
        assert_eq!(counts.lifts_open, 1);
    }

    #[test]
    fn test_parse_ignores_extra_entry_fields() {
        let body = r#"{"lifts": [
            {"status": "open"},
            {"id": 7, "name": "Chair 2", "wait_minutes": 12, "status": "open"}
        ]}"#;
        let counts = parse_lift_feed(body, &open_values()).unwrap();
        assert_eq!((counts.lifts_open, counts.lifts_total), (2, 2));
    }

    #[test]
    fn test_parse_rejects_missing_lifts() {
        let result = parse_lift_feed(r#"{"runs": []}"#, &open_values());
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_empty_lifts() {
        let result = parse_lift_feed(r#"{"lifts": []}"#, &open_values());
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_html() {
        let result = parse_lift_feed("<html>maintenance</html>", &open_values());
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }
}
