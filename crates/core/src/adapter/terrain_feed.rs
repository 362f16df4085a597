//! Adapter for pages that embed a `TerrainStatusFeed` JavaScript object.
//!
//! The object holds `Lifts` with a numeric `Status` (0 closed, 1 open,
//! 2 on hold, 3 scheduled) and `GroomingAreas` whose `Trails` carry `IsOpen`.

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

use super::{AdapterError, PageFetcher, SourceAdapter, StatusCounts, StatusSnapshot};
use crate::registry::ScrapeTarget;

const LIFT_STATUS_OPEN: i64 = 1;

static FEED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)TerrainStatusFeed\s*=\s*(\{.*?\})\s*;").unwrap());

pub struct TerrainFeedAdapter {
    fetcher: PageFetcher,
}

impl TerrainFeedAdapter {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceAdapter for TerrainFeedAdapter {
    fn name(&self) -> &str {
        "terrain_feed_script"
    }

    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError> {
        let html = self.fetcher.fetch_text(&target.url).await?;
        let counts = parse_terrain_feed(&html)?;
        Ok(counts.into_snapshot(target, Utc::now()))
    }
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct TerrainFeed {
    Lifts: Vec<FeedLift>,
    #[serde(default)]
    GroomingAreas: Vec<GroomingArea>,
    #[serde(default)]
    ResortMessage: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct FeedLift {
    #[serde(default)]
    Status: i64,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct GroomingArea {
    #[serde(default)]
    Trails: Vec<FeedTrail>,
}

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct FeedTrail {
    #[serde(default)]
    IsOpen: bool,
}

/// Locate the embedded feed in `html` and count open lifts and trails.
pub fn parse_terrain_feed(html: &str) -> Result<StatusCounts, AdapterError> {
    let json = FEED_PATTERN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| AdapterError::Parse("TerrainStatusFeed not found in page".to_string()))?;

    let feed: TerrainFeed = serde_json::from_str(json)
        .map_err(|e| AdapterError::Parse(format!("invalid TerrainStatusFeed: {}", e)))?;

    if feed.Lifts.is_empty() {
        return Err(AdapterError::Parse("TerrainStatusFeed has no lifts".to_string()));
    }

    let trails: Vec<&FeedTrail> = feed.GroomingAreas.iter().flat_map(|a| &a.Trails).collect();

    Ok(StatusCounts {
        lifts_open: feed
            .Lifts
            .iter()
            .filter(|l| l.Status == LIFT_STATUS_OPEN)
            .count() as u32,
        lifts_total: feed.Lifts.len() as u32,
        runs_open: trails.iter().filter(|t| t.IsOpen).count() as u32,
        runs_total: trails.len() as u32,
        is_open: None,
        message: feed.ResortMessage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><head>
<script type="text/javascript">
    FR.TerrainStatusFeed = {"Lifts":[{"Name":"Hogsback Express","Status":1},{"Name":"Brooks","Status":0},{"Name":"Tye Mill","Status":2}],
    "GroomingAreas":[{"Name":"Front","Trails":[{"Name":"Skyline","IsOpen":true},{"Name":"Aquarius","IsOpen":false}]},
                     {"Name":"Back","Trails":[{"Name":"Pegasus","IsOpen":true}]}],
    "ResortMessage":"Night skiing tonight"};
    FR.Other = {};
</script></head><body></body></html>"#;

    #[test]
    fn test_parse_embedded_feed() {
        let counts = parse_terrain_feed(PAGE).unwrap();
        assert_eq!(counts.lifts_open, 1);
        assert_eq!(counts.lifts_total, 3);
        assert_eq!(counts.runs_open, 2);
        assert_eq!(counts.runs_total, 3);
        assert_eq!(counts.message.as_deref(), Some("Night skiing tonight"));
    }

    #[test]
    fn test_missing_feed_is_parse_error() {
        let result = parse_terrain_feed("<html><body>No script here</body></html>");
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_malformed_feed_is_parse_error() {
        let result = parse_terrain_feed("<script>TerrainStatusFeed = {Lifts: nope};</script>");
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_feed_without_trails() {
        let html = r#"<script>TerrainStatusFeed = {"Lifts":[{"Status":1}]};</script>"#;
        let counts = parse_terrain_feed(html).unwrap();
        assert_eq!(counts.lifts_open, 1);
        assert_eq!(counts.runs_total, 0);
    }
}
