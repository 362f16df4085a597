//! Adapter for pages that only state counts in prose ("5 of 8 lifts open").

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::{AdapterError, PageFetcher, SourceAdapter, StatusCounts, StatusSnapshot};
use crate::registry::ScrapeTarget;

static NON_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?</script>|<style.*?</style>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static LIFTS_TRAILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:out of|of|/)\s*(\d+)\s+(?:chair)?lifts?\b").unwrap()
});
static LIFTS_LEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\blifts?(?:\s+open)?\s*:\s*(\d+)\s*(?:out of|of|/)\s*(\d+)").unwrap()
});
static RUNS_TRAILING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:out of|of|/)\s*(\d+)\s+(?:runs?|trails?)\b").unwrap()
});
static RUNS_LEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:runs?|trails?)(?:\s+open)?\s*:\s*(\d+)\s*(?:out of|of|/)\s*(\d+)")
        .unwrap()
});
static CLOSED_FOR_SEASON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)closed for (?:the )?season").unwrap());

pub struct TextSummaryAdapter {
    fetcher: PageFetcher,
}

impl TextSummaryAdapter {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceAdapter for TextSummaryAdapter {
    fn name(&self) -> &str {
        "text_summary"
    }

    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError> {
        let body = self.fetcher.fetch_text(&target.url).await?;
        let counts = parse_text_summary(&body)?;
        Ok(counts.into_snapshot(target, Utc::now()))
    }
}

fn visible_text(body: &str) -> String {
    let without_scripts = NON_CONTENT.replace_all(body, " ");
    let without_tags = TAG.replace_all(&without_scripts, " ");
    without_tags
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First match wins; the labelled "Lifts: N of M" form is tried before prose.
fn count_pair(text: &str, patterns: [&Regex; 2]) -> Result<Option<(u32, u32)>, AdapterError> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            let open: u32 = caps[1]
                .parse()
                .map_err(|e| AdapterError::Parse(format!("bad count {:?}: {}", &caps[1], e)))?;
            let total: u32 = caps[2]
                .parse()
                .map_err(|e| AdapterError::Parse(format!("bad count {:?}: {}", &caps[2], e)))?;
            if open > total {
                return Err(AdapterError::Parse(format!(
                    "implausible count {} of {}",
                    open, total
                )));
            }
            return Ok(Some((open, total)));
        }
    }
    Ok(None)
}

/// Extract lift and run counts from prose. A "closed for the season" notice
/// without counts yields an all-zero, closed status.
pub fn parse_text_summary(body: &str) -> Result<StatusCounts, AdapterError> {
    let text = visible_text(body);
    let closed_for_season = CLOSED_FOR_SEASON.is_match(&text);

    let lifts = count_pair(&text, [&LIFTS_LEADING, &LIFTS_TRAILING])?;
    let runs = count_pair(&text, [&RUNS_LEADING, &RUNS_TRAILING])?;

    let (lifts_open, lifts_total) = match (lifts, closed_for_season) {
        (Some(pair), _) => pair,
        (None, true) => (0, 0),
        (None, false) => {
            return Err(AdapterError::Parse("no lift count found in page text".to_string()))
        }
    };
    let (runs_open, runs_total) = runs.unwrap_or((0, 0));

    Ok(StatusCounts {
        lifts_open,
        lifts_total,
        runs_open,
        runs_total,
        is_open: closed_for_season.then_some(false),
        message: closed_for_season.then(|| "Closed for the season".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_phrasing() {
        let html = "<div><h2>Today</h2><p>5 of 8 lifts open</p><p>42 / 60 runs groomed and open</p></div>";
        let counts = parse_text_summary(html).unwrap();
        assert_eq!((counts.lifts_open, counts.lifts_total), (5, 8));
        assert_eq!((counts.runs_open, counts.runs_total), (42, 60));
        assert_eq!(counts.is_open, None);
    }

    #[test]
    fn test_leading_phrasing_across_tags() {
        let html = "<li>Lifts Open: <b>3</b> of <b>10</b></li><li>Trails: 12 out of 71</li>";
        let counts = parse_text_summary(html).unwrap();
        assert_eq!((counts.lifts_open, counts.lifts_total), (3, 10));
        assert_eq!((counts.runs_open, counts.runs_total), (12, 71));
    }

    #[test]
    fn test_ignores_script_content() {
        let html = "<script>var x = '9 of 9 lifts';</script><p>2 of 9 lifts</p>";
        let counts = parse_text_summary(html).unwrap();
        assert_eq!(counts.lifts_open, 2);
    }

    #[test]
    fn test_closed_for_season() {
        let html = "<p>Thanks for a great winter! We are CLOSED FOR THE SEASON.</p>";
        let counts = parse_text_summary(html).unwrap();
        assert_eq!(counts.is_open, Some(false));
        assert_eq!(counts.lifts_total, 0);
        assert_eq!(counts.message.as_deref(), Some("Closed for the season"));
    }

    #[test]
    fn test_no_counts_is_parse_error() {
        let result = parse_text_summary("<p>Check back soon</p>");
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }

    #[test]
    fn test_implausible_counts_rejected() {
        let result = parse_text_summary("<p>9 of 4 lifts</p>");
        assert!(matches!(result, Err(AdapterError::Parse(_))));
    }
}
