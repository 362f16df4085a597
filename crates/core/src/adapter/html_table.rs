//! CSS-selector driven adapter for HTML lift and trail listings.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};

use super::{AdapterError, PageFetcher, SourceAdapter, StatusCounts, StatusSnapshot};
use crate::registry::ScrapeTarget;

/// Per-resort extraction rules.
#[derive(Debug, Clone)]
pub struct TableRules {
    pub lift_selector: String,
    pub run_selector: String,
    /// Class token, `data-status` value or word marking an open row.
    pub open_marker: String,
    pub message_selector: Option<String>,
}

pub struct HtmlTableAdapter {
    fetcher: PageFetcher,
    rules: TableRules,
}

impl HtmlTableAdapter {
    pub fn new(fetcher: PageFetcher, rules: TableRules) -> Self {
        Self { fetcher, rules }
    }
}

#[async_trait]
impl SourceAdapter for HtmlTableAdapter {
    fn name(&self) -> &str {
        "html_table"
    }

    async fn fetch_status(&self, target: &ScrapeTarget) -> Result<StatusSnapshot, AdapterError> {
        let html = self.fetcher.fetch_text(&target.url).await?;
        // The parsed document is not Send; keep it inside this synchronous call.
        let counts = parse_status_table(&html, &self.rules)?;
        Ok(counts.into_snapshot(target, Utc::now()))
    }
}

fn selector(raw: &str) -> Result<Selector, AdapterError> {
    Selector::parse(raw).map_err(|e| AdapterError::Parse(format!("bad selector {:?}: {}", raw, e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A `data-status` attribute decides on its own. Otherwise a marker class
/// wins, and the row text is the last resort.
fn row_is_open(row: &ElementRef, marker: &str) -> bool {
    let element = row.value();

    if let Some(status) = element.attr("data-status") {
        return status.trim().eq_ignore_ascii_case(marker);
    }

    let suffix = format!("-{}", marker);
    if element.classes().any(|c| {
        let c = c.to_ascii_lowercase();
        c == marker || c.ends_with(&suffix)
    }) {
        return true;
    }

    text_says_open(row, marker)
}

/// Whole-word match on the row text. "Not open" and "no open" do not count.
fn text_says_open(row: &ElementRef, marker: &str) -> bool {
    let words: Vec<String> = row
        .text()
        .flat_map(|t| t.split(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect();

    words.iter().enumerate().any(|(i, word)| {
        word == marker && !(i > 0 && matches!(words[i - 1].as_str(), "not" | "no"))
    })
}

/// Count open lift and run rows in `html` according to `rules`.
pub fn parse_status_table(html: &str, rules: &TableRules) -> Result<StatusCounts, AdapterError> {
    let document = Html::parse_document(html);
    let marker = rules.open_marker.to_ascii_lowercase();

    let lift_selector = selector(&rules.lift_selector)?;
    let run_selector = selector(&rules.run_selector)?;

    let lifts: Vec<ElementRef> = document.select(&lift_selector).collect();
    if lifts.is_empty() {
        return Err(AdapterError::Parse(format!(
            "no lifts matched {:?}",
            rules.lift_selector
        )));
    }
    let runs: Vec<ElementRef> = document.select(&run_selector).collect();

    let message = match &rules.message_selector {
        Some(raw) => {
            let message_selector = selector(raw)?;
            document
                .select(&message_selector)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        }
        None => None,
    };

    Ok(StatusCounts {
        lifts_open: lifts.iter().filter(|r| row_is_open(r, &marker)).count() as u32,
        lifts_total: lifts.len() as u32,
        runs_open: runs.iter().filter(|r| row_is_open(r, &marker)).count() as u32,
        runs_total: runs.len() as u32,
        is_open: None,
        message,
    })
}
