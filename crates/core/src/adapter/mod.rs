//! Source adapters: one per resort, each reading one upstream page format
//! into a normalized [`StatusSnapshot`].

mod fetcher;
mod html_table;
mod lift_feed;
mod registry;
mod terrain_feed;
mod text_summary;
mod types;

pub use fetcher::PageFetcher;
pub use html_table::{parse_status_table, HtmlTableAdapter, TableRules};
pub use lift_feed::{parse_lift_feed, LiftFeedAdapter};
pub use registry::{build_adapter, AdapterRegistry};
pub use terrain_feed::{parse_terrain_feed, TerrainFeedAdapter};
pub use text_summary::{parse_text_summary, TextSummaryAdapter};
pub use types::*;
