use super::{AdapterKind, ScrapeTarget};

fn target(resort_id: &str, name: &str, url: &str, batch: u8, strategy: AdapterKind) -> ScrapeTarget {
    ScrapeTarget {
        resort_id: resort_id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        batch,
        strategy,
    }
}

fn lift_feed(open_values: &[&str]) -> AdapterKind {
    AdapterKind::LiftFeedJson {
        open_values: open_values.iter().map(|v| v.to_string()).collect(),
    }
}

fn html_table(lift_selector: &str, run_selector: &str, message_selector: Option<&str>) -> AdapterKind {
    AdapterKind::HtmlTable {
        lift_selector: lift_selector.to_string(),
        run_selector: run_selector.to_string(),
        open_marker: "open".to_string(),
        message_selector: message_selector.map(String::from),
    }
}

/// Built-in roster: fifteen Washington, Oregon and Idaho resorts in three batches of five.
pub fn builtin_targets() -> Vec<ScrapeTarget> {
    vec![
        // Batch 1
        target(
            "baker",
            "Mt. Baker",
            "https://www.mtbaker.us/snow-report/",
            1,
            AdapterKind::TextSummary,
        ),
        target(
            "stevens",
            "Stevens Pass",
            "https://www.stevenspass.com/the-mountain/mountain-conditions/terrain-and-lift-status.aspx",
            1,
            AdapterKind::TerrainFeedScript,
        ),
        target(
            "crystal",
            "Crystal Mountain",
            "https://www.crystalmountainresort.com/the-mountain/mountain-report-and-webcams/",
            1,
            html_table(".lift-status-row", ".trail-status-row", Some(".conditions-message")),
        ),
        target(
            "snoqualmie",
            "Summit at Snoqualmie",
            "https://summitatsnoqualmie.com/conditions",
            1,
            html_table("li.lift", "li.trail", Some(".alert-banner")),
        ),
        target(
            "whitepass",
            "White Pass",
            "https://skiwhitepass.com/the-mountain/snow-report",
            1,
            AdapterKind::TextSummary,
        ),
        // Batch 2
        target(
            "missionridge",
            "Mission Ridge",
            "https://www.missionridge.com/mountain-report/",
            2,
            AdapterKind::TextSummary,
        ),
        target(
            "fortynine",
            "49 Degrees North",
            "https://ski49n.com/mountain-info/lift-and-trail-status",
            2,
            html_table("table.lifts tr.lift", "table.trails tr.trail", None),
        ),
        target(
            "meadows",
            "Mt. Hood Meadows",
            "https://api.skihood.com/conditions/lifts.json",
            2,
            lift_feed(&["open", "opening soon"]),
        ),
        target(
            "timberline",
            "Timberline Lodge",
            "https://www.timberlinelodge.com/conditions",
            2,
            AdapterKind::TextSummary,
        ),
        target(
            "bachelor",
            "Mt. Bachelor",
            "https://api.mtbachelor.com/api/v1/conditions/lifts",
            2,
            lift_feed(&["open", "open_limited"]),
        ),
        // Batch 3
        target(
            "ashland",
            "Mt. Ashland",
            "https://www.mtashland.com/snow-report",
            3,
            AdapterKind::TextSummary,
        ),
        target(
            "willamette",
            "Willamette Pass",
            "https://www.willamettepass.ski/conditions",
            3,
            html_table(".lift-list .lift", ".run-list .run", Some(".status-message")),
        ),
        target(
            "hoodoo",
            "Hoodoo Ski Area",
            "https://skihoodoo.com/conditions/",
            3,
            AdapterKind::TextSummary,
        ),
        target(
            "anthonylakes",
            "Anthony Lakes",
            "https://www.anthonylakes.com/conditions",
            3,
            AdapterKind::TextSummary,
        ),
        target(
            "schweitzer",
            "Schweitzer Mountain",
            "https://www.schweitzer.com/api/conditions/lifts",
            3,
            lift_feed(&["open"]),
        ),
    ]
}
