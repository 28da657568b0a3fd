use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::audit::OverallReport;
use crate::compare::{DiffEntry, Direction};
use crate::engine::ReportOutcome;
use crate::snapshot::SnapshotRef;

pub fn render_overall_table(report: &OverallReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value (ms)"]);
    for (key, value) in report.iter() {
        table.add_row(vec![key.to_string(), format!("{value:.1}")]);
    }
    table.to_string()
}

pub fn render_diff_table(entries: &[DiffEntry]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Previous", "Current", "Change", "Verdict"]);

    for entry in entries {
        let verdict = match entry.direction {
            Direction::Slower => Cell::new("SLOWER").fg(Color::Red),
            Direction::Faster => Cell::new("FASTER").fg(Color::Green),
            Direction::Unchanged => Cell::new("UNCHANGED"),
        };
        let change = match entry.direction {
            Direction::Unchanged => "-".to_string(),
            _ => format!("{}%", entry.percentage_change),
        };
        table.add_row(Row::from(vec![
            Cell::new(&entry.title),
            Cell::new(format!("{:.1}", entry.previous)),
            Cell::new(format!("{:.1}", entry.current)),
            Cell::new(change),
            verdict,
        ]));
    }
    table.to_string()
}

pub fn render_snapshot_table(snapshots: &[SnapshotRef]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Captured", "Key", "Location"]);
    for (idx, snapshot) in snapshots.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            snapshot.timestamp.to_rfc3339(),
            snapshot.key.clone(),
            snapshot.location.display().to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_outcome(outcome: &ReportOutcome) -> String {
    let mut out = String::new();
    out.push_str(&render_overall_table(&outcome.overall_report));
    match (&outcome.compared_report, &outcome.baseline) {
        (Some(entries), Some(baseline)) => {
            out.push_str(&format!("\nCompared with {}\n", baseline.key));
            out.push_str(&render_diff_table(entries));
        }
        (None, Some(baseline)) => {
            out.push_str(&format!(
                "\nComparison with {} unavailable, see log for details",
                baseline.key
            ));
        }
        _ => out.push_str("\nNo baseline report, comparison skipped"),
    }
    out.push_str(&format!(
        "\nReport stored at {}",
        outcome.storage_location.display()
    ));
    out
}
