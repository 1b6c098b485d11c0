//! Formatted terminal output for `fp show` and `fp views`.

use crate::chart::{ChartArtifact, ChartBody};
use crate::domain::{Cell, DerivedTable, ViewKind};
use crate::io::ingest::LoadSummary;
use crate::view::RenderedView;

/// Widest text column before truncation.
const TEXT_WIDTH: usize = 28;
const NUM_WIDTH: usize = 12;

/// Format every panel of a rendered view.
pub fn format_view(view: &RenderedView) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", view.title));

    if let Some(text) = &view.text {
        out.push_str(text);
        out.push('\n');
    }

    for panel in &view.panels {
        out.push('\n');
        if let Some(heading) = &panel.heading {
            out.push_str(&format!("{heading}\n"));
        }
        out.push_str(&format!("{}\n", panel.title));
        if panel.table.is_empty() {
            out.push_str("(no data for this selection)\n");
            continue;
        }
        out.push_str(&format_table(&panel.table));
        match &panel.chart {
            Some(chart) => {
                if let Some(note) = chart_note(chart) {
                    out.push_str(&note);
                    out.push('\n');
                }
            }
            None => out.push_str("(chart unavailable)\n"),
        }
    }

    out
}

/// Format the list of available views.
pub fn format_view_list() -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<18} {}\n", "view", "title"));
    out.push_str(&format!("{:-<18} {:-<32}\n", "", ""));
    for kind in ViewKind::ALL {
        out.push_str(&format!("{:<18} {}\n", kind.slug(), kind.title()));
    }
    out
}

/// One-line load summary.
pub fn format_load_summary(source: &str, summary: &LoadSummary) -> String {
    let mut line = format!(
        "Loaded {} of {} rows from {source}",
        summary.rows_used, summary.rows_read
    );
    if !summary.row_errors.is_empty() {
        line.push_str(&format!(" ({} rejected)", summary.row_errors.len()));
    }
    line
}

fn format_table(table: &DerivedTable) -> String {
    let mut out = String::new();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(column_kinds(table))
        .map(|(field, numeric)| pad(field.label(), numeric))
        .collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');

    let rule: Vec<String> = column_kinds(table)
        .map(|numeric| "-".repeat(if numeric { NUM_WIDTH } else { TEXT_WIDTH }))
        .collect();
    out.push_str(&rule.join(" "));
    out.push('\n');

    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Cell::Number(v) => format!("{v:>NUM_WIDTH$.2}"),
                Cell::Date(d) => pad(&d.to_string(), false),
                Cell::Text(s) => pad(&truncate(s, TEXT_WIDTH), false),
            })
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }

    out
}

/// Whether each column holds numbers (judged from the first row).
fn column_kinds(table: &DerivedTable) -> impl Iterator<Item = bool> + '_ {
    let first = table.rows.first();
    (0..table.columns.len()).map(move |i| {
        matches!(first.and_then(|r| r.get(i)), Some(Cell::Number(_)))
    })
}

fn pad(s: &str, numeric: bool) -> String {
    if numeric {
        format!("{s:>NUM_WIDTH$}")
    } else {
        format!("{s:<TEXT_WIDTH$}")
    }
}

fn chart_note(chart: &ChartArtifact) -> Option<String> {
    match &chart.body {
        ChartBody::ScatterTrend {
            trend: Some(trend), ..
        } => Some(format!(
            "trend: {} = {:.4} + {:.4} * {} (R² = {:.3})",
            chart.y_label, trend.intercept, trend.slope, chart.x_label, trend.r_squared
        )),
        ChartBody::Box { groups } => {
            let mut out = String::from("\nquartiles:\n");
            for g in groups {
                out.push_str(&format!(
                    "{:<TEXT_WIDTH$} n={:<5} q1={:.2} median={:.2} q3={:.2} whiskers=[{:.2}, {:.2}] outliers={}\n",
                    truncate(&g.label, TEXT_WIDTH),
                    g.stats.count,
                    g.stats.q1,
                    g.stats.median,
                    g.stats.q3,
                    g.stats.lower_whisker,
                    g.stats.upper_whisker,
                    g.stats.outliers.len(),
                ));
            }
            Some(out.trim_end().to_string())
        }
        _ => None,
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
