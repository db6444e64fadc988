//! Tabular output: number formatting, period-over-period change, display
//! rows for the collapsible view, and CSV export.

use crate::aggregator::GrandTotal;
use crate::expansion::{node_key, ExpansionState};
use crate::metrics::{MetricBag, MetricDef, METRIC_DEFS};
use crate::tree::CampaignNode;
use serde::Serialize;
use std::borrow::Cow;

pub const GRAND_TOTAL: &str = "Grand Total";
/// Separator between ancestor names in CSV row labels.
pub const PATH_SEPARATOR: &str = " / ";

// ─── Formatting ─────────────────────────────────────────────────────────────

/// Round to `digits` decimals with ties away from zero (`0.125` -> `0.13`).
fn round_to(value: f64, digits: usize) -> f64 {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Fixed-precision number with en-US digit grouping, e.g. `-1,234.50`.
pub fn format_number(value: f64, digits: usize) -> String {
    let fixed = format!("{:.*}", digits, round_to(value.abs(), digits));
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a metric per its definition. Missing values render as zero.
pub fn format_metric(value: Option<f64>, def: &MetricDef) -> String {
    let number = format_number(value.unwrap_or(0.0), def.digits);
    let prefix = if def.currency { "$" } else { "" };
    format!("{prefix}{number}{}", def.suffix)
}

/// `(current - prior) / prior` as a percentage with two decimals. Empty when
/// there is nothing meaningful to compare.
pub fn pct_change(current: Option<f64>, prior: Option<f64>) -> String {
    match (current, prior) {
        // `+ 0.0` folds a negative zero (no change against a negative prior).
        (Some(c), Some(p)) if p != 0.0 => {
            format!("{:.2}%", round_to((c - p) / p * 100.0, 2) + 0.0)
        }
        _ => String::new(),
    }
}

/// Quote a CSV field if it contains a comma, double quote or line break.
pub fn escape_csv(value: &str) -> Cow<'_, str> {
    if value.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

// ─── Rows ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCell {
    pub current: String,
    pub prior: String,
    pub change: String,
}

impl MetricCell {
    fn new(current: &MetricBag, prior: &MetricBag, def: &MetricDef) -> Self {
        let (c, p) = (current.get(def.key), prior.get(def.key));
        Self {
            current: format_metric(c, def),
            prior: format_metric(p, def),
            change: pct_change(c, p),
        }
    }
}

fn metric_cells(current: &MetricBag, prior: &MetricBag) -> Vec<MetricCell> {
    METRIC_DEFS
        .iter()
        .map(|def| MetricCell::new(current, prior, def))
        .collect()
}

/// One rendered line of the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct TableRow {
    pub key: String,
    pub name: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub cells: Vec<MetricCell>,
}

impl TableRow {
    /// Name, then current / prior / change for every metric.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(
            self.cells
                .iter()
                .flat_map(|c| [c.current.as_str(), c.prior.as_str(), c.change.as_str()]),
        )
    }
}

/// `Name`, then `[Label, "Label Prior", "% Change"]` per metric.
pub fn header() -> Vec<String> {
    let mut header = vec!["Name".to_string()];
    for def in &METRIC_DEFS {
        header.push(def.label.to_string());
        header.push(format!("{} Prior", def.label));
        header.push("% Change".to_string());
    }
    header
}

/// Rows visible under the given expansion state, depth-first. Children are
/// emitted only below expanded nodes.
pub fn display_rows(roots: &[CampaignNode], expansion: &dyn ExpansionState) -> Vec<TableRow> {
    let mut rows = Vec::new();
    push_display_rows(roots, 0, "", expansion, &mut rows);
    rows
}

fn push_display_rows(
    nodes: &[CampaignNode],
    depth: usize,
    parent_key: &str,
    expansion: &dyn ExpansionState,
    out: &mut Vec<TableRow>,
) {
    for (index, node) in nodes.iter().enumerate() {
        let key = node_key(parent_key, index);
        let expanded = expansion.is_expanded(&key);
        let has_children = node.has_children();
        out.push(TableRow {
            key: key.clone(),
            name: node.name.clone(),
            depth,
            has_children,
            expanded,
            cells: metric_cells(&node.current, &node.prior),
        });
        if expanded && has_children {
            push_display_rows(&node.children, depth + 1, &key, expansion, out);
        }
    }
}

pub fn grand_total_row(total: &GrandTotal) -> TableRow {
    TableRow {
        key: "total".to_string(),
        name: GRAND_TOTAL.to_string(),
        depth: 0,
        has_children: false,
        expanded: false,
        cells: metric_cells(&total.current, &total.prior),
    }
}

/// Every node, depth-first, named by its full path (`A / B / C`), followed by
/// the grand total. Fields are not yet escaped.
pub fn csv_records(roots: &[CampaignNode], total: &GrandTotal) -> Vec<Vec<String>> {
    let mut records = vec![header()];
    let mut path = Vec::new();
    push_csv_records(roots, &mut path, &mut records);
    records.push(grand_total_row(total).fields().map(String::from).collect());
    records
}

fn push_csv_records<'a>(
    nodes: &'a [CampaignNode],
    path: &mut Vec<&'a str>,
    out: &mut Vec<Vec<String>>,
) {
    for node in nodes {
        path.push(&node.name);
        let mut record = Vec::with_capacity(1 + METRIC_DEFS.len() * 3);
        record.push(path.join(PATH_SEPARATOR));
        for cell in metric_cells(&node.current, &node.prior) {
            record.extend([cell.current, cell.prior, cell.change]);
        }
        out.push(record);
        push_csv_records(&node.children, path, out);
        path.pop();
    }
}

/// Full CSV document: escaped fields, comma-delimited, `\n` between lines.
pub fn to_csv(roots: &[CampaignNode], total: &GrandTotal) -> String {
    csv_records(roots, total)
        .iter()
        .map(|record| {
            record
                .iter()
                .map(|field| escape_csv(field))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text rendering of display rows: indented names with expand markers,
/// tab-separated cells.
pub fn render_text(rows: &[TableRow], total: &TableRow) -> String {
    let mut out = header().join("\t");
    for row in rows.iter().chain(std::iter::once(total)) {
        let marker = match (row.has_children, row.expanded) {
            (false, _) => "  ",
            (true, false) => "▸ ",
            (true, true) => "▾ ",
        };
        out.push('\n');
        out.push_str(&"  ".repeat(row.depth));
        out.push_str(marker);
        out.push_str(&row.name);
        for field in row.fields().skip(1) {
            out.push('\t');
            out.push_str(field);
        }
    }
    out
}
