//! End-to-end campaign tree report: decode both periods, build and derive
//! the hierarchy, compute grand totals, and hand out tabular views.

use crate::aggregator::{derive_tree, grand_total, GrandTotal};
use crate::classifier::Classifier;
use crate::decoder::columns_to_rows;
use crate::expansion::ExpansionState;
use crate::serializer::{self, TableRow};
use crate::tree::{BuildStats, CampaignNode, Layout, TreeBuilder};
use campaign_core::config::{ExportFormat, OrphanPolicy, ReportConfig};
use campaign_core::{CampaignError, CampaignResult, CampaignRow, Period};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Grouping and orphan handling for one build.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub layout: Layout,
    pub orphan_policy: OrphanPolicy,
}

impl ReportOptions {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            layout: Layout::resolve(&config.layout, config.marketing_view),
            orphan_policy: config.orphan_policy,
        }
    }
}

/// A fully built and derived tree. Rebuilt from scratch for every input.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReport {
    pub generated_at: DateTime<Utc>,
    pub layout: Layout,
    pub roots: Vec<CampaignNode>,
    pub grand_total: GrandTotal,
    pub stats: BuildStats,
}

impl CampaignReport {
    /// Build from column-oriented JSON for both periods. Malformed input
    /// degrades to fewer rows, never to an error.
    pub fn from_columns(
        current: &serde_json::Value,
        prior: &serde_json::Value,
        options: &ReportOptions,
        classifier: &Classifier,
    ) -> Self {
        let current_rows = columns_to_rows(current);
        let prior_rows = columns_to_rows(prior);
        Self::from_rows(&current_rows, &prior_rows, options, classifier)
    }

    pub fn from_rows(
        current: &[CampaignRow],
        prior: &[CampaignRow],
        options: &ReportOptions,
        classifier: &Classifier,
    ) -> Self {
        let mut builder = TreeBuilder::new(&options.layout, classifier, options.orphan_policy);
        builder.extend(current, Period::Current);
        builder.extend(prior, Period::Prior);
        let (mut roots, stats) = builder.finish();

        derive_tree(&mut roots);
        let grand_total = grand_total(&roots);

        info!(
            current_rows = stats.current_rows,
            prior_rows = stats.prior_rows,
            roots = roots.len(),
            nodes = roots.iter().map(CampaignNode::node_count).sum::<usize>(),
            depth = options.layout.depth(),
            "Campaign tree built"
        );

        Self {
            generated_at: Utc::now(),
            layout: options.layout.clone(),
            roots,
            grand_total,
            stats,
        }
    }

    pub fn display_rows(&self, expansion: &dyn ExpansionState) -> Vec<TableRow> {
        serializer::display_rows(&self.roots, expansion)
    }

    pub fn grand_total_row(&self) -> TableRow {
        serializer::grand_total_row(&self.grand_total)
    }

    pub fn render_text(&self, expansion: &dyn ExpansionState) -> String {
        serializer::render_text(&self.display_rows(expansion), &self.grand_total_row())
    }

    pub fn to_csv(&self) -> String {
        serializer::to_csv(&self.roots, &self.grand_total)
    }

    pub fn to_json(&self) -> CampaignResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the export to `path` and return the number of bytes written.
    pub fn write(&self, path: &Path, format: ExportFormat) -> CampaignResult<usize> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(CampaignError::Export(format!(
                    "output directory {} does not exist",
                    dir.display()
                )));
            }
        }
        let body = match format {
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Json => self.to_json()?,
        };
        std::fs::write(path, body.as_bytes())?;
        info!(path = %path.display(), bytes = body.len(), format = ?format, "Report exported");
        Ok(body.len())
    }
}

/// Default export location: `<dir>/<file_name>`.
pub fn export_path(output_dir: &str, file_name: &str) -> PathBuf {
    Path::new(output_dir).join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::ExpandedKeys;
    use crate::metrics::MetricKey;
    use serde_json::json;

    fn options(keys: &[&str]) -> ReportOptions {
        let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        ReportOptions {
            layout: Layout::resolve(&names, false),
            orphan_policy: OrphanPolicy::Drop,
        }
    }

    #[test]
    fn test_from_columns() {
        let current = json!({
            "New_mapping": ["Email", "Direct"],
            "Campaign_Nm": ["E1", "D1"],
            "Cost": [10, 20],
        });
        let prior = json!({
            "New_mapping": ["Email"],
            "Campaign_Nm": ["E1"],
            "Cost": [5],
        });
        let report = CampaignReport::from_columns(
            &current,
            &prior,
            &options(&["New_mapping", "Campaign_Nm"]),
            &Classifier::new(),
        );

        assert_eq!(report.roots.len(), 2);
        assert_eq!(report.stats.current_rows, 2);
        assert_eq!(report.stats.prior_rows, 1);
        assert_eq!(report.grand_total.current.get(MetricKey::Cost), Some(30.0));
        assert_eq!(report.grand_total.prior.get(MetricKey::Cost), Some(5.0));

        let rows = report.display_rows(&ExpandedKeys::new());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells[0].change, "100.00%");
    }

    #[test]
    fn test_malformed_input_yields_empty_report() {
        let report = CampaignReport::from_columns(
            &json!(null),
            &json!("garbage"),
            &ReportOptions::default(),
            &Classifier::new(),
        );
        assert!(report.roots.is_empty());
        assert!(report.grand_total.current.is_empty());

        let csv = report.to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Grand Total,$0.00,$0.00,,"));
    }

    #[test]
    fn test_json_export_shape() {
        let current = json!({"Campaign_Nm": ["A"], "Cost": [4], "Link_Clicks": [2]});
        let report = CampaignReport::from_columns(
            &current,
            &json!({}),
            &options(&["Campaign_Nm"]),
            &Classifier::new(),
        );
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["roots"][0]["name"], "A");
        assert_eq!(value["roots"][0]["current"]["CPC"], 2.0);
        assert_eq!(value["grand_total"]["current"]["Cost"], 4.0);
        assert!(value["roots"][0].get("children").is_none());
        assert_eq!(value["layout"]["keys"][0]["field"], "Campaign_Nm");
    }

    #[test]
    fn test_write_csv() {
        let current = json!({"Campaign_Nm": ["A"], "Cost": [1]});
        let report = CampaignReport::from_columns(
            &current,
            &json!({}),
            &options(&["Campaign_Nm"]),
            &Classifier::new(),
        );
        let dir = std::env::temp_dir();
        let path = export_path(
            dir.to_str().unwrap(),
            &format!("campaign_data-{}.csv", std::process::id()),
        );
        let written = report.write(&path, ExportFormat::Csv).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written, contents.len());
        assert_eq!(contents, report.to_csv());
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let report = CampaignReport::from_rows(&[], &[], &ReportOptions::default(), &Classifier::new());
        let path = std::env::temp_dir()
            .join("campaign-tree-missing-dir")
            .join("campaign_data.csv");
        let err = report.write(&path, ExportFormat::Csv).unwrap_err();
        assert!(matches!(err, CampaignError::Export(_)));
    }
}
