use crate::error::CampaignResult;
use serde::Deserialize;
use std::path::Path;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "campaign-tree.toml";

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CAMPAIGN_TREE__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Grouping keys, outermost first. Empty falls back to the default layout.
    #[serde(default = "default_layout")]
    pub layout: Vec<String>,
    /// Prepend the Marketing / Non-Marketing split to the layout.
    #[serde(default)]
    pub marketing_view: bool,
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

/// What happens to a row that runs out of grouping levels without
/// landing in any node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Discard the row's contribution (it is missing from every total).
    #[default]
    Drop,
    /// Collect such rows under a root-level `Unassigned` node.
    Bucket,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassificationConfig {
    /// Extra labels merged over the built-in classification table.
    #[serde(default)]
    pub overrides: Vec<ClassificationOverride>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationOverride {
    pub label: String,
    pub top: String,
    pub mid: String,
}

// Default functions
pub fn default_layout() -> Vec<String> {
    vec![
        "topClassification".to_string(),
        "secondClassification".to_string(),
        "New_mapping".to_string(),
        "Campaign_Nm".to_string(),
    ]
}
fn default_file_name() -> String {
    "campaign_data.csv".to_string()
}
fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            marketing_view: false,
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            output_dir: default_output_dir(),
            format: ExportFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> CampaignResult<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder().add_source(file).add_source(
            config::Environment::with_prefix("CAMPAIGN_TREE")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("report.layout"),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
