//! Campaign Tree: current vs prior campaign performance, grouped into a
//! collapsible hierarchy and exported as CSV or JSON.

use anyhow::Context;
use campaign_core::config::{AppConfig, ExportFormat};
use campaign_core::{CampaignError, CampaignResult};
use campaign_reporting::report::export_path;
use campaign_reporting::{
    CampaignReport, Classifier, ExpandAll, ExpandedKeys, ExpansionState, MarketingGroup,
    ReportOptions,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-tree")]
#[command(about = "Hierarchical campaign performance report with period-over-period comparison")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./campaign-tree.toml when present)
    #[arg(long, global = true, env = "CAMPAIGN_TREE_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the hierarchy as an indented, tab-separated table
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Node key to expand (e.g. -0, -0-1); repeatable
        #[arg(long = "expand")]
        expand: Vec<String>,

        /// Expand every node
        #[arg(long, default_value_t = false)]
        expand_all: bool,
    },

    /// Write the full hierarchy to a file
    Export {
        #[command(flatten)]
        input: InputArgs,

        /// Output format (overrides config)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Output path (default: <export.output_dir>/<export.file_name>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how a campaign mapping label is classified
    Classify {
        /// Mapping label, e.g. "Facebook Prospecting Campaign Items"
        label: String,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Current period, column-oriented JSON ({"Cost": [..], ...})
    #[arg(short, long)]
    data: PathBuf,

    /// Prior period, same shape (omit for an empty comparison)
    #[arg(short, long)]
    prior: Option<PathBuf>,

    /// Comma-separated grouping keys (overrides config)
    #[arg(long, value_delimiter = ',')]
    layout: Option<Vec<String>>,

    /// Prepend the Marketing / Non-Marketing split
    #[arg(long, default_value_t = false)]
    marketing: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campaign_tree=info,campaign_reporting=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) if cli.config.is_some() => return Err(e).context("Failed to load config"),
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }
    };
    let classifier = Classifier::with_overrides(&config.classification.overrides);

    match cli.command {
        Commands::Render {
            input,
            expand,
            expand_all,
        } => {
            let report = build_report(&input, &config, &classifier)?;
            let expansion: Box<dyn ExpansionState> = if expand_all {
                Box::new(ExpandAll)
            } else {
                Box::new(expand.into_iter().collect::<ExpandedKeys>())
            };
            println!("{}", report.render_text(expansion.as_ref()));
        }
        Commands::Export {
            input,
            format,
            output,
        } => {
            let report = build_report(&input, &config, &classifier)?;
            let format = format.map(ExportFormat::from).unwrap_or(config.export.format);
            let path = output.unwrap_or_else(|| {
                export_path(&config.export.output_dir, &config.export.file_name)
            });
            let bytes = report
                .write(&path, format)
                .with_context(|| format!("Failed to export to {}", path.display()))?;
            println!("Report written to: {} ({bytes} bytes)", path.display());
        }
        Commands::Classify { label } => {
            let normalized = campaign_reporting::classifier::normalize_label(&label);
            let info = classifier.classify_label(&label);
            println!("Label:      {normalized}");
            println!("Top:        {}", info.top);
            println!("Mid:        {}", info.mid);
            println!("Group:      {}", MarketingGroup::from_top(&info.top).as_str());
        }
    }

    Ok(())
}

fn build_report(
    input: &InputArgs,
    config: &AppConfig,
    classifier: &Classifier,
) -> anyhow::Result<CampaignReport> {
    let current = read_columns(&input.data)
        .with_context(|| format!("Failed to read current data from {}", input.data.display()))?;
    let prior = match &input.prior {
        Some(path) => read_columns(path)
            .with_context(|| format!("Failed to read prior data from {}", path.display()))?,
        None => serde_json::Value::Null,
    };

    let mut report_config = config.report.clone();
    if let Some(layout) = &input.layout {
        report_config.layout = layout.clone();
    }
    if input.marketing {
        report_config.marketing_view = true;
    }
    let options = ReportOptions::from_config(&report_config);

    info!(
        layout = ?options.layout.keys().iter().map(|k| k.name()).collect::<Vec<_>>(),
        orphan_policy = ?options.orphan_policy,
        "Building campaign tree"
    );

    Ok(CampaignReport::from_columns(
        &current, &prior, &options, classifier,
    ))
}

/// Parse a columnar JSON input file. A readable document of the wrong shape
/// is accepted here and decodes to no rows later.
fn read_columns(path: &Path) -> CampaignResult<serde_json::Value> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| CampaignError::Input(format!("{} is not valid JSON: {e}", path.display())))
}
