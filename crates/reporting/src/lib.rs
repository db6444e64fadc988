//! Campaign performance reporting: classifies raw campaign rows, builds a
//! collapsible current-vs-prior hierarchy, derives efficiency metrics, and
//! exports the result as text, CSV, or JSON.

pub mod aggregator;
pub mod classifier;
pub mod decoder;
pub mod expansion;
pub mod metrics;
pub mod report;
pub mod serializer;
pub mod tree;

pub use aggregator::{derive_metrics, derive_tree, grand_total, GrandTotal};
pub use classifier::{Classification, Classifier, MarketingGroup};
pub use decoder::columns_to_rows;
pub use expansion::{ExpandAll, ExpandedKeys, ExpansionState};
pub use metrics::{MetricBag, MetricDef, MetricKey, METRIC_DEFS};
pub use report::{CampaignReport, ReportOptions};
pub use tree::{CampaignNode, GroupingKey, Layout, TreeBuilder};
