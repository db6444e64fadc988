//! Hierarchy construction: groups rows into nested campaign nodes along an
//! ordered list of grouping keys, accumulating both periods into one tree.

use crate::classifier::Classifier;
use crate::metrics::MetricBag;
use campaign_core::config::{default_layout, OrphanPolicy};
use campaign_core::{CampaignRow, Period};
use serde::Serialize;
use tracing::{debug, warn};

/// Label treated the same as an empty grouping value.
pub const UNNAMED: &str = "(Unnamed)";
/// Root node collecting orphaned rows under [`OrphanPolicy::Bucket`].
pub const UNASSIGNED: &str = "Unassigned";

// ─── Layout ─────────────────────────────────────────────────────────────────

/// One level of nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingKey {
    /// "Marketing" / "Non-Marketing", derived from the top classification.
    MarketingClassification,
    TopClassification,
    SecondClassification,
    /// A literal row field.
    Field(String),
}

impl GroupingKey {
    pub fn parse(name: &str) -> Self {
        match name {
            "marketingClassification" => GroupingKey::MarketingClassification,
            "topClassification" => GroupingKey::TopClassification,
            "secondClassification" => GroupingKey::SecondClassification,
            other => GroupingKey::Field(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GroupingKey::MarketingClassification => "marketingClassification",
            GroupingKey::TopClassification => "topClassification",
            GroupingKey::SecondClassification => "secondClassification",
            GroupingKey::Field(name) => name,
        }
    }

    pub fn is_virtual(&self) -> bool {
        !matches!(self, GroupingKey::Field(_))
    }

    /// Grouping value for a row, or `None` when the level should be skipped.
    pub fn resolve(&self, row: &CampaignRow, classifier: &Classifier) -> Option<String> {
        let value = match self {
            GroupingKey::MarketingClassification => {
                classifier.marketing_group(row).as_str().to_string()
            }
            GroupingKey::TopClassification => classifier.top_level(row),
            GroupingKey::SecondClassification => classifier.second_level(row),
            GroupingKey::Field(field) => row.label(field)?,
        };
        if value.is_empty() || value == UNNAMED {
            None
        } else {
            Some(value)
        }
    }
}

/// Ordered grouping keys; tree depth equals position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    keys: Vec<GroupingKey>,
}

impl Layout {
    /// Build a layout from configured key names. An empty list falls back to
    /// the default four levels; `marketing_view` prepends the marketing split.
    pub fn resolve(names: &[String], marketing_view: bool) -> Self {
        let base = if names.is_empty() {
            default_layout()
        } else {
            names.to_vec()
        };
        let mut keys = Vec::with_capacity(base.len() + 1);
        if marketing_view {
            keys.push(GroupingKey::MarketingClassification);
        }
        keys.extend(base.iter().map(|n| GroupingKey::parse(n)));
        Self { keys }
    }

    pub fn keys(&self) -> &[GroupingKey] {
        &self.keys
    }

    pub fn depth(&self) -> usize {
        self.keys.len()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::resolve(&[], false)
    }
}

// ─── Tree ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CampaignNode {
    pub name: String,
    pub current: MetricBag,
    pub prior: MetricBag,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CampaignNode>,
}

impl CampaignNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: MetricBag::new(),
            prior: MetricBag::new(),
            children: Vec::new(),
        }
    }

    pub fn metrics_mut(&mut self, period: Period) -> &mut MetricBag {
        match period {
            Period::Current => &mut self.current,
            Period::Prior => &mut self.prior,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child(&self, name: &str) -> Option<&CampaignNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// This node plus all descendants.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(CampaignNode::node_count).sum::<usize>()
    }
}

/// Index of the sibling called `name`, appending an empty node if absent.
fn find_or_insert(nodes: &mut Vec<CampaignNode>, name: String) -> usize {
    match nodes.iter().position(|n| n.name == name) {
        Some(idx) => idx,
        None => {
            nodes.push(CampaignNode::new(name));
            nodes.len() - 1
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub current_rows: usize,
    pub prior_rows: usize,
    /// Rows that matched no node at any level.
    pub current_orphans: usize,
    pub prior_orphans: usize,
}

impl BuildStats {
    fn record(&mut self, period: Period, orphaned: bool) {
        let (rows, orphans) = match period {
            Period::Current => (&mut self.current_rows, &mut self.current_orphans),
            Period::Prior => (&mut self.prior_rows, &mut self.prior_orphans),
        };
        *rows += 1;
        if orphaned {
            *orphans += 1;
        }
    }
}

/// Builds one tree from the rows of both periods. Nodes are shared across
/// periods by name at every level.
pub struct TreeBuilder<'a> {
    layout: &'a Layout,
    classifier: &'a Classifier,
    orphan_policy: OrphanPolicy,
    roots: Vec<CampaignNode>,
    stats: BuildStats,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(layout: &'a Layout, classifier: &'a Classifier, orphan_policy: OrphanPolicy) -> Self {
        Self {
            layout,
            classifier,
            orphan_policy,
            roots: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Insert one row. Levels whose value is empty are skipped and the row
    /// attaches one level up; a row that attaches nowhere is an orphan.
    pub fn insert(&mut self, row: &CampaignRow, period: Period) {
        let mut nodes = &mut self.roots;
        let mut attached = false;

        for key in self.layout.keys() {
            let Some(name) = key.resolve(row, self.classifier) else {
                continue;
            };
            let idx = find_or_insert(nodes, name);
            let node = &mut nodes[idx];
            node.metrics_mut(period).add_row(row);
            attached = true;
            nodes = &mut node.children;
        }

        if !attached {
            debug!(period = ?period, "Row has no grouping value at any level");
            if self.orphan_policy == OrphanPolicy::Bucket {
                let idx = find_or_insert(&mut self.roots, UNASSIGNED.to_string());
                self.roots[idx].metrics_mut(period).add_row(row);
            }
        }
        self.stats.record(period, !attached);
    }

    pub fn extend<'r>(&mut self, rows: impl IntoIterator<Item = &'r CampaignRow>, period: Period) {
        for row in rows {
            self.insert(row, period);
        }
    }

    pub fn finish(self) -> (Vec<CampaignNode>, BuildStats) {
        let orphans = self.stats.current_orphans + self.stats.prior_orphans;
        if orphans > 0 && self.orphan_policy == OrphanPolicy::Drop {
            warn!(
                current = self.stats.current_orphans,
                prior = self.stats.prior_orphans,
                "Rows with no grouping value were dropped from all totals"
            );
        }
        (self.roots, self.stats)
    }
}
