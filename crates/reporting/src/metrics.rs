//! Metric identifiers, per-node metric bags, and column definitions.

use campaign_core::CampaignRow;
use serde::ser::{Serialize, SerializeMap, Serializer};

// ─── Metric keys ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    Cost,
    Revenue,
    Sessions,
    EngagedSessions,
    Transactions,
    AttributedTransactions,
    NewUsers,
    Impressions,
    LinkClicks,
    GaLastClickRevenue,
    AttributedRevenue,
    RevenueMinusEmbeddedAwareness,
    EmbeddedAwareness,
    Cpc,
    Ctr,
    Cpm,
    Cps,
    Aroas,
}

impl MetricKey {
    pub const COUNT: usize = 18;

    /// Additive metrics, summed straight from input rows.
    pub const BASE: [MetricKey; 13] = [
        MetricKey::Cost,
        MetricKey::Revenue,
        MetricKey::Sessions,
        MetricKey::EngagedSessions,
        MetricKey::Transactions,
        MetricKey::AttributedTransactions,
        MetricKey::NewUsers,
        MetricKey::Impressions,
        MetricKey::LinkClicks,
        MetricKey::GaLastClickRevenue,
        MetricKey::AttributedRevenue,
        MetricKey::RevenueMinusEmbeddedAwareness,
        MetricKey::EmbeddedAwareness,
    ];

    /// Ratios computed from accumulated base sums. Never summed.
    pub const DERIVED: [MetricKey; 5] = [
        MetricKey::Cpc,
        MetricKey::Ctr,
        MetricKey::Cpm,
        MetricKey::Cps,
        MetricKey::Aroas,
    ];

    /// Field name in the raw input rows (and in JSON output).
    pub fn field(self) -> &'static str {
        match self {
            MetricKey::Cost => "Cost",
            MetricKey::Revenue => "Revenue",
            MetricKey::Sessions => "Sessions",
            MetricKey::EngagedSessions => "Engaged_Sessions",
            MetricKey::Transactions => "Transactions",
            MetricKey::AttributedTransactions => "Attributed_Transactions",
            MetricKey::NewUsers => "NewUsers",
            MetricKey::Impressions => "Impressions",
            MetricKey::LinkClicks => "Link_Clicks",
            MetricKey::GaLastClickRevenue => "GA_last_click_revenue",
            MetricKey::AttributedRevenue => "Attributed_Revenue",
            MetricKey::RevenueMinusEmbeddedAwareness => "Revenue_minus_embedded_awareness",
            MetricKey::EmbeddedAwareness => "embedded_awareness",
            MetricKey::Cpc => "CPC",
            MetricKey::Ctr => "CTR",
            MetricKey::Cpm => "CPM",
            MetricKey::Cps => "CPS",
            MetricKey::Aroas => "AROAS",
        }
    }

    pub fn is_derived(self) -> bool {
        Self::DERIVED.contains(&self)
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ─── Metric bag ─────────────────────────────────────────────────────────────

/// Optional value per metric. `None` means "no data", which is distinct
/// from a value of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBag {
    values: [Option<f64>; MetricKey::COUNT],
}

impl MetricBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.values[key.index()]
    }

    pub fn set(&mut self, key: MetricKey, value: Option<f64>) {
        self.values[key.index()] = value;
    }

    /// Add `amount` to a metric, treating "no data" as zero.
    pub fn add(&mut self, key: MetricKey, amount: f64) {
        let slot = &mut self.values[key.index()];
        *slot = Some(slot.unwrap_or(0.0) + amount);
    }

    /// Accumulate one input row. Every base metric becomes defined; missing or
    /// non-numeric fields contribute zero.
    pub fn add_row(&mut self, row: &CampaignRow) {
        for key in MetricKey::BASE {
            self.add(key, row.number(key.field()).unwrap_or(0.0));
        }
    }

    /// Accumulate another bag's base metrics (derived values are ignored).
    pub fn add_base(&mut self, other: &MetricBag) {
        for key in MetricKey::BASE {
            self.add(key, other.get(key).unwrap_or(0.0));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

impl Serialize for MetricBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let defined = METRIC_DEFS
            .iter()
            .filter_map(|def| self.get(def.key).map(|v| (def.key.field(), v)));
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in defined {
            map.serialize_entry(field, &value)?;
        }
        map.end()
    }
}

// ─── Column definitions ─────────────────────────────────────────────────────

/// How one metric is labelled and formatted in tabular output.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub key: MetricKey,
    pub label: &'static str,
    pub digits: usize,
    pub currency: bool,
    pub suffix: &'static str,
}

impl MetricDef {
    const fn new(key: MetricKey, label: &'static str, digits: usize) -> Self {
        Self {
            key,
            label,
            digits,
            currency: false,
            suffix: "",
        }
    }

    const fn money(key: MetricKey, label: &'static str) -> Self {
        Self {
            key,
            label,
            digits: 2,
            currency: true,
            suffix: "",
        }
    }

    pub fn derived(&self) -> bool {
        self.key.is_derived()
    }
}

/// Metric columns in display order.
pub const METRIC_DEFS: [MetricDef; MetricKey::COUNT] = [
    MetricDef::money(MetricKey::Cost, "Spend"),
    MetricDef::money(MetricKey::Revenue, "Revenue"),
    MetricDef::money(MetricKey::AttributedRevenue, "SP Attributed Rev"),
    MetricDef::new(MetricKey::Sessions, "Sessions", 0),
    MetricDef::new(MetricKey::EngagedSessions, "Engaged Sessions", 0),
    MetricDef::new(MetricKey::Transactions, "Transactions", 0),
    MetricDef::new(MetricKey::AttributedTransactions, "Attributed Transactions", 0),
    MetricDef::new(MetricKey::NewUsers, "New Users", 0),
    MetricDef::new(MetricKey::Impressions, "Impressions", 0),
    MetricDef::new(MetricKey::LinkClicks, "Link Clicks", 0),
    MetricDef::money(MetricKey::GaLastClickRevenue, "GA Last Click Rev"),
    MetricDef::money(MetricKey::RevenueMinusEmbeddedAwareness, "Rev minus Awareness"),
    MetricDef::money(MetricKey::EmbeddedAwareness, "Embedded Awareness"),
    MetricDef::money(MetricKey::Cpc, "CPC"),
    MetricDef {
        key: MetricKey::Ctr,
        label: "CTR",
        digits: 2,
        currency: false,
        suffix: "%",
    },
    MetricDef::money(MetricKey::Cpm, "CPM"),
    MetricDef::money(MetricKey::Cps, "CPS"),
    MetricDef::new(MetricKey::Aroas, "Attributed ROAS", 2),
];
