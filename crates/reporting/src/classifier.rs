//! Channel classification: maps a campaign's mapping label to a
//! two-level taxonomy (top / mid) and a Marketing / Non-Marketing split.

use campaign_core::config::ClassificationOverride;
use campaign_core::types::{NEW_MAPPING, SUB_GROUP, TOP_LEVEL_GROUP};
use campaign_core::CampaignRow;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Top label for rows outside paid media.
pub const NON_PAID: &str = "Non-Paid";
/// Fallback for anything the keyword heuristic cannot place.
pub const OTHER: &str = "Other";

/// Built-in classification table: (normalized label, top, mid).
const CLASSIFICATION_TABLE: &[(&str, &str, &str)] = &[
    ("paid social awareness", "Social", "Social Organic Boosting"),
    ("paid social - iris", "Social", "Social Mid-Funnel Campaigns"),
    ("meta - acquisition - mid funnel pm", "Social", "Social Mid-Funnel Campaigns"),
    ("meta - remarketing - mid funnel pm", "Social", "Social Mid-Funnel Campaigns"),
    ("youtube - acquisition - mid funnel pm", "Social", "Social Mid-Funnel Campaigns"),
    ("tiktok - acquisition - mid funnel pm", "Social", "Social Mid-Funnel Campaigns"),
    ("facebook prospecting - daba", "Social", "Social DABA"),
    ("pinterest remarketing", "Social", "Social Retargeting"),
    ("tiktok - remarketing", "Social", "Social Retargeting"),
    ("tiktok remarketing", "Social", "Social Retargeting"),
    ("facebook remarketing", "Social", "Social Retargeting"),
    ("pinterest paid prospecting", "Social", "Social Performance Prospecting"),
    ("facebook prospecting", "Social", "Social Performance Prospecting"),
    ("tiktok - remarketing - mid funnel pm", "Non-Paid", "Other"),
    ("misc/uncategorized", "Non-Paid", "Not Set"),
    ("not set / not set", "Non-Paid", "Not Set"),
    ("non-coupon affiliate(s)", "Non-Paid", "Affiliate"),
    ("coupon affiliate(s)", "Non-Paid", "Affiliate"),
    ("organic non-brand", "Non-Paid", "Organic Search"),
    ("organic brand", "Non-Paid", "Organic Search"),
    ("organic social", "Non-Paid", "Organic Social"),
    ("pinterest organic", "Non-Paid", "Organic Social"),
    ("referral", "Non-Paid", "Referral"),
    ("email", "Non-Paid Email/SMS", "Email/SMS"),
    ("attentive - sms/text", "Non-Paid Email/SMS", "Email/SMS"),
    ("direct", "Non-Paid", "Direct"),
    ("google non-brand shopping", "Shopping", "NBR Shopping"),
    ("microsoft non-brand shopping", "Shopping", "NBR Shopping"),
    ("google brand shopping", "Shopping", "BR Shopping"),
    ("microsoft brand shopping", "Shopping", "BR Shopping"),
    ("google non-brand text", "Search", "NBR Text"),
    ("microsoft non-brand text", "Search", "NBR Text"),
    ("google brand text", "Search", "BR Text"),
    ("microsoft brand text", "Search", "BR Text"),
    ("google demand gen", "Display", "Google Display Prospecting"),
    ("google display ads", "Display", "Google Display Prospecting"),
    ("youtube prospecting", "Display", "Google Display Prospecting"),
    ("google display and video retargeting", "Display", "Google Display Remarketing"),
];

static BUILTIN: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    CLASSIFICATION_TABLE
        .iter()
        .map(|(label, top, mid)| (*label, (*top, *mid)))
        .collect()
});

static ITEMS_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+campaigns? items$").unwrap());

/// Keyword fallback, checked in order; the first hit wins.
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["shopping"], "Shopping"),
    (&["search"], "Search"),
    (&["social", "facebook", "tiktok"], "Social"),
    (&["display", "daba"], "Display"),
    (&["email", "sms"], "Non-Paid Email/SMS"),
    (&["organic", "not set", "affiliate"], NON_PAID),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub top: String,
    pub mid: String,
}

impl Classification {
    fn new(top: &str, mid: &str) -> Self {
        Self {
            top: top.to_string(),
            mid: mid.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketingGroup {
    Marketing,
    NonMarketing,
}

impl MarketingGroup {
    /// Everything except plain "Non-Paid" counts as marketing, including
    /// "Non-Paid Email/SMS" and unclassified rows.
    pub fn from_top(top: &str) -> Self {
        if top == NON_PAID {
            MarketingGroup::NonMarketing
        } else {
            MarketingGroup::Marketing
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarketingGroup::Marketing => "Marketing",
            MarketingGroup::NonMarketing => "Non-Marketing",
        }
    }
}

/// Lower-case, drop a trailing "campaign(s) items" suffix, trim.
pub fn normalize_label(label: &str) -> String {
    let lower = label.to_lowercase();
    ITEMS_SUFFIX.replace(&lower, "").trim().to_string()
}

/// Top-level guess for a normalized label missing from the table.
pub fn keyword_top(normalized: &str) -> &'static str {
    KEYWORD_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| normalized.contains(n)))
        .map_or(OTHER, |(_, top)| *top)
}

/// Classifies rows against the built-in table plus configured overrides.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    overrides: HashMap<String, Classification>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge configured entries over the built-in table. Labels are
    /// normalized the same way row labels are.
    pub fn with_overrides<'a>(entries: impl IntoIterator<Item = &'a ClassificationOverride>) -> Self {
        let overrides = entries
            .into_iter()
            .map(|e| (normalize_label(&e.label), Classification::new(&e.top, &e.mid)))
            .collect();
        Self { overrides }
    }

    /// Exact-match table lookup on an already normalized label.
    pub fn lookup(&self, normalized: &str) -> Option<Classification> {
        if let Some(found) = self.overrides.get(normalized) {
            return Some(found.clone());
        }
        BUILTIN
            .get(normalized)
            .map(|(top, mid)| Classification::new(top, mid))
    }

    /// Classify a raw mapping label, ignoring any precomputed groups.
    pub fn classify_label(&self, label: &str) -> Classification {
        let normalized = normalize_label(label);
        self.lookup(&normalized)
            .unwrap_or_else(|| Classification::new(keyword_top(&normalized), OTHER))
    }

    /// Classify a row. `Top_Level_Group` and `Sub_Group`, when present,
    /// replace the matching level outright.
    pub fn classify(&self, row: &CampaignRow) -> Classification {
        let top_override = row.text(TOP_LEVEL_GROUP);
        let mid_override = row.text(SUB_GROUP);
        if let (Some(top), Some(mid)) = (top_override, mid_override) {
            return Classification::new(top, mid);
        }

        let label = row.label(NEW_MAPPING).unwrap_or_default();
        let mut info = self.classify_label(&label);
        if let Some(top) = top_override {
            info.top = top.to_string();
        }
        if let Some(mid) = mid_override {
            info.mid = mid.to_string();
        }
        info
    }

    pub fn top_level(&self, row: &CampaignRow) -> String {
        self.classify(row).top
    }

    pub fn second_level(&self, row: &CampaignRow) -> String {
        self.classify(row).mid
    }

    /// Marketing split from the mapping label alone. Precomputed
    /// `Top_Level_Group` values do not move a row between the two groups.
    pub fn marketing_group(&self, row: &CampaignRow) -> MarketingGroup {
        let label = row.label(NEW_MAPPING).unwrap_or_default();
        MarketingGroup::from_top(&self.classify_label(&label).top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> CampaignRow {
        match value {
            serde_json::Value::Object(map) => map.into(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Facebook Prospecting"), "facebook prospecting");
        assert_eq!(normalize_label("Email Campaign Items"), "email");
        assert_eq!(normalize_label("Google Brand Text campaigns items"), "google brand text");
        assert_eq!(normalize_label("  Direct  "), "direct");
        // Suffix must be at the very end and preceded by whitespace.
        assert_eq!(normalize_label("Email campaign items "), "email campaign items");
        assert_eq!(normalize_label("campaign items"), "campaign items");
    }

    #[test]
    fn test_table_lookup() {
        let c = Classifier::new();
        assert_eq!(
            c.classify_label("Facebook Prospecting"),
            Classification::new("Social", "Social Performance Prospecting")
        );
        assert_eq!(
            c.classify_label("Attentive - SMS/Text Campaign Items"),
            Classification::new("Non-Paid Email/SMS", "Email/SMS")
        );
        assert_eq!(
            c.classify_label("TikTok - Remarketing - Mid Funnel PM"),
            Classification::new("Non-Paid", "Other")
        );
    }

    #[test]
    fn test_keyword_fallback_order() {
        assert_eq!(keyword_top("bing shopping search"), "Shopping");
        assert_eq!(keyword_top("bing search"), "Search");
        assert_eq!(keyword_top("tiktok spark ads"), "Social");
        assert_eq!(keyword_top("social display mix"), "Social");
        assert_eq!(keyword_top("daba retargeting"), "Display");
        assert_eq!(keyword_top("sms blast"), "Non-Paid Email/SMS");
        assert_eq!(keyword_top("(not set)"), "Non-Paid");
        assert_eq!(keyword_top("podcast"), "Other");
        assert_eq!(keyword_top(""), "Other");

        let c = Classifier::new();
        assert_eq!(
            c.classify_label("Pinterest Shopping"),
            Classification::new("Shopping", "Other")
        );
    }

    #[test]
    fn test_precomputed_groups_win() {
        let c = Classifier::new();
        let both = row(json!({
            "New_mapping": "Email",
            "Top_Level_Group": "Lifecycle",
            "Sub_Group": "Newsletters",
        }));
        assert_eq!(c.classify(&both), Classification::new("Lifecycle", "Newsletters"));

        let top_only = row(json!({"New_mapping": "Email", "Top_Level_Group": "Lifecycle"}));
        assert_eq!(c.top_level(&top_only), "Lifecycle");
        assert_eq!(c.second_level(&top_only), "Email/SMS");

        let empty_override = row(json!({"New_mapping": "Direct", "Top_Level_Group": ""}));
        assert_eq!(c.top_level(&empty_override), "Non-Paid");
    }

    #[test]
    fn test_missing_mapping_falls_back_to_other() {
        let c = Classifier::new();
        let r = row(json!({"Campaign_Nm": "X"}));
        assert_eq!(c.classify(&r), Classification::new("Other", "Other"));
        assert_eq!(c.marketing_group(&r), MarketingGroup::Marketing);
    }

    #[test]
    fn test_marketing_group() {
        let c = Classifier::new();
        let organic = row(json!({"New_mapping": "Organic Brand"}));
        let email = row(json!({"New_mapping": "Email"}));
        let display = row(json!({"New_mapping": "Google Display Ads"}));
        assert_eq!(c.marketing_group(&organic), MarketingGroup::NonMarketing);
        assert_eq!(c.marketing_group(&email), MarketingGroup::Marketing);
        assert_eq!(c.marketing_group(&display), MarketingGroup::Marketing);
        assert_eq!(MarketingGroup::NonMarketing.as_str(), "Non-Marketing");
    }

    #[test]
    fn test_marketing_group_ignores_precomputed_top() {
        let c = Classifier::new();
        let organic = row(json!({"New_mapping": "Organic Brand", "Top_Level_Group": "Social"}));
        assert_eq!(c.top_level(&organic), "Social");
        assert_eq!(c.marketing_group(&organic), MarketingGroup::NonMarketing);

        let facebook = row(json!({
            "New_mapping": "Facebook Prospecting",
            "Top_Level_Group": "Non-Paid",
        }));
        assert_eq!(c.top_level(&facebook), "Non-Paid");
        assert_eq!(c.marketing_group(&facebook), MarketingGroup::Marketing);
    }

    #[test]
    fn test_overrides_replace_builtin_entries() {
        let entries = vec![
            ClassificationOverride {
                label: "Email Campaign Items".into(),
                top: "Owned".into(),
                mid: "Email".into(),
            },
            ClassificationOverride {
                label: "podcast sponsorship".into(),
                top: "Audio".into(),
                mid: "Podcasts".into(),
            },
        ];
        let c = Classifier::with_overrides(&entries);
        assert_eq!(c.classify_label("Email"), Classification::new("Owned", "Email"));
        assert_eq!(
            c.classify_label("Podcast Sponsorship"),
            Classification::new("Audio", "Podcasts")
        );
        assert_eq!(c.classify_label("Direct"), Classification::new("Non-Paid", "Direct"));
    }
}
