//! Derived metrics and grand totals.
//!
//! Ratios are always recomputed from accumulated base sums; averaging or
//! summing child ratios would be wrong.

use crate::metrics::{MetricBag, MetricKey};
use crate::tree::CampaignNode;
use serde::Serialize;

/// `numerator / denominator * scale`, or `None` when the denominator is zero
/// or missing, or the result is not finite.
fn ratio(numerator: f64, denominator: Option<f64>, scale: f64) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    let value = numerator / denominator * scale;
    value.is_finite().then_some(value)
}

/// Fill in CPC, CTR, CPM, CPS and AROAS from the bag's base sums.
pub fn derive_metrics(bag: &mut MetricBag) {
    let cost = bag.get(MetricKey::Cost).unwrap_or(0.0);
    let clicks = bag.get(MetricKey::LinkClicks);
    let impressions = bag.get(MetricKey::Impressions);
    let sales = bag
        .get(MetricKey::AttributedTransactions)
        .or(bag.get(MetricKey::Transactions));
    let attributed_revenue = bag.get(MetricKey::AttributedRevenue).unwrap_or(0.0);

    bag.set(MetricKey::Cpc, ratio(cost, clicks, 1.0));
    bag.set(
        MetricKey::Ctr,
        ratio(clicks.unwrap_or(0.0), impressions, 100.0),
    );
    bag.set(MetricKey::Cpm, ratio(cost, impressions, 1000.0));
    bag.set(MetricKey::Cps, ratio(cost, sales, 1.0));
    bag.set(
        MetricKey::Aroas,
        ratio(attributed_revenue, bag.get(MetricKey::Cost), 1.0),
    );
}

/// Derive both periods of every node, depth-first.
pub fn derive_tree(nodes: &mut [CampaignNode]) {
    for node in nodes {
        derive_metrics(&mut node.current);
        derive_metrics(&mut node.prior);
        derive_tree(&mut node.children);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GrandTotal {
    pub current: MetricBag,
    pub prior: MetricBag,
}

/// Sum the root nodes' base metrics (each root already holds its whole
/// subtree) and derive ratios from the result. No roots means no data.
pub fn grand_total(roots: &[CampaignNode]) -> GrandTotal {
    let mut total = GrandTotal::default();
    for node in roots {
        total.current.add_base(&node.current);
        total.prior.add_base(&node.prior);
    }
    derive_metrics(&mut total.current);
    derive_metrics(&mut total.prior);
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(values: &[(MetricKey, f64)]) -> MetricBag {
        let mut bag = MetricBag::new();
        for (key, value) in values {
            bag.add(*key, *value);
        }
        bag
    }

    #[test]
    fn test_derive_metrics() {
        let mut b = bag(&[
            (MetricKey::Cost, 100.0),
            (MetricKey::LinkClicks, 50.0),
            (MetricKey::Impressions, 1000.0),
            (MetricKey::AttributedTransactions, 4.0),
            (MetricKey::Transactions, 10.0),
            (MetricKey::AttributedRevenue, 250.0),
        ]);
        derive_metrics(&mut b);
        assert_eq!(b.get(MetricKey::Cpc), Some(2.0));
        assert_eq!(b.get(MetricKey::Ctr), Some(5.0));
        assert_eq!(b.get(MetricKey::Cpm), Some(100.0));
        assert_eq!(b.get(MetricKey::Cps), Some(25.0));
        assert_eq!(b.get(MetricKey::Aroas), Some(2.5));
    }

    #[test]
    fn test_zero_denominators_are_undefined() {
        let mut b = bag(&[(MetricKey::Cost, 100.0), (MetricKey::LinkClicks, 7.0)]);
        b.set(MetricKey::Impressions, Some(0.0));
        derive_metrics(&mut b);
        assert_eq!(b.get(MetricKey::Ctr), None);
        assert_eq!(b.get(MetricKey::Cpm), None);
        assert_eq!(b.get(MetricKey::Cps), None);
        assert_eq!(b.get(MetricKey::Cpc), Some(100.0 / 7.0));

        let mut empty = MetricBag::new();
        derive_metrics(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_cps_falls_back_to_transactions() {
        let mut b = bag(&[(MetricKey::Cost, 30.0), (MetricKey::Transactions, 3.0)]);
        derive_metrics(&mut b);
        assert_eq!(b.get(MetricKey::Cps), Some(10.0));

        // A defined zero still takes precedence over Transactions.
        b.set(MetricKey::AttributedTransactions, Some(0.0));
        derive_metrics(&mut b);
        assert_eq!(b.get(MetricKey::Cps), None);
    }

    #[test]
    fn test_aroas_needs_cost() {
        let mut b = bag(&[(MetricKey::AttributedRevenue, 40.0)]);
        derive_metrics(&mut b);
        assert_eq!(b.get(MetricKey::Aroas), None);
    }

    #[test]
    fn test_parent_ratio_comes_from_sums() {
        let mut parent = CampaignNode::new("parent");
        let mut a = CampaignNode::new("a");
        let mut b = CampaignNode::new("b");
        a.current = bag(&[(MetricKey::Cost, 10.0), (MetricKey::LinkClicks, 10.0)]);
        b.current = bag(&[(MetricKey::Cost, 90.0), (MetricKey::LinkClicks, 10.0)]);
        parent.current.add_base(&a.current);
        parent.current.add_base(&b.current);
        parent.children = vec![a, b];

        let mut roots = vec![parent];
        derive_tree(&mut roots);
        let p = &roots[0];
        assert_eq!(p.children[0].current.get(MetricKey::Cpc), Some(1.0));
        assert_eq!(p.children[1].current.get(MetricKey::Cpc), Some(9.0));
        // Not the average of the children's CPC (5.0).
        assert_eq!(p.current.get(MetricKey::Cpc), Some(5.0));
        assert_eq!(p.prior.get(MetricKey::Cpc), None);
    }

    #[test]
    fn test_grand_total() {
        let mut a = CampaignNode::new("a");
        a.current = bag(&[(MetricKey::Cost, 10.0), (MetricKey::LinkClicks, 4.0)]);
        let mut b = CampaignNode::new("b");
        b.current = bag(&[(MetricKey::Cost, 30.0), (MetricKey::LinkClicks, 1.0)]);
        b.prior = bag(&[(MetricKey::Cost, 20.0)]);

        let total = grand_total(&[a, b]);
        assert_eq!(total.current.get(MetricKey::Cost), Some(40.0));
        assert_eq!(total.current.get(MetricKey::Cpc), Some(8.0));
        assert_eq!(total.prior.get(MetricKey::Cost), Some(20.0));
        assert_eq!(total.prior.get(MetricKey::Cpc), None);

        let none = grand_total(&[]);
        assert!(none.current.is_empty());
        assert!(none.prior.is_empty());
    }
}
