//! Numeric triangulation — tolerance-based consensus over same-key claims.
//!
//! Claims are bucketed by `{metric, unit, period, geography}`. Each bucket's
//! consensus is the median value; members agreeing with the consensus within
//! the metric's relative tolerance support it, the rest dissent. A bucket
//! triangulates only when at least two supporters from at least two distinct
//! domains agree AND supporters hold a majority — a single outlier must not
//! block triangulation, but majority disagreement must.

use super::lexicon::NumberUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grouping key for numeric triangulation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimKey {
    pub metric: String,
    pub unit: NumberUnit,
    pub period: String,
    pub geography: String,
}

impl std::fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}{}|{}",
            self.geography,
            self.metric,
            if self.unit.symbol().is_empty() {
                String::new()
            } else {
                format!("[{}]", self.unit.symbol())
            },
            self.period
        )
    }
}

/// One claim instance entering triangulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericClaim {
    pub key: ClaimKey,
    pub value: f64,
    pub source_url: String,
    pub source_domain: String,
    pub is_primary: bool,
    /// The text span the value was quoted from.
    pub quote_span: String,
}

/// A triangulation bucket with its consensus and support partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericBucket {
    pub key: ClaimKey,
    /// Median of member values.
    pub consensus: f64,
    /// Indices into the input claim slice.
    pub supporters: Vec<usize>,
    pub dissenters: Vec<usize>,
    pub support_ratio: f64,
    pub triangulated: bool,
}

/// Per-metric tolerance lookup with a default fallback.
pub struct ToleranceTable<'a> {
    pub default_tolerance: f64,
    pub per_metric: &'a std::collections::HashMap<String, f64>,
}

impl ToleranceTable<'_> {
    pub fn tolerance_for(&self, metric: &str) -> f64 {
        self.per_metric
            .get(metric)
            .copied()
            .unwrap_or(self.default_tolerance)
    }
}

/// Median of a non-empty slice; mean of the two central values when even.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Group claims into buckets and compute consensus/support for each.
///
/// Buckets come out in deterministic key order.
pub fn triangulate_claims(
    claims: &[NumericClaim],
    tolerances: &ToleranceTable<'_>,
) -> Vec<NumericBucket> {
    let mut groups: BTreeMap<&ClaimKey, Vec<usize>> = BTreeMap::new();
    for (idx, claim) in claims.iter().enumerate() {
        groups.entry(&claim.key).or_default().push(idx);
    }

    let mut buckets = Vec::with_capacity(groups.len());
    for (key, members) in groups {
        let values: Vec<f64> = members.iter().map(|&i| claims[i].value).collect();
        let consensus = median(&values);
        let tolerance = tolerances.tolerance_for(&key.metric);

        let mut supporters = Vec::new();
        let mut dissenters = Vec::new();
        for &idx in &members {
            if within_tolerance(claims[idx].value, consensus, tolerance) {
                supporters.push(idx);
            } else {
                dissenters.push(idx);
            }
        }

        let support_ratio = supporters.len() as f64 / members.len() as f64;
        let supporter_domains: std::collections::HashSet<&str> = supporters
            .iter()
            .map(|&i| claims[i].source_domain.as_str())
            .collect();
        let triangulated =
            supporters.len() >= 2 && support_ratio >= 0.5 && supporter_domains.len() >= 2;

        buckets.push(NumericBucket {
            key: key.clone(),
            consensus,
            supporters,
            dissenters,
            support_ratio,
            triangulated,
        });
    }
    buckets
}

/// Relative agreement with the consensus value.
fn within_tolerance(value: f64, consensus: f64, tolerance: f64) -> bool {
    if consensus.abs() < f64::EPSILON {
        return (value - consensus).abs() <= tolerance;
    }
    ((value - consensus) / consensus).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_claim(value: f64, domain: &str) -> NumericClaim {
        NumericClaim {
            key: ClaimKey {
                metric: "unemployment_rate".into(),
                unit: NumberUnit::Percent,
                period: "2024".into(),
                geography: "united states".into(),
            },
            value,
            source_url: format!("https://{}/page", domain),
            source_domain: domain.to_string(),
            is_primary: false,
            quote_span: format!("the rate was {}%", value),
        }
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[7.0]), 7.0);
    }

    #[test]
    fn test_single_outlier_does_not_block() {
        // [5.0, 5.1, 9.0] at 3%: consensus is the median 5.1, two members
        // support, and the bucket triangulates.
        let claims = vec![
            make_claim(5.0, "bls.gov"),
            make_claim(5.1, "oecd.org"),
            make_claim(9.0, "blog.example.com"),
        ];
        let per_metric = HashMap::new();
        let buckets = triangulate_claims(
            &claims,
            &ToleranceTable {
                default_tolerance: 0.03,
                per_metric: &per_metric,
            },
        );
        assert_eq!(buckets.len(), 1);
        let bucket = &buckets[0];
        assert!(bucket.consensus >= 5.0 && bucket.consensus <= 5.2);
        assert_eq!(bucket.supporters.len(), 2);
        assert_eq!(bucket.dissenters, vec![2]);
        assert!(bucket.triangulated);
    }

    #[test]
    fn test_majority_disagreement_blocks() {
        // [2.0, 5.0, 8.0] at 2%: only the median itself supports, ratio
        // 1/3 < 0.5, not triangulated.
        let claims = vec![
            make_claim(2.0, "a.org"),
            make_claim(5.0, "b.org"),
            make_claim(8.0, "c.org"),
        ];
        let per_metric = HashMap::new();
        let buckets = triangulate_claims(
            &claims,
            &ToleranceTable {
                default_tolerance: 0.02,
                per_metric: &per_metric,
            },
        );
        let bucket = &buckets[0];
        assert!(bucket.support_ratio < 0.5);
        assert!(!bucket.triangulated);
    }

    #[test]
    fn test_same_domain_supporters_not_triangulated() {
        let claims = vec![make_claim(5.0, "a.org"), make_claim(5.05, "a.org")];
        let per_metric = HashMap::new();
        let buckets = triangulate_claims(
            &claims,
            &ToleranceTable {
                default_tolerance: 0.03,
                per_metric: &per_metric,
            },
        );
        let bucket = &buckets[0];
        assert_eq!(bucket.supporters.len(), 2);
        assert!(!bucket.triangulated, "one domain cannot corroborate itself");
    }

    #[test]
    fn test_per_metric_tolerance_override() {
        let claims = vec![make_claim(5.0, "a.org"), make_claim(5.4, "b.org")];
        let mut per_metric = HashMap::new();
        per_metric.insert("unemployment_rate".to_string(), 0.10);
        let buckets = triangulate_claims(
            &claims,
            &ToleranceTable {
                default_tolerance: 0.03,
                per_metric: &per_metric,
            },
        );
        // 8% apart: outside the 3% default, inside the 10% override.
        assert!(buckets[0].triangulated);
    }

    #[test]
    fn test_distinct_keys_never_merge() {
        let mut a = make_claim(5.0, "a.org");
        let mut b = make_claim(5.0, "b.org");
        a.key.period = "2023".into();
        b.key.period = "2024".into();
        let per_metric = HashMap::new();
        let buckets = triangulate_claims(
            &[a, b],
            &ToleranceTable {
                default_tolerance: 0.03,
                per_metric: &per_metric,
            },
        );
        assert_eq!(buckets.len(), 2);
        for bucket in &buckets {
            assert!(!bucket.triangulated);
        }
    }
}
