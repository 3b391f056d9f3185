//! Quality metrics — run-scoped aggregates the gate decides on.

use super::clustering::Cluster;
use crate::types::AnnotatedEvidence;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Aggregate quality metrics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Primary items / total items.
    pub primary_share: f64,
    /// Items in any valid triangulated cluster / total items.
    pub triangulation_rate: f64,
    /// Largest single-domain share of the evidence.
    pub domain_concentration: f64,
    /// Number of distinct source domains.
    pub unique_domains: usize,
    /// Primary items published within the recency lookback window.
    pub recent_primary: usize,
    /// Number of valid triangulated clusters.
    pub triangulated_clusters: usize,
    /// Total evidence count after deduplication.
    pub total_evidence: usize,
}

/// Compute all quality metrics for a run.
///
/// Clusters with empty member lists are tolerated and skipped; they
/// contribute nothing rather than poisoning the computation.
pub fn compute_metrics(
    evidence: &[AnnotatedEvidence],
    clusters: &[Cluster],
    now: DateTime<Utc>,
    recency_lookback_days: i64,
) -> QualityMetrics {
    let total = evidence.len();
    if total == 0 {
        return QualityMetrics {
            primary_share: 0.0,
            triangulation_rate: 0.0,
            domain_concentration: 0.0,
            unique_domains: 0,
            recent_primary: 0,
            triangulated_clusters: 0,
            total_evidence: 0,
        };
    }

    let primary = evidence
        .iter()
        .filter(|e| e.annotations.is_primary)
        .count();

    let cutoff = now - Duration::days(recency_lookback_days);
    let recent_primary = evidence
        .iter()
        .filter(|e| e.annotations.is_primary)
        .filter(|e| e.item.published_at.unwrap_or(e.item.collected_at) >= cutoff)
        .count();

    let mut by_domain: HashMap<&str, usize> = HashMap::new();
    for e in evidence {
        *by_domain.entry(e.item.domain.as_str()).or_insert(0) += 1;
    }
    let max_domain = by_domain.values().copied().max().unwrap_or(0);

    let mut triangulated_union: HashSet<usize> = HashSet::new();
    let mut valid_clusters = 0usize;
    for cluster in clusters {
        if cluster.indices.is_empty() {
            continue;
        }
        valid_clusters += 1;
        triangulated_union.extend(cluster.indices.iter().copied());
    }

    QualityMetrics {
        primary_share: primary as f64 / total as f64,
        triangulation_rate: triangulated_union.len() as f64 / total as f64,
        domain_concentration: max_domain as f64 / total as f64,
        unique_domains: by_domain.len(),
        recent_primary,
        triangulated_clusters: valid_clusters,
        total_evidence: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DomainTier, EvidenceAnnotations, EvidenceItem};
    use uuid::Uuid;

    fn make_annotated(domain: &str, is_primary: bool, days_ago: i64) -> AnnotatedEvidence {
        let now = Utc::now();
        AnnotatedEvidence {
            item: EvidenceItem {
                id: Uuid::new_v4(),
                url: format!("https://{}/{}", domain, Uuid::new_v4()),
                domain: domain.to_string(),
                text: String::new(),
                collected_at: now,
                published_at: Some(now - Duration::days(days_ago)),
                doi: None,
                peer_reviewed: false,
                official: false,
                cited_primary: None,
                credibility: 0.5,
            },
            annotations: EvidenceAnnotations {
                canonical_id: format!("url:{}", Uuid::new_v4()),
                tier: DomainTier::Tier4,
                weight: 0.4,
                is_primary,
                cluster: None,
            },
        }
    }

    fn cluster(indices: Vec<usize>) -> Cluster {
        Cluster {
            size: indices.len(),
            domains: vec!["a.org".into(), "b.org".into()],
            representative: None,
            indices,
        }
    }

    #[test]
    fn test_empty_evidence_zeroes() {
        let m = compute_metrics(&[], &[], Utc::now(), 365);
        assert_eq!(m.total_evidence, 0);
        assert_eq!(m.primary_share, 0.0);
        assert_eq!(m.unique_domains, 0);
    }

    #[test]
    fn test_shares_and_concentration() {
        let evidence = vec![
            make_annotated("a.org", true, 10),
            make_annotated("a.org", false, 10),
            make_annotated("b.org", true, 10),
            make_annotated("c.org", false, 10),
        ];
        let m = compute_metrics(&evidence, &[], Utc::now(), 365);
        assert_eq!(m.primary_share, 0.5);
        assert_eq!(m.domain_concentration, 0.5);
        assert_eq!(m.unique_domains, 3);
        assert_eq!(m.recent_primary, 2);
    }

    #[test]
    fn test_recency_window() {
        let evidence = vec![
            make_annotated("a.org", true, 10),
            make_annotated("b.org", true, 800),
        ];
        let m = compute_metrics(&evidence, &[], Utc::now(), 365);
        assert_eq!(m.primary_share, 1.0);
        assert_eq!(m.recent_primary, 1);
    }

    #[test]
    fn test_triangulation_rate_union() {
        let evidence: Vec<AnnotatedEvidence> =
            (0..10).map(|_| make_annotated("a.org", false, 1)).collect();
        // Overlapping clusters count each item once.
        let clusters = vec![cluster(vec![0, 1, 2]), cluster(vec![2, 3])];
        let m = compute_metrics(&evidence, &clusters, Utc::now(), 365);
        assert_eq!(m.triangulated_clusters, 2);
        assert_eq!(m.triangulation_rate, 0.4);
    }

    #[test]
    fn test_malformed_empty_cluster_skipped() {
        let evidence = vec![make_annotated("a.org", false, 1)];
        let clusters = vec![cluster(vec![]), cluster(vec![0])];
        let m = compute_metrics(&evidence, &clusters, Utc::now(), 365);
        assert_eq!(m.triangulated_clusters, 1);
        assert_eq!(m.triangulation_rate, 1.0);
    }
}
