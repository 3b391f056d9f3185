//! Property-based tests for the triangulation core using proptest.

use chrono::Utc;
use proptest::prelude::*;
use uuid::Uuid;

use veritant_core::triangulate::canonical::dedup_by_canonical;
use veritant_core::triangulate::clustering::cluster_cap;
use veritant_core::triangulate::gate::{ThresholdTable, evaluate_gate};
use veritant_core::triangulate::metrics::QualityMetrics;
use veritant_core::triangulate::numeric::median;
use veritant_core::{EvidenceItem, Intent};

fn make_item(url: &str) -> EvidenceItem {
    let domain = url
        .trim_start_matches("https://")
        .split('/')
        .next()
        .unwrap_or("")
        .to_string();
    EvidenceItem {
        id: Uuid::new_v4(),
        url: url.to_string(),
        domain,
        text: String::new(),
        collected_at: Utc::now(),
        published_at: None,
        doi: None,
        peer_reviewed: false,
        official: false,
        cited_primary: None,
        credibility: 0.5,
    }
}

// --- Dedup properties ---

proptest! {
    #[test]
    fn dedup_is_idempotent(
        picks in prop::collection::vec(0usize..8, 0..40)
    ) {
        // URLs drawn from a small pool force collisions.
        let pool: Vec<String> = (0..8)
            .map(|i| format!("https://host{}.org/page/{}", i % 3, i))
            .collect();
        let items: Vec<EvidenceItem> =
            picks.iter().map(|&p| make_item(&pool[p])).collect();

        let once = dedup_by_canonical(&items);
        let survivors: Vec<EvidenceItem> =
            once.kept.iter().map(|&i| items[i].clone()).collect();
        let twice = dedup_by_canonical(&survivors);

        prop_assert_eq!(twice.removed, 0);
        prop_assert_eq!(&twice.ids, &once.ids);
    }

    #[test]
    fn dedup_never_grows_and_keeps_order(
        picks in prop::collection::vec(0usize..8, 0..40)
    ) {
        let pool: Vec<String> = (0..8)
            .map(|i| format!("https://host{}.org/page/{}", i % 3, i))
            .collect();
        let items: Vec<EvidenceItem> =
            picks.iter().map(|&p| make_item(&pool[p])).collect();

        let result = dedup_by_canonical(&items);
        prop_assert!(result.kept.len() <= items.len());
        prop_assert!(result.kept.windows(2).all(|w| w[0] < w[1]));
    }
}

// --- Cluster cap properties ---

proptest! {
    #[test]
    fn cap_never_exceeds_hard_ceiling(
        total in 1usize..500,
        domain_count in 1usize..20,
    ) {
        let cap = cluster_cap(total, domain_count);
        let hard_ceiling = 8usize.max((0.35 * total as f64).ceil() as usize);
        prop_assert!(cap <= hard_ceiling);
        prop_assert!(cap >= 1);
    }

    #[test]
    fn cap_monotone_in_domain_count(
        total in 1usize..500,
        domain_count in 1usize..19,
    ) {
        prop_assert!(cluster_cap(total, domain_count + 1) >= cluster_cap(total, domain_count));
    }
}

// --- Median properties ---

proptest! {
    #[test]
    fn median_is_bounded_by_extremes(
        values in prop::collection::vec(-1e6f64..1e6, 1..50)
    ) {
        let m = median(&values);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= min && m <= max);
    }
}

// --- Gate monotonicity ---

fn arb_metrics() -> impl Strategy<Value = QualityMetrics> {
    (
        0.0f64..=1.0,
        0.0f64..=1.0,
        0.0f64..=1.0,
        0usize..12,
        0usize..12,
        0usize..8,
    )
        .prop_map(
            |(primary, triangulation, concentration, domains, recent, clusters)| QualityMetrics {
                primary_share: primary,
                triangulation_rate: triangulation,
                domain_concentration: concentration,
                unique_domains: domains,
                recent_primary: recent,
                triangulated_clusters: clusters,
                total_evidence: 30,
            },
        )
}

proptest! {
    #[test]
    fn improving_one_metric_never_fails_a_pass(
        metrics in arb_metrics(),
        which in 0usize..6,
        strict in any::<bool>(),
    ) {
        let table = ThresholdTable::default();
        let thresholds = table.resolve(Intent::Stats, strict).unwrap();
        let base = evaluate_gate(&metrics, &thresholds, Intent::Stats, strict);

        let mut improved = metrics.clone();
        match which {
            0 => improved.primary_share = (improved.primary_share + 0.1).min(1.0),
            1 => improved.triangulation_rate = (improved.triangulation_rate + 0.1).min(1.0),
            2 => improved.domain_concentration = (improved.domain_concentration - 0.1).max(0.0),
            3 => improved.unique_domains += 1,
            4 => improved.recent_primary += 1,
            _ => improved.triangulated_clusters += 1,
        }
        let after = evaluate_gate(&improved, &thresholds, Intent::Stats, strict);

        if base.passed {
            prop_assert!(after.passed, "improvement flipped PASS to FAIL");
        }
    }

    #[test]
    fn degrading_one_metric_never_passes_a_fail(
        metrics in arb_metrics(),
        which in 0usize..6,
        strict in any::<bool>(),
    ) {
        let table = ThresholdTable::default();
        let thresholds = table.resolve(Intent::Stats, strict).unwrap();
        let base = evaluate_gate(&metrics, &thresholds, Intent::Stats, strict);

        let mut degraded = metrics.clone();
        match which {
            0 => degraded.primary_share = (degraded.primary_share - 0.1).max(0.0),
            1 => degraded.triangulation_rate = (degraded.triangulation_rate - 0.1).max(0.0),
            2 => degraded.domain_concentration = (degraded.domain_concentration + 0.1).min(1.0),
            3 => degraded.unique_domains = degraded.unique_domains.saturating_sub(1),
            4 => degraded.recent_primary = degraded.recent_primary.saturating_sub(1),
            _ => degraded.triangulated_clusters = degraded.triangulated_clusters.saturating_sub(1),
        }
        let after = evaluate_gate(&degraded, &thresholds, Intent::Stats, strict);

        if !base.passed {
            prop_assert!(!after.passed, "degradation flipped FAIL to PASS");
        }
    }
}
