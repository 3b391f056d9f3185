//! Triangulation engine — orchestrates one synchronous run.
//!
//! Pipeline: canonicalize/dedup → tier annotation → claim extraction →
//! numeric triangulation → semantic clustering → representative selection →
//! contradiction scan → metrics → gate. Each run is self-contained: fresh
//! inputs in, fresh outputs out, no state crossing run boundaries. The one
//! external call is the batched embedding request, made once.

use super::canonical::dedup_by_canonical;
use super::clustering::{Cluster, build_similarity, cluster_evidence};
use super::contradiction::{Contradiction, detect_contradictions};
use super::domains::{DomainTable, assign_tier};
use super::extraction::{ExtractionStats, StructuredClaim, extract_claims};
use super::gate::{GateVerdict, classify_intent, evaluate_gate};
use super::lexicon::Lexicon;
use super::metrics::{QualityMetrics, compute_metrics};
use super::numeric::{ClaimKey, NumericBucket, NumericClaim, ToleranceTable, triangulate_claims};
use super::representative::{CandidateWeight, select_representative};
use crate::config::EngineConfig;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::types::{AnnotatedEvidence, EvidenceAnnotations, EvidenceItem, Intent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything one run produces, serializable for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub topic: String,
    pub intent: Intent,
    pub strict: bool,
    /// Deduplicated evidence with annotations (canonical id, tier,
    /// primary flag, cluster membership).
    pub evidence: Vec<AnnotatedEvidence>,
    pub clusters: Vec<Cluster>,
    pub claims: Vec<StructuredClaim>,
    pub buckets: Vec<NumericBucket>,
    pub contradictions: Vec<Contradiction>,
    pub metrics: QualityMetrics,
    pub verdict: GateVerdict,
    pub duplicates_removed: usize,
    pub claims_dropped_no_period: usize,
    /// True when the embedding service failed and clustering ran on
    /// keyword overlap.
    pub degraded_similarity: bool,
    pub completed_at: DateTime<Utc>,
}

/// The evidence triangulation and quality-gating engine.
///
/// Holds the injected lexicon, domain table, configuration, and embedding
/// handle; all are acquired once and reused across the run.
pub struct TriangulationEngine {
    config: EngineConfig,
    lexicon: Lexicon,
    domains: DomainTable,
    embedder: Arc<dyn Embedder>,
}

impl TriangulationEngine {
    pub fn new(config: EngineConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            config,
            lexicon: Lexicon::default(),
            domains: DomainTable::default(),
            embedder,
        }
    }

    /// Replace the default lexicon (tests and specialized deployments).
    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    /// Replace the default domain table.
    pub fn with_domain_table(mut self, domains: DomainTable) -> Self {
        self.domains = domains;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over one collected evidence set.
    ///
    /// `intent` is the externally classified intent label; when absent the
    /// topic is classified here. A failed gate is a normal outcome, not an
    /// error.
    pub fn run(
        &self,
        items: Vec<EvidenceItem>,
        topic: &str,
        intent: Option<Intent>,
        strict: bool,
    ) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let intent = intent.unwrap_or_else(|| classify_intent(topic));
        let thresholds = self.config.thresholds.resolve(intent, strict)?;
        info!(%run_id, %intent, strict, total = items.len(), "starting triangulation run");

        // Stage 1: canonical identity and deduplication. Mirrors collapse
        // before anything downstream counts sources.
        let dedup = dedup_by_canonical(&items);
        let mut evidence: Vec<AnnotatedEvidence> = dedup
            .kept
            .iter()
            .zip(dedup.ids.iter())
            .map(|(&idx, id)| {
                let item = items[idx].clone();
                let assignment = assign_tier(&self.domains, &item);
                AnnotatedEvidence {
                    item,
                    annotations: EvidenceAnnotations {
                        canonical_id: id.clone(),
                        tier: assignment.tier,
                        weight: assignment.weight,
                        is_primary: assignment.is_primary,
                        cluster: None,
                    },
                }
            })
            .collect();
        debug!(kept = evidence.len(), removed = dedup.removed, "dedup complete");

        // Stage 2: structured claim extraction.
        let mut stats = ExtractionStats::default();
        let mut claims: Vec<StructuredClaim> = Vec::new();
        let mut numeric_claims: Vec<NumericClaim> = Vec::new();
        for annotated in &evidence {
            for claim in extract_claims(&annotated.item, &self.lexicon, &mut stats) {
                if let Some(geography) = claim.entity.clone() {
                    numeric_claims.push(NumericClaim {
                        key: ClaimKey {
                            metric: claim.metric.clone(),
                            unit: claim.unit,
                            period: claim.period.clone(),
                            geography,
                        },
                        value: claim.value,
                        source_url: annotated.item.url.clone(),
                        source_domain: annotated.item.domain.clone(),
                        is_primary: annotated.annotations.is_primary,
                        quote_span: claim.raw_text.clone(),
                    });
                }
                claims.push(claim);
            }
        }
        debug!(
            claims = claims.len(),
            keyed = numeric_claims.len(),
            dropped = stats.dropped_no_period,
            "extraction complete"
        );

        // Stage 3: numeric triangulation.
        let buckets = triangulate_claims(
            &numeric_claims,
            &ToleranceTable {
                default_tolerance: self.config.numeric_tolerance,
                per_metric: &self.config.metric_tolerances,
            },
        );

        // Stage 4: semantic clustering. One batched embedding call covers
        // every evidence text plus the topic.
        let texts: Vec<&str> = evidence.iter().map(|e| e.item.text.as_str()).collect();
        let ctx = build_similarity(&texts, topic, self.embedder.as_ref());
        let item_domains: Vec<String> =
            evidence.iter().map(|e| e.item.domain.clone()).collect();
        let threshold = self.config.similarity_threshold_for(intent);
        let (mut clusters, rejected) =
            cluster_evidence(&ctx, &item_domains, threshold, evidence.len());
        debug!(valid = clusters.len(), rejected, "clustering complete");

        // Stage 5: representative selection per cluster.
        let weights: Vec<CandidateWeight> = evidence
            .iter()
            .map(|e| CandidateWeight {
                credibility: e.annotations.weight,
                numeric_density: numeric_density(&self.lexicon, &e.item.text),
            })
            .collect();
        for (cluster_idx, cluster) in clusters.iter_mut().enumerate() {
            cluster.representative = select_representative(
                &cluster.indices,
                &ctx,
                &weights,
                self.config.topic_floor,
                self.config.density_bonus_cap,
            );
            for &member in &cluster.indices {
                evidence[member].annotations.cluster = Some(cluster_idx);
            }
        }

        // Stage 6: contradiction scan, independent of triangulation.
        let contradictions = detect_contradictions(
            &numeric_claims,
            &self.lexicon,
            self.config.contradiction_tolerance,
        );

        // Stage 7: metrics and the gate.
        let completed_at = Utc::now();
        let metrics = compute_metrics(
            &evidence,
            &clusters,
            completed_at,
            self.config.recency_lookback_days,
        );
        let verdict = evaluate_gate(&metrics, &thresholds, intent, strict);
        info!(
            passed = verdict.passed,
            primary_share = metrics.primary_share,
            triangulation_rate = metrics.triangulation_rate,
            "run complete"
        );

        Ok(RunOutcome {
            run_id,
            topic: topic.to_string(),
            intent,
            strict,
            evidence,
            clusters,
            claims,
            buckets,
            contradictions,
            metrics,
            verdict,
            duplicates_removed: dedup.removed,
            claims_dropped_no_period: stats.dropped_no_period,
            degraded_similarity: ctx.degraded,
            completed_at,
        })
    }
}

/// Numbers per word, the representative-selection density signal.
fn numeric_density(lexicon: &Lexicon, text: &str) -> f64 {
    let words = text.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }
    lexicon.find_numbers(text).len() as f64 / words as f64
}
