//! Semantic clustering with domain-diversity caps.
//!
//! Evidence texts are embedded in one batch and grouped by cosine
//! similarity to a cluster seed. Clusters spanning a single domain are
//! rejected outright: repetition inside one domain is not corroboration.
//! Valid clusters are bounded by a size cap that grows with domain
//! diversity, and over-cap clusters keep their highest-similarity members,
//! so one loosely matched catch-all cluster cannot dominate the
//! triangulation rate.
//!
//! When the embedding collaborator fails, similarity degrades to keyword
//! Jaccard overlap. The pipeline still produces clusters, just coarser
//! ones, and the degradation is logged and surfaced in the run outcome.

use crate::embeddings::{Embedder, cosine_similarity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A group of evidence items judged to express the same claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    /// Indices into the run's deduplicated evidence list.
    pub indices: Vec<usize>,
    /// Distinct source domains, sorted.
    pub domains: Vec<String>,
    /// Index of the selected representative member, if one was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative: Option<usize>,
    pub size: usize,
}

/// Pairwise similarities for one run, plus each item's similarity to the
/// query. Built once, shared by clustering and representative selection.
pub struct SimilarityContext {
    pub matrix: Vec<Vec<f64>>,
    pub query_sims: Vec<f64>,
    /// True when the embedding service failed and keyword overlap was used.
    pub degraded: bool,
}

impl SimilarityContext {
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        self.matrix[a][b]
    }
}

/// Embed all texts and the query in one batch and precompute similarities.
/// Falls back to Jaccard keyword overlap when the embedder fails.
pub fn build_similarity(
    texts: &[&str],
    query: &str,
    embedder: &dyn Embedder,
) -> SimilarityContext {
    let mut batch: Vec<&str> = texts.to_vec();
    batch.push(query);

    match embedder.embed_batch(&batch) {
        Ok(vectors) => {
            let n = texts.len();
            let query_vec = &vectors[n];
            let mut matrix = vec![vec![0.0f64; n]; n];
            for i in 0..n {
                matrix[i][i] = 1.0;
                for j in (i + 1)..n {
                    let sim = cosine_similarity(&vectors[i], &vectors[j]) as f64;
                    matrix[i][j] = sim;
                    matrix[j][i] = sim;
                }
            }
            let query_sims = (0..n)
                .map(|i| cosine_similarity(&vectors[i], query_vec) as f64)
                .collect();
            SimilarityContext {
                matrix,
                query_sims,
                degraded: false,
            }
        }
        Err(e) => {
            warn!(error = %e, "embedding service failed, falling back to keyword overlap");
            let sets: Vec<HashSet<String>> = texts.iter().map(|t| keyword_set(t)).collect();
            let query_set = keyword_set(query);
            let n = texts.len();
            let mut matrix = vec![vec![0.0f64; n]; n];
            for i in 0..n {
                matrix[i][i] = 1.0;
                for j in (i + 1)..n {
                    let sim = jaccard(&sets[i], &sets[j]);
                    matrix[i][j] = sim;
                    matrix[j][i] = sim;
                }
            }
            let query_sims = (0..n).map(|i| jaccard(&sets[i], &query_set)).collect();
            SimilarityContext {
                matrix,
                query_sims,
                degraded: true,
            }
        }
    }
}

/// Size cap for a cluster given the run's total evidence count and the
/// cluster's distinct domain count.
pub fn cluster_cap(total: usize, domain_count: usize) -> usize {
    let n = total as f64;
    let base = 3usize.max((0.20 * n).ceil() as usize);
    let domain_bonus = ((0.10 * n).ceil() as usize) * domain_count.saturating_sub(1);
    let hard_ceiling = 8usize.max((0.35 * n).ceil() as usize);
    (base + domain_bonus).min(hard_ceiling)
}

/// Group items by seed similarity, reject single-domain clusters, and trim
/// over-cap clusters to their highest-similarity members.
///
/// Returns the valid clusters and the number rejected for lacking domain
/// diversity. Trim ties keep stable input order.
pub fn cluster_evidence(
    ctx: &SimilarityContext,
    domains: &[String],
    threshold: f64,
    total: usize,
) -> (Vec<Cluster>, usize) {
    let n = domains.len();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        let mut placed = false;
        for group in groups.iter_mut() {
            let seed = group[0];
            if ctx.similarity(i, seed) >= threshold {
                group.push(i);
                placed = true;
                break;
            }
        }
        if !placed {
            groups.push(vec![i]);
        }
    }

    let mut clusters = Vec::new();
    let mut rejected = 0usize;
    for mut members in groups {
        if members.is_empty() {
            // Defensive: malformed groups are skipped, never fatal.
            continue;
        }
        let distinct = distinct_domains(&members, domains);
        if distinct.len() < 2 {
            if members.len() > 1 {
                debug!(size = members.len(), "rejecting single-domain cluster");
            }
            rejected += 1;
            continue;
        }

        let cap = cluster_cap(total, distinct.len());
        if members.len() > cap {
            let seed = members[0];
            // Stable sort: equal similarities keep input order.
            members.sort_by(|&a, &b| {
                ctx.similarity(b, seed)
                    .partial_cmp(&ctx.similarity(a, seed))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            members.truncate(cap);
            members.sort_unstable();
            debug!(cap, "trimmed over-cap cluster");
        }

        let distinct = distinct_domains(&members, domains);
        if distinct.len() < 2 {
            rejected += 1;
            continue;
        }

        clusters.push(Cluster {
            size: members.len(),
            indices: members,
            domains: distinct,
            representative: None,
        });
    }

    (clusters, rejected)
}

fn distinct_domains(members: &[usize], domains: &[String]) -> Vec<String> {
    let mut out: Vec<String> = members
        .iter()
        .map(|&i| domains[i].clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    out.sort();
    out
}

/// Keywords for the degraded similarity path: lowercase, stop-words and
/// short tokens removed.
pub fn keyword_set(text: &str) -> HashSet<String> {
    const STOP_WORDS: &[&str] = &[
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "shall", "should", "may", "might", "must",
        "can", "could", "of", "in", "to", "for", "with", "on", "at", "from", "by", "about",
        "as", "into", "through", "during", "before", "after", "above", "below", "between",
        "this", "that", "these", "those", "it", "its", "and", "but", "or",
    ];
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect()
}

/// Jaccard similarity between two keyword sets.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
