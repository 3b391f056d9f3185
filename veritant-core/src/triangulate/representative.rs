//! Representative selection — one credibility-weighted member per cluster.
//!
//! Candidates must clear a topic-similarity floor against the original
//! query; if none do, the single best-similarity candidate is used rather
//! than silently picking an unrelated sentence. Among floor-passers the
//! winner is the weighted medoid: the member minimizing the weighted sum of
//! pairwise cosine distances, with weights combining tier credibility and a
//! capped numeric-density bonus. The result is a sentence that is both
//! authoritative and broadly representative of the cluster, not merely the
//! one closest to the query.

use super::clustering::SimilarityContext;
use tracing::debug;

/// Inputs for weighting one candidate.
#[derive(Debug, Clone, Copy)]
pub struct CandidateWeight {
    /// Credibility weight from the domain tier table.
    pub credibility: f64,
    /// Numbers per word in the candidate text.
    pub numeric_density: f64,
}

/// Select the representative member of a cluster.
///
/// `members` are indices into the run's evidence list; the return value is
/// one of them. Empty member lists yield `None` (tolerated defensively).
pub fn select_representative(
    members: &[usize],
    ctx: &SimilarityContext,
    weights: &[CandidateWeight],
    topic_floor: f64,
    density_bonus_cap: f64,
) -> Option<usize> {
    if members.is_empty() {
        return None;
    }
    if members.len() == 1 {
        return Some(members[0]);
    }

    let passers: Vec<usize> = members
        .iter()
        .copied()
        .filter(|&i| ctx.query_sims[i] >= topic_floor)
        .collect();

    if passers.is_empty() {
        // Nobody clears the floor: fall back to the best available rather
        // than an arbitrary member. First index wins ties (stable).
        let best = members
            .iter()
            .copied()
            .max_by(|&a, &b| {
                ctx.query_sims[a]
                    .partial_cmp(&ctx.query_sims[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?;
        debug!(member = best, "no candidate cleared the topic floor");
        return Some(best);
    }
    if passers.len() == 1 {
        return Some(passers[0]);
    }

    let raw: Vec<f64> = passers
        .iter()
        .map(|&i| {
            let w = weights[i];
            w.credibility * (1.0 + w.numeric_density).min(density_bonus_cap)
        })
        .collect();
    let total: f64 = raw.iter().sum();
    let normalized: Vec<f64> = if total > 0.0 {
        raw.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / passers.len() as f64; passers.len()]
    };

    // Weighted medoid: minimize the weighted sum of distances to the other
    // floor-passing members.
    let mut best = passers[0];
    let mut best_cost = f64::INFINITY;
    for (pi, &i) in passers.iter().enumerate() {
        let cost: f64 = passers
            .iter()
            .enumerate()
            .filter(|&(pj, _)| pj != pi)
            .map(|(pj, &j)| normalized[pj] * (1.0 - ctx.similarity(i, j)))
            .sum();
        if cost < best_cost {
            best_cost = cost;
            best = i;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(matrix: Vec<Vec<f64>>, query_sims: Vec<f64>) -> SimilarityContext {
        SimilarityContext {
            matrix,
            query_sims,
            degraded: false,
        }
    }

    fn uniform_weights(n: usize) -> Vec<CandidateWeight> {
        vec![
            CandidateWeight {
                credibility: 1.0,
                numeric_density: 0.0,
            };
            n
        ]
    }

    #[test]
    fn test_empty_cluster_none() {
        let c = ctx(vec![], vec![]);
        assert_eq!(select_representative(&[], &c, &[], 0.35, 1.2), None);
    }

    #[test]
    fn test_floor_respected_when_any_candidate_clears() {
        // Member 2 is most central but below the floor; it must not win.
        let matrix = vec![
            vec![1.0, 0.8, 0.9],
            vec![0.8, 1.0, 0.9],
            vec![0.9, 0.9, 1.0],
        ];
        let c = ctx(matrix, vec![0.6, 0.5, 0.1]);
        let rep = select_representative(&[0, 1, 2], &c, &uniform_weights(3), 0.35, 1.2).unwrap();
        assert_ne!(rep, 2);
    }

    #[test]
    fn test_fallback_when_none_clear_floor() {
        let matrix = vec![vec![1.0, 0.9], vec![0.9, 1.0]];
        let c = ctx(matrix, vec![0.2, 0.3]);
        let rep = select_representative(&[0, 1], &c, &uniform_weights(2), 0.35, 1.2).unwrap();
        // Best query similarity wins the fallback.
        assert_eq!(rep, 1);
    }

    #[test]
    fn test_medoid_prefers_central_member() {
        // Member 1 is close to both others; 0 and 2 are far apart.
        let matrix = vec![
            vec![1.0, 0.9, 0.2],
            vec![0.9, 1.0, 0.9],
            vec![0.2, 0.9, 1.0],
        ];
        let c = ctx(matrix, vec![0.8, 0.8, 0.8]);
        let rep = select_representative(&[0, 1, 2], &c, &uniform_weights(3), 0.35, 1.2).unwrap();
        assert_eq!(rep, 1);
    }

    #[test]
    fn test_credibility_breaks_symmetry() {
        // Symmetric geometry; the high-credibility neighbor pulls the
        // medoid toward member 0's side.
        let matrix = vec![
            vec![1.0, 0.9, 0.5],
            vec![0.9, 1.0, 0.5],
            vec![0.5, 0.5, 1.0],
        ];
        let mut weights = uniform_weights(3);
        weights[0].credibility = 1.0;
        weights[1].credibility = 1.0;
        weights[2].credibility = 0.4;
        let c = ctx(matrix, vec![0.8, 0.8, 0.8]);
        let rep = select_representative(&[0, 1, 2], &c, &weights, 0.35, 1.2).unwrap();
        assert!(rep == 0 || rep == 1);
    }

    #[test]
    fn test_density_bonus_capped() {
        let w = CandidateWeight {
            credibility: 1.0,
            numeric_density: 5.0,
        };
        // The bonus multiplier saturates at the cap.
        assert_eq!((1.0 + w.numeric_density).min(1.2), 1.2);
    }

    #[test]
    fn test_singleton_cluster_trivial() {
        let matrix = vec![vec![1.0]];
        let c = ctx(matrix, vec![0.0]);
        assert_eq!(
            select_representative(&[0], &c, &uniform_weights(1), 0.35, 1.2),
            Some(0)
        );
    }
}
