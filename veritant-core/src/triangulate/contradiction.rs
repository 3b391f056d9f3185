//! Contradiction detection across numeric claims.
//!
//! Runs independently of triangulation's support/dissent split, with a
//! looser display-oriented tolerance: same-key claims from different
//! domains that disagree beyond it are recorded with both values and quote
//! snippets for surfacing in the report. Same-domain pairs are never
//! flagged: one source cannot contradict itself.

use super::lexicon::{Lexicon, NumberUnit};
use super::numeric::{ClaimKey, NumericClaim};
use serde::{Deserialize, Serialize};

/// A recorded disagreement between two same-key claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contradiction {
    pub key: ClaimKey,
    pub value_a: f64,
    pub value_b: f64,
    pub unit: NumberUnit,
    pub domain_a: String,
    pub domain_b: String,
    pub snippet_a: String,
    pub snippet_b: String,
}

/// Scan same-key claim pairs from different domains for disagreement
/// beyond the display tolerance.
pub fn detect_contradictions(
    claims: &[NumericClaim],
    lexicon: &Lexicon,
    display_tolerance: f64,
) -> Vec<Contradiction> {
    let mut out = Vec::new();

    for i in 0..claims.len() {
        for j in (i + 1)..claims.len() {
            let (a, b) = (&claims[i], &claims[j]);
            if a.key != b.key {
                continue;
            }
            if a.source_domain == b.source_domain {
                continue;
            }
            let compatible = lexicon.numbers_compatible(
                (a.value, a.key.unit),
                (b.value, b.key.unit),
                display_tolerance,
            );
            if !compatible {
                out.push(Contradiction {
                    key: a.key.clone(),
                    value_a: a.value,
                    value_b: b.value,
                    unit: a.key.unit,
                    domain_a: a.source_domain.clone(),
                    domain_b: b.source_domain.clone(),
                    snippet_a: a.quote_span.clone(),
                    snippet_b: b.quote_span.clone(),
                });
            }
        }
    }

    out
}
