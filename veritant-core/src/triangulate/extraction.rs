//! Structured claim extraction — turns free text into normalized numeric
//! assertions.
//!
//! A claim needs a metric keyword in proximity to a number. Geography comes
//! from the same line, the period from a ±1 line window. Claims without an
//! extractable period are dropped: temporal context is mandatory, and
//! under-extraction beats inventing ungrounded numeric facts.

use super::lexicon::{Lexicon, NumberUnit};
use crate::types::EvidenceItem;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum distance in bytes between a metric keyword and its number.
const PROXIMITY_WINDOW: usize = 90;

/// A normalized numeric assertion extracted from one evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredClaim {
    /// Canonical geography/entity, when one was found nearby.
    pub entity: Option<String>,
    /// Canonical metric token.
    pub metric: String,
    /// Canonical period label.
    pub period: String,
    /// Extracted value.
    pub value: f64,
    /// Extracted unit.
    pub unit: NumberUnit,
    /// The line of text the claim came from.
    pub raw_text: String,
}

impl StructuredClaim {
    /// Grouping key, present only when entity, metric, and period all are.
    /// Claims missing any part never merge with others.
    pub fn group_key(&self) -> Option<String> {
        self.entity
            .as_ref()
            .map(|entity| format!("{}|{}|{}", entity, self.metric, self.period))
    }
}

/// Tally of extraction outcomes for one run, surfaced for transparency.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub claims_extracted: usize,
    pub dropped_no_period: usize,
    pub dropped_no_number: usize,
}

/// Extract all structured claims from one evidence item.
pub fn extract_claims(
    item: &EvidenceItem,
    lexicon: &Lexicon,
    stats: &mut ExtractionStats,
) -> Vec<StructuredClaim> {
    let lines: Vec<String> = item.text.lines().map(|l| l.to_lowercase()).collect();
    let mut claims = Vec::new();

    for (line_no, line) in lines.iter().enumerate() {
        let Some(metric) = lexicon.find_metric(line) else {
            continue;
        };

        let numbers = lexicon.find_numbers(line);
        let Some(number) = nearest_number(&numbers, metric.start, metric.end) else {
            stats.dropped_no_number += 1;
            continue;
        };

        let period = match period_in_window(lexicon, &lines, line_no) {
            Some(p) => p,
            None => {
                stats.dropped_no_period += 1;
                debug!(
                    metric = %metric.canonical,
                    line = line_no,
                    "dropping claim without temporal context"
                );
                continue;
            }
        };

        let entity = lexicon.find_geography(line).map(|g| g.canonical).or_else(|| {
            neighbor_lines(&lines, line_no)
                .into_iter()
                .find_map(|l| lexicon.find_geography(l).map(|g| g.canonical))
        });

        claims.push(StructuredClaim {
            entity,
            metric: metric.canonical,
            period,
            value: number.value,
            unit: number.unit,
            raw_text: line.clone(),
        });
        stats.claims_extracted += 1;
    }

    claims
}

/// The number closest to the metric keyword span, within the proximity
/// window. Earlier numbers win distance ties (stable).
fn nearest_number(
    numbers: &[super::lexicon::NumberMatch],
    metric_start: usize,
    metric_end: usize,
) -> Option<super::lexicon::NumberMatch> {
    numbers
        .iter()
        .map(|n| {
            let distance = if n.end <= metric_start {
                metric_start - n.end
            } else if n.start >= metric_end {
                n.start - metric_end
            } else {
                0
            };
            (distance, n)
        })
        .filter(|(d, _)| *d <= PROXIMITY_WINDOW)
        .min_by_key(|(d, _)| *d)
        .map(|(_, n)| n.clone())
}

/// Period from the claim's line, else from its immediate neighbors.
fn period_in_window(lexicon: &Lexicon, lines: &[String], line_no: usize) -> Option<String> {
    if let Some(p) = lexicon.find_period(&lines[line_no]) {
        return Some(p);
    }
    neighbor_lines(lines, line_no)
        .into_iter()
        .find_map(|l| lexicon.find_period(l))
}

fn neighbor_lines(lines: &[String], line_no: usize) -> Vec<&String> {
    let mut out = Vec::new();
    if line_no > 0 {
        out.push(&lines[line_no - 1]);
    }
    if line_no + 1 < lines.len() {
        out.push(&lines[line_no + 1]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_item(text: &str) -> EvidenceItem {
        EvidenceItem {
            id: Uuid::new_v4(),
            url: "https://example.com/a".into(),
            domain: "example.com".into(),
            text: text.to_string(),
            collected_at: Utc::now(),
            published_at: None,
            doi: None,
            peer_reviewed: false,
            official: false,
            cited_primary: None,
            credibility: 0.5,
        }
    }

    #[test]
    fn test_extract_full_claim() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item(
            "International tourist arrivals in France reached 100 million in 2024.",
        );
        let claims = extract_claims(&item, &lex, &mut stats);
        assert_eq!(claims.len(), 1);
        let claim = &claims[0];
        assert_eq!(claim.metric, "international_tourist_arrivals");
        assert_eq!(claim.entity.as_deref(), Some("france"));
        assert_eq!(claim.period, "2024");
        assert_eq!(claim.value, 100.0);
        assert_eq!(claim.unit, NumberUnit::Million);
        assert_eq!(
            claim.group_key().as_deref(),
            Some("france|international_tourist_arrivals|2024")
        );
    }

    #[test]
    fn test_period_from_neighbor_line() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item(
            "Figures cover Q1 2025.\nThe unemployment rate stood at 4.1% for the U.S.",
        );
        let claims = extract_claims(&item, &lex, &mut stats);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].period, "Q1 2025");
        assert_eq!(claims[0].entity.as_deref(), Some("united states"));
    }

    #[test]
    fn test_no_period_drops_claim() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item("The unemployment rate stood at 4.1%.");
        let claims = extract_claims(&item, &lex, &mut stats);
        assert!(claims.is_empty());
        assert_eq!(stats.dropped_no_period, 1);
    }

    #[test]
    fn test_no_number_no_claim() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item("The unemployment rate will be discussed in 2025.");
        // The only number is a bare year, which is temporal, not a value.
        let claims = extract_claims(&item, &lex, &mut stats);
        assert!(claims.is_empty());
        assert_eq!(stats.dropped_no_number, 1);
    }

    #[test]
    fn test_missing_entity_keeps_claim_but_no_key() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item("Hotel occupancy reached 71% in Q2 2024 across the sampled cities.");
        let claims = extract_claims(&item, &lex, &mut stats);
        assert_eq!(claims.len(), 1);
        assert!(claims[0].entity.is_none());
        assert!(claims[0].group_key().is_none());
    }

    #[test]
    fn test_multiple_claims_one_item() {
        let lex = Lexicon::default();
        let mut stats = ExtractionStats::default();
        let item = make_item(
            "Inflation in Germany was 2.4% in 2024.\nUnemployment in Germany was 5.9% in 2024.",
        );
        let claims = extract_claims(&item, &lex, &mut stats);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].metric, "inflation_rate");
        assert_eq!(claims[1].metric, "unemployment_rate");
    }
}
