//! Domain tier classification and credibility weighting.
//!
//! A static ordered table maps source domains to trust tiers: TIER1 for
//! official statistics agencies and peer-reviewed venues, TIER2 for working
//! papers and government reports, TIER3 for think tanks and curated
//! aggregators, TIER4 for everything else. Peer-review flags on an item
//! override host-based tiering.
//!
//! `mark_primary` flags TIER1 sources and `.gov` TIER2 sources as primary.
//! Aggregator domains are primary only when the item carries a bound
//! upstream primary citation, so a popular secondary aggregator cannot
//! inflate the primary-source share.

use crate::types::{DomainTier, EvidenceItem};
use serde::{Deserialize, Serialize};

/// Static domain classification tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainTable {
    pub tier1: Vec<String>,
    pub tier2: Vec<String>,
    pub tier3: Vec<String>,
    /// Curated aggregators, a subset of tier3 hosts with the primary
    /// carve-out applied.
    pub aggregators: Vec<String>,
}

impl Default for DomainTable {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            tier1: owned(&[
                "unwto.org",
                "oecd.org",
                "imf.org",
                "worldbank.org",
                "bls.gov",
                "census.gov",
                "bea.gov",
                "cdc.gov",
                "who.int",
                "ecb.europa.eu",
                "eurostat.ec.europa.eu",
                "ec.europa.eu",
                "ons.gov.uk",
                "nature.com",
                "science.org",
                "thelancet.com",
                "nejm.org",
                "pubmed.ncbi.nlm.nih.gov",
            ]),
            tier2: owned(&[
                "nber.org",
                "ssrn.com",
                "arxiv.org",
                "crsreports.congress.gov",
                "gao.gov",
                "cbo.gov",
                "federalreserve.gov",
                "treasury.gov",
            ]),
            tier3: owned(&[
                "brookings.edu",
                "pewresearch.org",
                "rand.org",
                "statista.com",
                "ourworldindata.org",
                "tradingeconomics.com",
                "wttc.org",
            ]),
            aggregators: owned(&[
                "statista.com",
                "ourworldindata.org",
                "tradingeconomics.com",
            ]),
        }
    }
}

impl DomainTable {
    /// Classify a domain into its tier. Peer-reviewed items are TIER1
    /// regardless of host. Unknown domains land in TIER4.
    pub fn classify(&self, domain: &str, peer_reviewed: bool) -> DomainTier {
        if peer_reviewed {
            return DomainTier::Tier1;
        }
        let host = domain.to_lowercase();
        if self.matches_any(&self.tier1, &host) {
            DomainTier::Tier1
        } else if self.matches_any(&self.tier2, &host) {
            DomainTier::Tier2
        } else if self.matches_any(&self.tier3, &host) {
            DomainTier::Tier3
        } else {
            DomainTier::Tier4
        }
    }

    /// Credibility weight for a domain, with the TIER4 floor for unknowns.
    pub fn weight(&self, domain: &str, peer_reviewed: bool) -> f64 {
        self.classify(domain, peer_reviewed).weight()
    }

    /// Decide whether an item counts as a primary source.
    pub fn mark_primary(&self, item: &EvidenceItem, tier: DomainTier) -> bool {
        let host = item.domain.to_lowercase();
        if self.matches_any(&self.aggregators, &host) {
            // An aggregator is primary only via a bound upstream citation.
            return item.cited_primary.is_some();
        }
        match tier {
            DomainTier::Tier1 => true,
            DomainTier::Tier2 => is_gov_host(&host),
            _ => item.official,
        }
    }

    fn matches_any(&self, table: &[String], host: &str) -> bool {
        table
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
    }
}

fn is_gov_host(host: &str) -> bool {
    host.ends_with(".gov") || host.contains(".gov.") || host.ends_with(".gouv.fr")
}

/// Annotation bundle produced by tiering one item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierAssignment {
    pub tier: DomainTier,
    pub weight: f64,
    pub is_primary: bool,
}

/// Classify, weight, and primary-mark one item in a single pass.
pub fn assign_tier(table: &DomainTable, item: &EvidenceItem) -> TierAssignment {
    let tier = table.classify(&item.domain, item.peer_reviewed);
    TierAssignment {
        tier,
        weight: tier.weight(),
        is_primary: table.mark_primary(item, tier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_item(domain: &str) -> EvidenceItem {
        EvidenceItem {
            id: Uuid::new_v4(),
            url: format!("https://{}/page", domain),
            domain: domain.to_string(),
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

    #[test]
    fn test_tier_classification() {
        let table = DomainTable::default();
        assert_eq!(table.classify("unwto.org", false), DomainTier::Tier1);
        assert_eq!(table.classify("nber.org", false), DomainTier::Tier2);
        assert_eq!(table.classify("brookings.edu", false), DomainTier::Tier3);
        assert_eq!(table.classify("someblog.net", false), DomainTier::Tier4);
    }

    #[test]
    fn test_subdomain_matches() {
        let table = DomainTable::default();
        assert_eq!(table.classify("data.worldbank.org", false), DomainTier::Tier1);
        assert_eq!(table.classify("papers.ssrn.com", false), DomainTier::Tier2);
    }

    #[test]
    fn test_peer_review_overrides_host() {
        let table = DomainTable::default();
        assert_eq!(table.classify("someblog.net", true), DomainTier::Tier1);
        assert_eq!(table.weight("someblog.net", true), 1.0);
    }

    #[test]
    fn test_unknown_domain_floor() {
        let table = DomainTable::default();
        assert_eq!(table.weight("random.example", false), 0.4);
    }

    #[test]
    fn test_primary_tier1_and_gov_tier2() {
        let table = DomainTable::default();
        let t1 = make_item("oecd.org");
        let assignment = assign_tier(&table, &t1);
        assert!(assignment.is_primary);

        let gov = make_item("gao.gov");
        let assignment = assign_tier(&table, &gov);
        assert_eq!(assignment.tier, DomainTier::Tier2);
        assert!(assignment.is_primary);

        let wp = make_item("nber.org");
        let assignment = assign_tier(&table, &wp);
        assert_eq!(assignment.tier, DomainTier::Tier2);
        assert!(!assignment.is_primary);
    }

    #[test]
    fn test_aggregator_needs_upstream_citation() {
        let table = DomainTable::default();

        let mut agg = make_item("ourworldindata.org");
        let assignment = assign_tier(&table, &agg);
        assert!(!assignment.is_primary);

        agg.cited_primary = Some("https://unwto.org/barometer".into());
        let assignment = assign_tier(&table, &agg);
        assert!(assignment.is_primary);
    }

    #[test]
    fn test_tier4_official_flag_respected() {
        let table = DomainTable::default();
        let mut item = make_item("tourism.gov.example");
        item.official = true;
        let assignment = assign_tier(&table, &item);
        assert_eq!(assignment.tier, DomainTier::Tier4);
        assert!(assignment.is_primary);
    }
}
