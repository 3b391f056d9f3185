//! Fundamental types shared across the triangulation pipeline.
//!
//! `EvidenceItem` is immutable once collected. Everything the pipeline
//! derives about an item lives in `EvidenceAnnotations`, an explicit typed
//! record attached at canonicalization/tiering time, so no stage ever
//! patches attributes onto evidence after the fact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One collected fragment of evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Unique identifier assigned at collection time.
    pub id: Uuid,
    /// Source URL.
    pub url: String,
    /// Resolved source domain (host without scheme).
    pub domain: String,
    /// Free text collected from the source.
    pub text: String,
    /// When this fragment was collected.
    pub collected_at: DateTime<Utc>,
    /// Publication date, when the collector could determine one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Explicit DOI, when the collector extracted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    /// Whether the source is peer-reviewed.
    #[serde(default)]
    pub peer_reviewed: bool,
    /// Whether the collector marked this as an official/primary source.
    #[serde(default)]
    pub official: bool,
    /// Upstream primary citation bound to this item, if the source is an
    /// aggregator that cites one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cited_primary: Option<String>,
    /// Externally assigned credibility score in [0, 1].
    pub credibility: f64,
}

/// Source trust tier, ordered from most to least trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTier {
    /// Official statistics agencies and peer-reviewed venues.
    Tier1,
    /// Working papers and government reports.
    Tier2,
    /// Think tanks and curated aggregators.
    Tier3,
    /// Everything else.
    Tier4,
}

impl DomainTier {
    /// Credibility weight for this tier.
    pub fn weight(&self) -> f64 {
        match self {
            DomainTier::Tier1 => 1.0,
            DomainTier::Tier2 => 0.8,
            DomainTier::Tier3 => 0.6,
            DomainTier::Tier4 => 0.4,
        }
    }
}

/// Typed annotations derived for one evidence item during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceAnnotations {
    /// Canonical identity string used for deduplication.
    pub canonical_id: String,
    /// Resolved trust tier.
    pub tier: DomainTier,
    /// Credibility weight from the tier table.
    pub weight: f64,
    /// Whether this item counts toward the primary-source share.
    pub is_primary: bool,
    /// Index of the cluster this item belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

/// An evidence item together with its run-scoped annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedEvidence {
    pub item: EvidenceItem,
    pub annotations: EvidenceAnnotations,
}

/// Coarse classification of the research topic, used to select quality
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Statistics-style queries (rates, counts, economic indicators).
    Stats,
    /// Travel and tourism queries.
    Travel,
    /// Medical and health queries.
    Medical,
    /// Anything else.
    Default,
}

impl Intent {
    /// All intents, in threshold-table order.
    pub const ALL: [Intent; 4] = [
        Intent::Stats,
        Intent::Travel,
        Intent::Medical,
        Intent::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Stats => "stats",
            Intent::Travel => "travel",
            Intent::Medical => "medical",
            Intent::Default => "default",
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stats" => Ok(Intent::Stats),
            "travel" => Ok(Intent::Travel),
            "medical" => Ok(Intent::Medical),
            "default" => Ok(Intent::Default),
            other => Err(crate::error::ConfigError::UnknownIntent {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
