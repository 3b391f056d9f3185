//! Evidence triangulation — the quality core of the research pipeline.
//!
//! Stages, in pipeline order:
//! 1. **Canonicalize** — resolve stable identities, collapse mirrors
//! 2. **Extract** — parse structured numeric claims out of free text
//! 3. **Triangulate** — tolerance-based consensus per claim key
//! 4. **Cluster** — group near-duplicate evidence across domains
//! 5. **Represent** — pick one credibility-weighted member per cluster
//! 6. **Gate** — aggregate metrics, decide pass/fail per intent
//!
//! Every numeric tolerance, domain-diversity rule, and threshold in here is
//! part of the trust model: get one wrong and duplicate or low-quality
//! sources manufacture confidence.

pub mod canonical;
pub mod clustering;
pub mod contradiction;
pub mod domains;
pub mod engine;
pub mod extraction;
pub mod gate;
pub mod lexicon;
pub mod metrics;
pub mod numeric;
pub mod representative;

pub use engine::{RunOutcome, TriangulationEngine};
pub use gate::{GateVerdict, QualityThresholds, ThresholdTable, classify_intent};
pub use metrics::QualityMetrics;
