//! # Veritant Core
//!
//! Evidence triangulation and quality-gating engine. Canonicalizes and
//! deduplicates collected evidence, extracts structured numeric claims,
//! requires corroboration across independent source domains, and gates
//! report production on aggregate quality metrics.
//!
//! Collection, LLM-assisted synthesis, and report rendering are external
//! collaborators: evidence comes in, gate decisions and metrics go out.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod triangulate;
pub mod types;

// Re-export commonly used types at the crate root.
pub use config::EngineConfig;
pub use embeddings::{Embedder, EmbeddingConfig, LocalEmbedder, RemoteEmbedder, create_embedder};
pub use error::{ConfigError, EmbeddingError, Result, VeritantError};
pub use triangulate::{
    GateVerdict, QualityMetrics, QualityThresholds, RunOutcome, ThresholdTable,
    TriangulationEngine, classify_intent,
};
pub use types::{AnnotatedEvidence, DomainTier, EvidenceAnnotations, EvidenceItem, Intent};
