//! Engine configuration.
//!
//! All tunables live in one `EngineConfig` loaded from an optional TOML
//! file with `VERITANT_`-prefixed environment overrides, merged over coded
//! defaults via figment. Configuration problems fail loudly at load time;
//! they are deployment defects, not data-quality issues.

use crate::embeddings::EmbeddingConfig;
use crate::error::ConfigError;
use crate::triangulate::gate::ThresholdTable;
use crate::types::Intent;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Relative tolerance for numeric triangulation support.
    #[serde(default = "default_numeric_tolerance")]
    pub numeric_tolerance: f64,
    /// Per-metric overrides of the numeric tolerance.
    #[serde(default)]
    pub metric_tolerances: HashMap<String, f64>,
    /// Looser display tolerance for contradiction surfacing.
    #[serde(default = "default_contradiction_tolerance")]
    pub contradiction_tolerance: f64,
    /// Base similarity threshold for clustering.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Per-intent overrides of the clustering threshold, keyed by intent
    /// name.
    #[serde(default = "default_intent_similarity")]
    pub intent_similarity: HashMap<String, f64>,
    /// Topic-similarity floor for representative selection.
    #[serde(default = "default_topic_floor")]
    pub topic_floor: f64,
    /// Cap on the numeric-density weight multiplier.
    #[serde(default = "default_density_bonus_cap")]
    pub density_bonus_cap: f64,
    /// Recency window for the recent-primary metric, in days.
    #[serde(default = "default_recency_lookback_days")]
    pub recency_lookback_days: i64,
    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Intent-keyed gate thresholds.
    #[serde(default)]
    pub thresholds: ThresholdTable,
}

fn default_numeric_tolerance() -> f64 {
    0.03
}

fn default_contradiction_tolerance() -> f64 {
    0.10
}

fn default_similarity_threshold() -> f64 {
    0.55
}

fn default_intent_similarity() -> HashMap<String, f64> {
    // Statistics-style queries cluster more strictly: near-identical
    // figures should group, paraphrases of different facts should not.
    let mut map = HashMap::new();
    map.insert(Intent::Stats.as_str().to_string(), 0.62);
    map
}

fn default_topic_floor() -> f64 {
    0.35
}

fn default_density_bonus_cap() -> f64 {
    1.2
}

fn default_recency_lookback_days() -> i64 {
    365
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numeric_tolerance: default_numeric_tolerance(),
            metric_tolerances: HashMap::new(),
            contradiction_tolerance: default_contradiction_tolerance(),
            similarity_threshold: default_similarity_threshold(),
            intent_similarity: default_intent_similarity(),
            topic_floor: default_topic_floor(),
            density_bonus_cap: default_density_bonus_cap(),
            recency_lookback_days: default_recency_lookback_days(),
            embedding: EmbeddingConfig::default(),
            thresholds: ThresholdTable::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: coded defaults, then an optional TOML file,
    /// then `VERITANT_` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        let config: EngineConfig = figment
            .merge(Env::prefixed("VERITANT_").split("__"))
            .extract()
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate ranges and the threshold table. Called by `load`; call
    /// directly after building a config by hand.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("numeric_tolerance", self.numeric_tolerance),
            ("contradiction_tolerance", self.contradiction_tolerance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    message: format!("{} must be in [0, 1], got {}", name, value),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold)
            || !(0.0..=1.0).contains(&self.topic_floor)
        {
            return Err(ConfigError::Invalid {
                message: "similarity threshold and topic floor must be in [0, 1]".into(),
            });
        }
        if self.density_bonus_cap < 1.0 {
            return Err(ConfigError::Invalid {
                message: format!(
                    "density_bonus_cap must be >= 1.0, got {}",
                    self.density_bonus_cap
                ),
            });
        }
        if self.recency_lookback_days <= 0 {
            return Err(ConfigError::Invalid {
                message: "recency_lookback_days must be positive".into(),
            });
        }
        self.thresholds.validate()
    }

    /// Clustering threshold for an intent, with per-intent overrides.
    pub fn similarity_threshold_for(&self, intent: Intent) -> f64 {
        self.intent_similarity
            .get(intent.as_str())
            .copied()
            .unwrap_or(self.similarity_threshold)
    }
}
