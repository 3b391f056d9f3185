//! Quality gate — intent-keyed thresholds and the binary publish decision.
//!
//! Thresholds are resolved per research intent, with a stricter variant for
//! strict mode. The verdict is hard: any failed threshold fails the gate,
//! and the structured explanation carries each metric's actual and required
//! values plus a remediation hint for the report composer's
//! insufficient-evidence output. All comparisons are boundary-inclusive: a
//! metric exactly at its floor (or ceiling) passes.

use super::metrics::QualityMetrics;
use crate::error::ConfigError;
use crate::types::Intent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum/maximum values one intent requires of a run's metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_primary_share: f64,
    pub min_triangulation_rate: f64,
    pub max_domain_concentration: f64,
    pub min_unique_domains: usize,
    pub min_recent_primary: usize,
    pub min_triangulated_clusters: usize,
}

/// Strict and lenient variants for one intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentThresholds {
    pub strict: QualityThresholds,
    pub lenient: QualityThresholds,
}

/// The full intent-keyed threshold table. Keys are intent names so the
/// table round-trips through TOML/JSON configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub intents: HashMap<String, IntentThresholds>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let mut intents = HashMap::new();
        intents.insert(
            Intent::Stats.as_str().to_string(),
            IntentThresholds {
                strict: QualityThresholds {
                    min_primary_share: 0.55,
                    min_triangulation_rate: 0.50,
                    max_domain_concentration: 0.70,
                    min_unique_domains: 3,
                    min_recent_primary: 3,
                    min_triangulated_clusters: 2,
                },
                lenient: QualityThresholds {
                    min_primary_share: 0.40,
                    min_triangulation_rate: 0.40,
                    max_domain_concentration: 0.80,
                    min_unique_domains: 2,
                    min_recent_primary: 2,
                    min_triangulated_clusters: 1,
                },
            },
        );
        intents.insert(
            Intent::Travel.as_str().to_string(),
            IntentThresholds {
                strict: QualityThresholds {
                    min_primary_share: 0.35,
                    min_triangulation_rate: 0.40,
                    max_domain_concentration: 0.75,
                    min_unique_domains: 3,
                    min_recent_primary: 2,
                    min_triangulated_clusters: 2,
                },
                lenient: QualityThresholds {
                    min_primary_share: 0.20,
                    min_triangulation_rate: 0.30,
                    max_domain_concentration: 0.85,
                    min_unique_domains: 2,
                    min_recent_primary: 1,
                    min_triangulated_clusters: 1,
                },
            },
        );
        intents.insert(
            Intent::Medical.as_str().to_string(),
            IntentThresholds {
                strict: QualityThresholds {
                    min_primary_share: 0.60,
                    min_triangulation_rate: 0.50,
                    max_domain_concentration: 0.65,
                    min_unique_domains: 4,
                    min_recent_primary: 3,
                    min_triangulated_clusters: 3,
                },
                lenient: QualityThresholds {
                    min_primary_share: 0.50,
                    min_triangulation_rate: 0.40,
                    max_domain_concentration: 0.75,
                    min_unique_domains: 3,
                    min_recent_primary: 2,
                    min_triangulated_clusters: 2,
                },
            },
        );
        intents.insert(
            Intent::Default.as_str().to_string(),
            IntentThresholds {
                strict: QualityThresholds {
                    min_primary_share: 0.50,
                    min_triangulation_rate: 0.40,
                    max_domain_concentration: 0.70,
                    min_unique_domains: 3,
                    min_recent_primary: 2,
                    min_triangulated_clusters: 2,
                },
                lenient: QualityThresholds {
                    min_primary_share: 0.30,
                    min_triangulation_rate: 0.30,
                    max_domain_concentration: 0.80,
                    min_unique_domains: 2,
                    min_recent_primary: 1,
                    min_triangulated_clusters: 1,
                },
            },
        );
        Self { intents }
    }
}

impl ThresholdTable {
    /// Resolve the threshold bundle for an intent. A missing intent is a
    /// configuration defect and fails loudly.
    pub fn resolve(
        &self,
        intent: Intent,
        strict: bool,
    ) -> Result<QualityThresholds, ConfigError> {
        let bundle = self.intents.get(intent.as_str()).ok_or_else(|| {
            ConfigError::MalformedThresholds {
                message: format!("no thresholds configured for intent '{}'", intent),
            }
        })?;
        Ok(if strict { bundle.strict } else { bundle.lenient })
    }

    /// Validate that every known intent has an entry and no entry names an
    /// unknown intent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for intent in Intent::ALL {
            if !self.intents.contains_key(intent.as_str()) {
                return Err(ConfigError::MalformedThresholds {
                    message: format!("missing threshold entry for intent '{}'", intent),
                });
            }
        }
        for name in self.intents.keys() {
            name.parse::<Intent>()?;
        }
        Ok(())
    }
}

/// Comparison direction for one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    AtLeast,
    AtMost,
}

/// One metric's gate check with its actual and required values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCheck {
    pub metric: String,
    pub actual: f64,
    pub required: f64,
    pub direction: Direction,
    pub passed: bool,
    /// Remediation hint, present on failed checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// The gate's binary decision with its structured explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    pub passed: bool,
    pub intent: Intent,
    pub strict: bool,
    pub checks: Vec<MetricCheck>,
    /// Human-readable failure summary; empty on pass.
    pub summary: String,
}

/// Evaluate a run's metrics against resolved thresholds.
pub fn evaluate_gate(
    metrics: &QualityMetrics,
    thresholds: &QualityThresholds,
    intent: Intent,
    strict: bool,
) -> GateVerdict {
    let checks = vec![
        check(
            "primary_share",
            metrics.primary_share,
            thresholds.min_primary_share,
            Direction::AtLeast,
            "collect more primary sources (official statistics, peer-reviewed work)",
        ),
        check(
            "triangulation_rate",
            metrics.triangulation_rate,
            thresholds.min_triangulation_rate,
            Direction::AtLeast,
            "gather corroborating coverage of the same facts from additional outlets",
        ),
        check(
            "domain_concentration",
            metrics.domain_concentration,
            thresholds.max_domain_concentration,
            Direction::AtMost,
            "diversify sources; one domain dominates the evidence",
        ),
        check(
            "unique_domains",
            metrics.unique_domains as f64,
            thresholds.min_unique_domains as f64,
            Direction::AtLeast,
            "search additional independent domains",
        ),
        check(
            "recent_primary",
            metrics.recent_primary as f64,
            thresholds.min_recent_primary as f64,
            Direction::AtLeast,
            "find more recently published primary sources",
        ),
        check(
            "triangulated_clusters",
            metrics.triangulated_clusters as f64,
            thresholds.min_triangulated_clusters as f64,
            Direction::AtLeast,
            "not enough independently corroborated facts; broaden the search",
        ),
    ];

    let passed = checks.iter().all(|c| c.passed);
    let summary = if passed {
        String::new()
    } else {
        let failures: Vec<String> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| {
                format!(
                    "{} is {:.2} (required {} {:.2})",
                    c.metric,
                    c.actual,
                    match c.direction {
                        Direction::AtLeast => ">=",
                        Direction::AtMost => "<=",
                    },
                    c.required
                )
            })
            .collect();
        format!("insufficient evidence quality: {}", failures.join("; "))
    };

    GateVerdict {
        passed,
        intent,
        strict,
        checks,
        summary,
    }
}

fn check(
    metric: &str,
    actual: f64,
    required: f64,
    direction: Direction,
    hint: &str,
) -> MetricCheck {
    let passed = match direction {
        Direction::AtLeast => actual >= required,
        Direction::AtMost => actual <= required,
    };
    MetricCheck {
        metric: metric.to_string(),
        actual,
        required,
        direction,
        passed,
        hint: if passed { None } else { Some(hint.to_string()) },
    }
}

/// Classify a research topic into an intent from keyword cues. Used only
/// when the caller supplies no externally classified intent.
pub fn classify_intent(topic: &str) -> Intent {
    let lowered = topic.to_lowercase();
    const STATS_CUES: &[&str] = &[
        "rate", "gdp", "inflation", "unemployment", "statistics", "percent", "income",
        "revenue", "tax", "population", "emissions", "growth",
    ];
    const TRAVEL_CUES: &[&str] = &[
        "travel", "tourism", "tourist", "visa", "flight", "hotel", "destination", "airline",
    ];
    const MEDICAL_CUES: &[&str] = &[
        "medical", "health", "disease", "vaccine", "vaccination", "clinical", "mortality",
        "treatment", "drug", "dosage",
    ];

    let hits = |cues: &[&str]| cues.iter().filter(|c| lowered.contains(*c)).count();
    let (stats, travel, medical) = (hits(STATS_CUES), hits(TRAVEL_CUES), hits(MEDICAL_CUES));

    let best = stats.max(travel).max(medical);
    if best == 0 {
        Intent::Default
    } else if medical == best {
        // Medical wins ties: its thresholds are the most conservative.
        Intent::Medical
    } else if stats == best {
        Intent::Stats
    } else {
        Intent::Travel
    }
}
