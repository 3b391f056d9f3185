//! Pluggable embedding providers for semantic clustering.
//!
//! Provides a trait-based abstraction over the external similarity service,
//! with a local hash-TF implementation (always available, deterministic) and
//! a remote HTTP batch client. The engine computes cosine similarity itself
//! from the normalized vectors; providers only turn text into vectors.
//!
//! Providers are created once per run and shared through an `Arc` handle so
//! model/client setup cost is paid a single time.

use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Trait for embedding providers.
///
/// `embed_batch` is the primary entry point: the clustering stage embeds
/// every candidate sentence (plus the query) in one call to amortize
/// latency. Vectors are L2-normalized, fixed-length.
pub trait Embedder: Send + Sync {
    /// Generate normalized embeddings for a batch of texts.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Return the dimensionality of embeddings.
    fn dimensions(&self) -> usize;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "local" (default) or "remote".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Remote model name, when the provider is "remote".
    #[serde(default)]
    pub model: Option<String>,
    /// Remote endpoint base URL, when the provider is "remote".
    #[serde(default)]
    pub base_url: Option<String>,
    /// Embedding dimensions (provider default if 0).
    #[serde(default)]
    pub dimensions: usize,
}

fn default_provider() -> String {
    "local".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".into(),
            model: None,
            base_url: None,
            dimensions: 0,
        }
    }
}

/// Local hash-TF embedder (always available, no external dependencies).
///
/// Each word is hashed to a dimension index and its term frequency
/// accumulated; the result is L2-normalized. Deterministic across runs.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimensions: usize,
}

impl LocalEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return vector;
        }

        let mut tf: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            *tf.entry(word).or_insert(0) += 1;
        }

        for (term, count) in &tf {
            let idx = simple_hash(term) % self.dimensions;
            vector[idx] += *count as f32;
        }

        normalize(&mut vector);
        vector
    }
}

/// djb2-style string hash, stable across platforms.
fn simple_hash(s: &str) -> usize {
    let mut hash: usize = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(b as usize);
    }
    hash
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

impl Embedder for LocalEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}

/// Remote batch embedder speaking an Ollama-style embed API.
///
/// POST `{base_url}/api/embed` with `{"model": ..., "input": [...]}`,
/// expecting `{"embeddings": [[...], ...]}`. The trait is sync, so the
/// request is driven through the ambient tokio runtime handle.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    model: String,
    dims: usize,
    base_url: String,
}

impl RemoteEmbedder {
    pub fn new(model: Option<String>, base_url: Option<String>, dimensions: usize) -> Self {
        let model = model.unwrap_or_else(|| "nomic-embed-text".into());
        let dims = if dimensions > 0 {
            dimensions
        } else {
            match model.as_str() {
                "nomic-embed-text" => 768,
                "mxbai-embed-large" => 1024,
                "all-minilm" => 384,
                _ => 768,
            }
        };
        Self {
            client: reqwest::Client::new(),
            model,
            dims,
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
        }
    }

    fn embed_batch_sync(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| EmbeddingError::NoRuntime)?;

        let client = self.client.clone();
        let model = self.model.clone();
        let base_url = self.base_url.clone();
        let texts_owned: Vec<String> = texts.iter().map(|s| s.to_string()).collect();

        std::thread::scope(|s| {
            s.spawn(|| {
                handle.block_on(async {
                    Self::embed_api_call(&client, &model, &base_url, &texts_owned).await
                })
            })
            .join()
            .map_err(|_| EmbeddingError::Request {
                message: "embedding worker thread panicked".into(),
            })?
        })
    }

    async fn embed_api_call(
        client: &reqwest::Client,
        model: &str,
        base_url: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/api/embed", base_url);
        let body = serde_json::json!({
            "model": model,
            "input": texts,
        });

        let resp = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Request {
                message: e.to_string(),
            })?;

        let json: serde_json::Value =
            resp.json().await.map_err(|e| EmbeddingError::ResponseParse {
                message: e.to_string(),
            })?;

        let rows = json["embeddings"]
            .as_array()
            .ok_or_else(|| EmbeddingError::ResponseParse {
                message: "missing 'embeddings' array in response".into(),
            })?;

        if rows.len() != texts.len() {
            return Err(EmbeddingError::BatchMismatch {
                sent: texts.len(),
                received: rows.len(),
            });
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut vector: Vec<f32> = row
                .as_array()
                .ok_or_else(|| EmbeddingError::ResponseParse {
                    message: "embedding row is not an array".into(),
                })?
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            normalize(&mut vector);
            out.push(vector);
        }
        Ok(out)
    }
}

impl Embedder for RemoteEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.embed_batch_sync(texts)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_name(&self) -> &str {
        "remote"
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Factory function to create an embedder based on configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Box<dyn Embedder> {
    match config.provider.as_str() {
        "remote" => Box::new(RemoteEmbedder::new(
            config.model.clone(),
            config.base_url.clone(),
            config.dimensions,
        )),
        "local" => {
            let dims = if config.dimensions > 0 {
                config.dimensions
            } else {
                256
            };
            Box::new(LocalEmbedder::new(dims))
        }
        other => {
            tracing::warn!("Unknown embedding provider '{}', using local", other);
            let dims = if config.dimensions > 0 {
                config.dimensions
            } else {
                256
            };
            Box::new(LocalEmbedder::new(dims))
        }
    }
}
