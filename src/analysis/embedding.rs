//! Text embedding providers
//!
//! The redundancy analyzer only sees the [`TextEmbedder`] trait. Which model
//! backs it is decided once, from the configured model identifier.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::{AuditError, Result};

/// Default dimensionality of the hashing embedder
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;

/// Turns a batch of strings into one fixed-length vector per string.
pub trait TextEmbedder: Send + Sync {
    /// Embed all texts in one blocking call. No partial results.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Model identifier recorded in reports
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }
}

/// Term-hashing embedder.
///
/// Hashes lowercase terms into fixed buckets with FNV-1a, weights them by term
/// frequency and L2-normalizes. Deterministic and dependency-free.
pub struct HashingEmbedder {
    dimensions: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            name: format!("hashing-{}", dimensions),
        }
    }

    fn hash_term(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h % dims as u64) as usize
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() >= 2)
            .map(str::to_lowercase)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut tf: BTreeMap<String, f32> = BTreeMap::new();
        let mut total = 0.0f32;
        for token in Self::tokenize(text) {
            *tf.entry(token).or_default() += 1.0;
            total += 1.0;
        }

        let mut vec = vec![0.0f32; self.dimensions];
        if total == 0.0 {
            return vec;
        }

        for (term, count) in &tf {
            // Longer terms carry more signal than short connectives.
            let weight = 1.0 + (term.len() as f32).ln();
            vec[Self::hash_term(term, self.dimensions)] += count / total * weight;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

impl TextEmbedder for HashingEmbedder {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Embedder that is never available.
///
/// Selecting it turns redundancy analysis into its zero-findings fallback.
pub struct NullEmbedder {
    reason: String,
}

impl NullEmbedder {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextEmbedder for NullEmbedder {
    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(AuditError::unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Resolves a model identifier to an embedder.
///
/// `hashing` and `hashing-<dims>` select [`HashingEmbedder`]; `none` selects
/// [`NullEmbedder`]. Unknown identifiers also fall back to [`NullEmbedder`].
pub fn create_embedder(model: &str) -> Box<dyn TextEmbedder> {
    match model {
        "none" => Box::new(NullEmbedder::new("semantic analysis disabled")),
        "hashing" => Box::new(HashingEmbedder::default()),
        other => match other
            .strip_prefix("hashing-")
            .and_then(|d| d.parse::<usize>().ok())
        {
            Some(dims) if dims > 0 => Box::new(HashingEmbedder::new(dims)),
            _ => {
                warn!(model = other, "unknown embedding model, semantic analysis disabled");
                Box::new(NullEmbedder::new(format!(
                    "no embedding provider for model {:?}",
                    other
                )))
            }
        },
    }
}
