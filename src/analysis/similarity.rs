//! Pairwise similarity over embeddings

use rayon::prelude::*;

/// Scores how alike two embedding vectors are.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &[f32], b: &[f32]) -> f64;
}

/// Cosine similarity, clamped to [-1, 1].
///
/// Zero-magnitude or mismatched vectors score 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineScorer;

impl SimilarityScorer for CosineScorer {
    fn score(&self, a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Dense symmetric similarity matrix with a unit diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Scores every pair. Rows are computed in parallel; each cell depends only
    /// on its own pair, so the result matches a sequential scan exactly.
    pub fn compute(embeddings: &[Vec<f32>], scorer: &dyn SimilarityScorer) -> Self {
        let size = embeddings.len();
        let upper: Vec<Vec<f64>> = (0..size)
            .into_par_iter()
            .map(|i| {
                (i + 1..size)
                    .map(|j| scorer.score(&embeddings[i], &embeddings[j]))
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; size * size];
        for (i, row) in upper.iter().enumerate() {
            values[i * size + i] = 1.0;
            for (offset, &sim) in row.iter().enumerate() {
                let j = i + 1 + offset;
                values[i * size + j] = sim;
                values[j * size + i] = sim;
            }
        }

        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    /// Row-major nested form for serialization.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.values
            .chunks(self.size)
            .map(<[f64]>::to_vec)
            .collect()
    }
}
