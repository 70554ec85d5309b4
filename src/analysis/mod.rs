//! Memory analyses
//!
//! Redundancy (near-duplicate concepts) and transferability (cross-problem
//! reuse). The two are independent and share only the loaded concept store.

pub mod embedding;
pub mod graph;
pub mod redundancy;
pub mod similarity;
pub mod transfer;

pub use embedding::{HashingEmbedder, NullEmbedder, TextEmbedder, create_embedder};
pub use graph::SimilarityGraph;
pub use redundancy::{
    RedundancyAnalyzer, RedundancyOptions, RedundancyResult, SimilarPair, analyze_redundancy,
};
pub use similarity::{CosineScorer, SimilarityMatrix, SimilarityScorer, cosine_similarity};
pub use transfer::{
    ProblemBreakdown, TransferCount, TransferOptions, TransferabilityResult,
    analyze_transferability, analyze_transferability_with,
};
