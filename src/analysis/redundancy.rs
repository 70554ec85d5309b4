//! Redundancy analysis
//!
//! Embeds each concept's canonical description, scores every pair, and groups
//! near-duplicates into clusters via connected components over the pairs that
//! clear the similarity threshold.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::embedding::TextEmbedder;
use crate::analysis::graph::SimilarityGraph;
use crate::analysis::similarity::{CosineScorer, SimilarityMatrix, SimilarityScorer};
use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::core::{AnalysisEvent, ConceptStore};
use crate::error::{AuditError, Result};

/// Number of most similar pairs kept by default
pub const DEFAULT_TOP_PAIRS: usize = 10;

/// Two concept ids (identifier order) and their similarity.
/// Serializes as `[id_a, id_b, score]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair(pub String, pub String, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedundancyResult {
    pub total_concepts: usize,
    pub redundant_pairs: usize,
    pub redundancy_rate: f64,
    pub concept_clusters: Vec<Vec<String>>,
    /// Only kept when explicitly requested; O(n^2)
    pub similarity_matrix: Option<Vec<Vec<f64>>>,
    pub top_similar_pairs: Vec<SimilarPair>,
}

impl RedundancyResult {
    /// Structurally valid result with no findings, used when embeddings are unavailable.
    pub fn empty(total_concepts: usize) -> Self {
        Self {
            total_concepts,
            redundant_pairs: 0,
            redundancy_rate: 0.0,
            concept_clusters: Vec::new(),
            similarity_matrix: None,
            top_similar_pairs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedundancyOptions {
    pub similarity_threshold: f64,
    pub top_pairs: usize,
    pub keep_matrix: bool,
}

impl Default for RedundancyOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            top_pairs: DEFAULT_TOP_PAIRS,
            keep_matrix: false,
        }
    }
}

/// Runs redundancy analysis against an injected embedder and scorer.
pub struct RedundancyAnalyzer<'a> {
    embedder: &'a dyn TextEmbedder,
    scorer: &'a dyn SimilarityScorer,
    options: RedundancyOptions,
}

impl<'a> RedundancyAnalyzer<'a> {
    pub fn new(embedder: &'a dyn TextEmbedder, options: RedundancyOptions) -> Self {
        Self {
            embedder,
            scorer: &CosineScorer,
            options,
        }
    }

    pub fn with_scorer(mut self, scorer: &'a dyn SimilarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Never fails: an unavailable or failing embedder yields [`RedundancyResult::empty`].
    pub fn analyze(
        &self,
        concepts: &ConceptStore,
        progress: &dyn Fn(AnalysisEvent),
    ) -> RedundancyResult {
        let ids: Vec<&str> = concepts.keys().map(String::as_str).collect();

        let embeddings = match self.embed(concepts, progress) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping redundancy analysis");
                progress(AnalysisEvent::SemanticAnalysisSkipped(e.to_string()));
                return RedundancyResult::empty(ids.len());
            }
        };

        let matrix = SimilarityMatrix::compute(&embeddings, self.scorer);
        let result = self.summarize(&ids, &matrix);

        info!(
            concepts = result.total_concepts,
            pairs = result.redundant_pairs,
            rate = result.redundancy_rate,
            clusters = result.concept_clusters.len(),
            "redundancy analysis complete"
        );
        progress(AnalysisEvent::RedundancyDone {
            pairs: result.redundant_pairs,
            clusters: result.concept_clusters.len(),
        });
        result
    }

    fn embed(
        &self,
        concepts: &ConceptStore,
        progress: &dyn Fn(AnalysisEvent),
    ) -> Result<Vec<Vec<f32>>> {
        if !self.embedder.is_available() {
            return Err(AuditError::unavailable(format!(
                "embedding provider {:?} is not available",
                self.embedder.name()
            )));
        }

        let descriptions: Vec<String> = concepts.values().map(|c| c.describe()).collect();
        progress(AnalysisEvent::EmbeddingStarted(descriptions.len()));
        let embeddings = self.embedder.embed_batch(&descriptions)?;
        progress(AnalysisEvent::EmbeddingFinished);

        if embeddings.len() != descriptions.len() {
            return Err(AuditError::unavailable(format!(
                "embedding provider returned {} vectors for {} descriptions",
                embeddings.len(),
                descriptions.len()
            )));
        }
        Ok(embeddings)
    }

    fn summarize(&self, ids: &[&str], matrix: &SimilarityMatrix) -> RedundancyResult {
        let n = ids.len();
        let threshold = self.options.similarity_threshold;

        // Ids come from an ordered map, so i < j visits every unordered pair
        // exactly once and already in identifier order.
        let mut pairs = Vec::new();
        let mut graph = SimilarityGraph::new();
        for id in ids {
            graph.add_node(id);
        }
        for i in 0..n {
            for j in i + 1..n {
                let sim = matrix.get(i, j);
                if sim >= threshold {
                    graph.add_edge(ids[i], ids[j]);
                    pairs.push(SimilarPair(ids[i].to_string(), ids[j].to_string(), sim));
                }
            }
        }

        let redundancy_rate = if n > 1 {
            pairs.len() as f64 / (n * (n - 1) / 2) as f64
        } else {
            0.0
        };

        let redundant_pairs = pairs.len();
        debug!(nodes = n, edges = graph.edge_count(), "similarity graph built");
        let concept_clusters = graph.clusters();

        // Stable sort: equal scores keep scan order.
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
        pairs.truncate(self.options.top_pairs);

        RedundancyResult {
            total_concepts: n,
            redundant_pairs,
            redundancy_rate,
            concept_clusters,
            similarity_matrix: self.options.keep_matrix.then(|| matrix.to_rows()),
            top_similar_pairs: pairs,
        }
    }
}

/// Convenience wrapper with default options apart from the threshold.
pub fn analyze_redundancy(
    concepts: &ConceptStore,
    similarity_threshold: f64,
    embedder: &dyn TextEmbedder,
) -> RedundancyResult {
    let options = RedundancyOptions {
        similarity_threshold,
        ..RedundancyOptions::default()
    };
    RedundancyAnalyzer::new(embedder, options).analyze(concepts, &|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::embedding::{HashingEmbedder, NullEmbedder};
    use crate::core::Concept;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Embeds by looking up the concept name in a fixed table.
    struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

    impl TextEmbedder for TableEmbedder {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let name = t
                        .strip_prefix("Name: ")
                        .and_then(|rest| rest.split(" | ").next())
                        .unwrap_or("");
                    self.0.get(name).cloned().unwrap_or_else(|| vec![0.0, 0.0, 1.0])
                })
                .collect())
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn store(entries: &[(&str, &str)]) -> ConceptStore {
        entries
            .iter()
            .map(|(id, name)| (id.to_string(), Concept::new(*name, "routine")))
            .collect()
    }

    fn table(entries: &[(&'static str, [f32; 3])]) -> TableEmbedder {
        TableEmbedder(entries.iter().map(|(k, v)| (*k, v.to_vec())).collect())
    }

    #[test]
    fn test_two_similar_concepts_form_one_cluster() {
        // cos([1, 0.484, 0], [1, 0, 0]) ~= 0.9
        let concepts = store(&[("p1_0", "a"), ("p2_0", "b")]);
        let embedder = table(&[("a", [1.0, 0.0, 0.0]), ("b", [1.0, 0.4843, 0.0])]);

        let result = analyze_redundancy(&concepts, 0.85, &embedder);

        assert_eq!(result.total_concepts, 2);
        assert_eq!(result.redundant_pairs, 1);
        assert_eq!(result.redundancy_rate, 1.0);
        assert_eq!(result.concept_clusters, vec![vec!["p1_0", "p2_0"]]);
        assert_eq!(result.top_similar_pairs.len(), 1);
        assert!((result.top_similar_pairs[0].2 - 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_single_concept_has_zero_rate() {
        let concepts = store(&[("p1_0", "a")]);
        let result = analyze_redundancy(&concepts, 0.85, &HashingEmbedder::default());
        assert_eq!(result.total_concepts, 1);
        assert_eq!(result.redundancy_rate, 0.0);
        assert!(result.concept_clusters.is_empty());
    }

    #[test]
    fn test_empty_store() {
        let result = analyze_redundancy(&ConceptStore::new(), 0.85, &HashingEmbedder::default());
        assert_eq!(result, RedundancyResult::empty(0));
    }

    #[test]
    fn test_unavailable_embedder_degrades() {
        let concepts = store(&[("p1_0", "a"), ("p2_0", "a"), ("p3_0", "a")]);
        let events = RefCell::new(Vec::new());
        let embedder = NullEmbedder::new("offline");
        let analyzer = RedundancyAnalyzer::new(&embedder, RedundancyOptions::default());

        let result = analyzer.analyze(&concepts, &|e| events.borrow_mut().push(e));

        assert_eq!(result, RedundancyResult::empty(3));
        assert!(matches!(
            events.borrow().as_slice(),
            [AnalysisEvent::SemanticAnalysisSkipped(_)]
        ));
    }

    #[test]
    fn test_short_embedding_batch_degrades() {
        struct Truncating;
        impl TextEmbedder for Truncating {
            fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(vec![vec![1.0]])
            }
            fn name(&self) -> &str {
                "truncating"
            }
        }

        let concepts = store(&[("p1_0", "a"), ("p2_0", "b")]);
        let result = analyze_redundancy(&concepts, 0.85, &Truncating);
        assert_eq!(result, RedundancyResult::empty(2));
    }

    #[test]
    fn test_top_pairs_ordered_by_score_then_scan_order() {
        let concepts = store(&[("a_0", "x"), ("b_0", "x"), ("c_0", "y"), ("d_0", "z")]);
        let embedder = table(&[
            ("x", [1.0, 0.0, 0.0]),
            ("y", [1.0, 0.2, 0.0]),
            ("z", [0.0, 1.0, 0.0]),
        ]);
        let options = RedundancyOptions {
            similarity_threshold: 0.5,
            top_pairs: 2,
            keep_matrix: true,
        };

        let result = RedundancyAnalyzer::new(&embedder, options).analyze(&concepts, &|_| {});

        assert_eq!(result.redundant_pairs, 3);
        assert_eq!(result.concept_clusters, vec![vec!["a_0", "b_0", "c_0"]]);
        assert_eq!(result.top_similar_pairs.len(), 2);
        assert_eq!(result.top_similar_pairs[0].0, "a_0");
        assert_eq!(result.top_similar_pairs[0].1, "b_0");
        // a_0/c_0 and b_0/c_0 tie; scan order puts a_0 first.
        assert_eq!(result.top_similar_pairs[1].0, "a_0");
        assert_eq!(result.top_similar_pairs[1].1, "c_0");

        let matrix = result.similarity_matrix.unwrap();
        assert_eq!(matrix.len(), 4);
        assert_eq!(matrix[3][3], 1.0);
    }

    #[test]
    fn test_injected_scorer_drives_pairs_and_clusters() {
        struct Constant(f64);
        impl SimilarityScorer for Constant {
            fn score(&self, _a: &[f32], _b: &[f32]) -> f64 {
                self.0
            }
        }

        // Cosine over these names would find nothing similar.
        let concepts = store(&[("p1_0", "x"), ("p2_0", "y"), ("p3_0", "z")]);
        let embedder = table(&[
            ("x", [1.0, 0.0, 0.0]),
            ("y", [0.0, 1.0, 0.0]),
            ("z", [0.0, 0.0, 1.0]),
        ]);
        let options = RedundancyOptions::default();

        let cosine = RedundancyAnalyzer::new(&embedder, options).analyze(&concepts, &|_| {});
        assert_eq!(cosine.redundant_pairs, 0);

        let scorer = Constant(0.9);
        let result = RedundancyAnalyzer::new(&embedder, options)
            .with_scorer(&scorer)
            .analyze(&concepts, &|_| {});

        assert_eq!(result.redundant_pairs, 3);
        assert_eq!(result.redundancy_rate, 1.0);
        assert_eq!(result.concept_clusters, vec![vec!["p1_0", "p2_0", "p3_0"]]);
        assert!(result.top_similar_pairs.iter().all(|p| p.2 == 0.9));

        let below = RedundancyAnalyzer::new(&embedder, options)
            .with_scorer(&Constant(0.5))
            .analyze(&concepts, &|_| {});
        assert_eq!(below.redundant_pairs, 0);
        assert!(below.concept_clusters.is_empty());
    }

    #[test]
    fn test_matrix_omitted_by_default() {
        let concepts = store(&[("p1_0", "a"), ("p2_0", "b")]);
        let result = analyze_redundancy(&concepts, 0.85, &HashingEmbedder::default());
        assert!(result.similarity_matrix.is_none());
    }

    #[test]
    fn test_pair_serializes_as_triple() {
        let pair = SimilarPair("a".into(), "b".into(), 0.5);
        assert_eq!(serde_json::to_string(&pair).unwrap(), r#"["a","b",0.5]"#);
    }
}
