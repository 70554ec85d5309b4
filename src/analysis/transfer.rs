//! Transferability analysis
//!
//! Classifies every retrieval as same-puzzle (the concept came from the problem
//! that retrieved it), cross-puzzle (it came from another problem) or
//! unresolved (origin unknown), then aggregates rates and reuse rankings.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::DanglingPolicy;
use crate::core::{AnalysisEvent, ConceptStore, RetrievalLog, origin_problem};

/// Number of most transferred concepts kept by default
pub const DEFAULT_TOP_TRANSFERRED: usize = 20;

/// Concept id and the number of distinct non-origin problems that retrieved it.
/// Serializes as `[id, count]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCount(pub String, pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemBreakdown {
    pub total_retrievals: usize,
    pub cross_puzzle: usize,
    pub same_puzzle: usize,
    pub transfer_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangling: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferabilityResult {
    pub total_retrievals: usize,
    pub cross_puzzle_retrievals: usize,
    pub same_puzzle_retrievals: usize,
    pub transfer_rate: f64,
    pub self_retrieval_rate: f64,
    pub per_puzzle_breakdown: BTreeMap<String, ProblemBreakdown>,
    pub most_transferred_concepts: Vec<TransferCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangling_retrievals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dangling_concepts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub top_transferred: usize,
    pub dangling: DanglingPolicy,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            top_transferred: DEFAULT_TOP_TRANSFERRED,
            dangling: DanglingPolicy::Ignore,
        }
    }
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Origin of a retrieved id. Ids missing from the store are unresolved.
fn resolve_origin<'a>(concepts: &ConceptStore, concept_id: &'a str) -> Option<&'a str> {
    if concepts.contains_key(concept_id) {
        origin_problem(concept_id)
    } else {
        None
    }
}

/// Aggregates same- and cross-puzzle retrieval statistics.
pub fn analyze_transferability_with(
    concepts: &ConceptStore,
    retrievals: &RetrievalLog,
    options: TransferOptions,
    progress: &dyn Fn(AnalysisEvent),
) -> TransferabilityResult {
    let flag_dangling = options.dangling == DanglingPolicy::Flag;

    let mut total = 0;
    let mut cross = 0;
    let mut same = 0;
    let mut dangling_total = 0;
    let mut dangling_ids: BTreeSet<&str> = BTreeSet::new();
    let mut breakdown = BTreeMap::new();
    let mut reuse: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (problem, retrieved) in retrievals {
        let mut problem_cross = 0;
        let mut problem_same = 0;
        let mut problem_dangling = 0;

        for concept_id in retrieved {
            if !concepts.contains_key(concept_id) {
                problem_dangling += 1;
                if flag_dangling {
                    dangling_ids.insert(concept_id);
                }
            }

            match resolve_origin(concepts, concept_id) {
                Some(origin) if origin == problem.as_str() => problem_same += 1,
                Some(_) => {
                    problem_cross += 1;
                    reuse
                        .entry(concept_id.as_str())
                        .or_default()
                        .insert(problem.as_str());
                }
                None => {}
            }
        }

        total += retrieved.len();
        cross += problem_cross;
        same += problem_same;
        dangling_total += problem_dangling;

        breakdown.insert(
            problem.clone(),
            ProblemBreakdown {
                total_retrievals: retrieved.len(),
                cross_puzzle: problem_cross,
                same_puzzle: problem_same,
                transfer_rate: rate(problem_cross, retrieved.len()),
                dangling: flag_dangling.then_some(problem_dangling),
            },
        );
    }

    let mut most_transferred: Vec<TransferCount> = reuse
        .into_iter()
        .map(|(id, problems)| TransferCount(id.to_string(), problems.len()))
        .collect();
    most_transferred.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    most_transferred.truncate(options.top_transferred);

    let result = TransferabilityResult {
        total_retrievals: total,
        cross_puzzle_retrievals: cross,
        same_puzzle_retrievals: same,
        transfer_rate: rate(cross, total),
        self_retrieval_rate: rate(same, total),
        per_puzzle_breakdown: breakdown,
        most_transferred_concepts: most_transferred,
        dangling_retrievals: flag_dangling.then_some(dangling_total),
        dangling_concepts: flag_dangling
            .then(|| dangling_ids.into_iter().map(String::from).collect()),
    };

    info!(
        total = result.total_retrievals,
        cross = result.cross_puzzle_retrievals,
        same = result.same_puzzle_retrievals,
        transfer_rate = result.transfer_rate,
        "transferability analysis complete"
    );
    progress(AnalysisEvent::TransferabilityDone {
        total: result.total_retrievals,
    });
    result
}

/// Transferability with default options and no progress reporting.
pub fn analyze_transferability(
    concepts: &ConceptStore,
    retrievals: &RetrievalLog,
) -> TransferabilityResult {
    analyze_transferability_with(concepts, retrievals, TransferOptions::default(), &|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Concept;

    fn store(ids: &[&str]) -> ConceptStore {
        ids.iter()
            .map(|id| (id.to_string(), Concept::new("c", "k")))
            .collect()
    }

    fn log(entries: &[(&str, &[&str])]) -> RetrievalLog {
        entries
            .iter()
            .map(|(p, ids)| (p.to_string(), ids.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_mixed_same_and_cross() {
        let concepts = store(&["p1_0", "p2_0"]);
        let retrievals = log(&[("p1", &["p1_0", "p2_0"]), ("p2", &["p2_0"])]);

        let result = analyze_transferability(&concepts, &retrievals);

        assert_eq!(result.total_retrievals, 3);
        assert_eq!(result.same_puzzle_retrievals, 2);
        assert_eq!(result.cross_puzzle_retrievals, 1);
        assert!((result.transfer_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((result.self_retrieval_rate - 2.0 / 3.0).abs() < 1e-12);

        let p1 = &result.per_puzzle_breakdown["p1"];
        assert_eq!((p1.total_retrievals, p1.cross_puzzle, p1.same_puzzle), (2, 1, 1));
        assert_eq!(p1.transfer_rate, 0.5);
        assert_eq!(p1.dangling, None);

        assert_eq!(
            result.most_transferred_concepts,
            vec![TransferCount("p2_0".into(), 1)]
        );
    }

    #[test]
    fn test_empty_log_has_zero_rates() {
        let result = analyze_transferability(&store(&["p1_0"]), &RetrievalLog::new());
        assert_eq!(result.total_retrievals, 0);
        assert_eq!(result.transfer_rate, 0.0);
        assert_eq!(result.self_retrieval_rate, 0.0);
        assert!(result.per_puzzle_breakdown.is_empty());
    }

    #[test]
    fn test_problem_with_no_retrievals() {
        let result = analyze_transferability(&store(&["p1_0"]), &log(&[("p9", &[])]));
        assert_eq!(result.per_puzzle_breakdown["p9"].transfer_rate, 0.0);
    }

    #[test]
    fn test_unresolved_ids_count_only_toward_total() {
        // "loose" has no separator; "p7_3" is not in the store.
        let concepts = store(&["p1_0", "loose"]);
        let retrievals = log(&[("p1", &["loose", "p7_3", "p1_0"])]);

        let result = analyze_transferability(&concepts, &retrievals);

        assert_eq!(result.total_retrievals, 3);
        assert_eq!(result.same_puzzle_retrievals, 1);
        assert_eq!(result.cross_puzzle_retrievals, 0);
        assert!(result.transfer_rate + result.self_retrieval_rate < 1.0);
        assert!(result.dangling_retrievals.is_none());
    }

    #[test]
    fn test_flagged_dangling_retrievals() {
        let concepts = store(&["p1_0"]);
        let retrievals = log(&[("p1", &["p9_0", "p1_0", "p9_0"]), ("p2", &["ghost"])]);
        let options = TransferOptions {
            dangling: DanglingPolicy::Flag,
            ..TransferOptions::default()
        };

        let result = analyze_transferability_with(&concepts, &retrievals, options, &|_| {});

        assert_eq!(result.dangling_retrievals, Some(3));
        assert_eq!(
            result.dangling_concepts,
            Some(vec!["ghost".to_string(), "p9_0".to_string()])
        );
        assert_eq!(result.per_puzzle_breakdown["p1"].dangling, Some(2));
        assert_eq!(result.cross_puzzle_retrievals, 0);
    }

    #[test]
    fn test_ranking_counts_distinct_problems_with_id_tiebreak() {
        let concepts = store(&["a_0", "b_0", "c_0"]);
        let retrievals = log(&[
            ("x", &["c_0", "c_0", "b_0"]),
            ("y", &["c_0", "b_0", "a_0"]),
            ("z", &["c_0"]),
            ("a", &["a_0"]),
        ]);

        let result = analyze_transferability(&concepts, &retrievals);

        assert_eq!(
            result.most_transferred_concepts,
            vec![
                TransferCount("c_0".into(), 3),
                TransferCount("b_0".into(), 2),
                TransferCount("a_0".into(), 1),
            ]
        );
    }

    #[test]
    fn test_ranking_truncates() {
        let ids: Vec<String> = (0..30).map(|i| format!("o{:02}_0", i)).collect();
        let concepts: ConceptStore = ids
            .iter()
            .map(|id| (id.clone(), Concept::new("c", "k")))
            .collect();
        let mut retrievals = RetrievalLog::new();
        retrievals.insert("elsewhere".to_string(), ids.clone());

        let result = analyze_transferability(&concepts, &retrievals);

        assert_eq!(result.most_transferred_concepts.len(), DEFAULT_TOP_TRANSFERRED);
        assert_eq!(result.most_transferred_concepts[0].0, "o00_0");
    }
}
