//! Qualitative interpretation of analysis results

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::analysis::{RedundancyResult, TransferabilityResult};
use crate::config::InterpretationThresholds;

const RULE_WIDTH: usize = 80;

/// How strongly concepts transfer across problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStrength {
    Strong,
    Moderate,
    Weak,
}

impl TransferStrength {
    pub fn classify(transfer_rate: f64, t: &InterpretationThresholds) -> Self {
        if transfer_rate > t.strong_transfer {
            TransferStrength::Strong
        } else if transfer_rate > t.moderate_transfer {
            TransferStrength::Moderate
        } else {
            TransferStrength::Weak
        }
    }
}

impl std::fmt::Display for TransferStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStrength::Strong => write!(f, "strong"),
            TransferStrength::Moderate => write!(f, "moderate"),
            TransferStrength::Weak => write!(f, "weak"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfRetrievalLevel {
    Low,
    High,
}

impl SelfRetrievalLevel {
    pub fn classify(self_retrieval_rate: f64, t: &InterpretationThresholds) -> Self {
        if self_retrieval_rate < t.low_self_retrieval {
            SelfRetrievalLevel::Low
        } else {
            SelfRetrievalLevel::High
        }
    }
}

impl std::fmt::Display for SelfRetrievalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelfRetrievalLevel::Low => write!(f, "low"),
            SelfRetrievalLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundancyLevel {
    CommonPatterns,
    LargelyUnique,
}

impl RedundancyLevel {
    pub fn classify(redundancy_rate: f64, t: &InterpretationThresholds) -> Self {
        if redundancy_rate > t.common_patterns {
            RedundancyLevel::CommonPatterns
        } else {
            RedundancyLevel::LargelyUnique
        }
    }
}

impl std::fmt::Display for RedundancyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedundancyLevel::CommonPatterns => write!(f, "common patterns present"),
            RedundancyLevel::LargelyUnique => write!(f, "concepts largely unique"),
        }
    }
}

/// Labels derived from the rates; each is absent when its analysis did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Labels {
    pub transfer: Option<TransferStrength>,
    pub self_retrieval: Option<SelfRetrievalLevel>,
    pub redundancy: Option<RedundancyLevel>,
}

impl Labels {
    pub fn derive(
        redundancy: Option<&RedundancyResult>,
        transferability: Option<&TransferabilityResult>,
        t: &InterpretationThresholds,
    ) -> Self {
        Self {
            transfer: transferability.map(|r| TransferStrength::classify(r.transfer_rate, t)),
            self_retrieval: transferability
                .map(|r| SelfRetrievalLevel::classify(r.self_retrieval_rate, t)),
            redundancy: redundancy.map(|r| RedundancyLevel::classify(r.redundancy_rate, t)),
        }
    }
}

fn pct(rate: f64) -> f64 {
    rate * 100.0
}

/// Renders the human-readable interpretation.
///
/// Layout: banner, SUMMARY, INTERPRETATION, RECOMMENDATIONS.
pub fn generate_interpretation(
    redundancy: Option<&RedundancyResult>,
    transferability: Option<&TransferabilityResult>,
    t: &InterpretationThresholds,
) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_interpretation(&mut out, redundancy, transferability, t);
    out
}

fn write_interpretation(
    out: &mut String,
    redundancy: Option<&RedundancyResult>,
    transferability: Option<&TransferabilityResult>,
    t: &InterpretationThresholds,
) -> std::fmt::Result {
    let labels = Labels::derive(redundancy, transferability, t);
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    writeln!(out, "{}", heavy)?;
    writeln!(out, "MEMORY ANALYSIS INTERPRETATION")?;
    writeln!(out, "{}", heavy)?;
    writeln!(out)?;

    writeln!(out, "SUMMARY")?;
    writeln!(out, "{}", light)?;
    if let (Some(r), Some(strength), Some(level)) =
        (transferability, labels.transfer, labels.self_retrieval)
    {
        writeln!(
            out,
            "Transfer Rate: {:.1}% ({})",
            pct(r.transfer_rate),
            strength.to_string().to_uppercase()
        )?;
        writeln!(
            out,
            "Self-Retrieval: {:.1}% ({})",
            pct(r.self_retrieval_rate),
            level.to_string().to_uppercase()
        )?;
    }
    if let (Some(r), Some(level)) = (redundancy, labels.redundancy) {
        writeln!(out, "Redundancy: {:.1}% ({})", pct(r.redundancy_rate), level)?;
        writeln!(out, "Concept Clusters: {}", r.concept_clusters.len())?;
    }
    writeln!(out)?;

    writeln!(out, "INTERPRETATION")?;
    writeln!(out, "{}", light)?;
    writeln!(out)?;

    if let (Some(r), Some(strength)) = (transferability, labels.transfer) {
        writeln!(out, "**Transferability Analysis:**")?;
        writeln!(out)?;
        writeln!(
            out,
            "Analyzed {} concept retrievals across problems.",
            r.total_retrievals
        )?;
        writeln!(
            out,
            "Cross-problem retrieval rate is {:.1}%, self-retrieval rate is {:.1}%.",
            pct(r.transfer_rate),
            pct(r.self_retrieval_rate)
        )?;
        writeln!(out)?;
        match strength {
            TransferStrength::Strong => {
                writeln!(out, "STRONG evidence of genuine abstraction and conceptual reuse")?;
                writeln!(out, "rather than solution memorization. Learned concepts transfer")?;
                writeln!(out, "effectively across different problems.")?;
            }
            TransferStrength::Moderate => {
                writeln!(out, "MODERATE evidence of concept transfer. Concepts are reused across")?;
                writeln!(out, "problems, with room for improvement in abstraction.")?;
            }
            TransferStrength::Weak => {
                writeln!(out, "LIMITED cross-problem transfer. The memory may hold problem-specific")?;
                writeln!(out, "rather than generalizable concepts.")?;
            }
        }
        if let Some(dangling) = r.dangling_retrievals
            && dangling > 0
        {
            writeln!(out)?;
            writeln!(
                out,
                "{} retrievals referenced concepts missing from the store.",
                dangling
            )?;
        }
        writeln!(out)?;
    }

    if let (Some(r), Some(level)) = (redundancy, labels.redundancy) {
        writeln!(out, "**Redundancy Analysis:**")?;
        writeln!(out)?;
        writeln!(
            out,
            "Analyzed {} concepts, finding {} highly similar pairs ({:.1}% redundancy rate).",
            r.total_concepts,
            r.redundant_pairs,
            pct(r.redundancy_rate)
        )?;
        writeln!(out)?;
        match level {
            RedundancyLevel::CommonPatterns => {
                writeln!(out, "Common reusable patterns emerged independently across different")?;
                writeln!(out, "problems, consistent with genuine abstraction.")?;
            }
            RedundancyLevel::LargelyUnique => {
                writeln!(out, "Concepts are largely unique, which points to either highly diverse")?;
                writeln!(out, "abstraction or problem-specific learning.")?;
            }
        }
        writeln!(out)?;

        if !r.concept_clusters.is_empty() {
            let shown = r.concept_clusters.len().min(3);
            writeln!(out, "Top {} Concept Clusters:", shown)?;
            for (i, cluster) in r.concept_clusters.iter().take(shown).enumerate() {
                let head: Vec<&str> = cluster.iter().take(3).map(String::as_str).collect();
                write!(out, "  {}. {} concepts: {}", i + 1, cluster.len(), head.join(", "))?;
                if cluster.len() > 3 {
                    write!(out, " + {} more", cluster.len() - 3)?;
                }
                writeln!(out)?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "RECOMMENDATIONS")?;
    writeln!(out, "{}", light)?;
    if let Some(r) = transferability {
        if r.transfer_rate > t.recommend_generalization {
            writeln!(out, "-> Memory shows strong generalization.")?;
        } else if r.transfer_rate > t.moderate_transfer {
            writeln!(out, "-> Highlight specific successful transfer examples.")?;
        }
        if r.self_retrieval_rate > t.recommend_investigate_self_retrieval {
            writeln!(out, "-> High self-retrieval rate; investigate why.")?;
        }
    }
    writeln!(out)?;
    write!(out, "{}", heavy)?;
    Ok(())
}
