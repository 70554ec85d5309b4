use crate::analysis::{
    RedundancyAnalyzer, RedundancyOptions, TransferOptions, analyze_transferability_with,
    create_embedder,
};
use crate::config::AuditConfig;
use crate::core::{AnalysisEvent, load_concepts, load_retrievals};
use crate::report::{AnalysisReport, ReportMetadata};
use anyhow::{Context, Result, anyhow};
use crossbeam_channel::Sender;
use tracing::info;

/// Main entry point for memaudit in CLI mode.
///
/// Runs the analysis on a worker thread and consumes progress events on the
/// calling thread, printing them when `verbose` is enabled. Returns the report
/// once it has been persisted.
pub fn run(config: AuditConfig) -> Result<AnalysisReport> {
    let (tx, rx) = crossbeam_channel::unbounded();

    let config_clone = config.clone();
    let worker = std::thread::spawn(move || run_analysis(&config_clone, Some(tx)));

    for event in rx {
        match event {
            AnalysisEvent::ConceptsLoaded(n) => {
                if config.verbose {
                    println!("Loaded {} concepts.", n)
                }
            }
            AnalysisEvent::RetrievalsLoaded {
                problems,
                retrievals,
            } => {
                if config.verbose {
                    println!(
                        "Loaded {} problems with {} total retrievals.",
                        problems, retrievals
                    )
                }
            }
            AnalysisEvent::EmbeddingStarted(n) => {
                if config.verbose {
                    println!("Computing embeddings for {} concepts...", n)
                }
            }
            AnalysisEvent::EmbeddingFinished => {
                if config.verbose {
                    println!("Computing similarity matrix...")
                }
            }
            AnalysisEvent::SemanticAnalysisSkipped(reason) => {
                println!("Skipping redundancy analysis: {}", reason)
            }
            AnalysisEvent::RedundancyDone { pairs, clusters } => {
                if config.verbose {
                    println!(
                        "Found {} redundant pairs in {} concept clusters.",
                        pairs, clusters
                    )
                }
            }
            AnalysisEvent::TransferabilityDone { total } => {
                if config.verbose {
                    println!("Classified {} retrievals.", total)
                }
            }
            AnalysisEvent::TransferabilitySkipped => {
                if config.verbose {
                    println!("Skipping transferability analysis (no retrieval data provided).")
                }
            }
            AnalysisEvent::ReportWritten(p) => {
                if config.verbose {
                    println!("Saved report to {:?}", p)
                }
            }
            AnalysisEvent::Complete(msg) => {
                if config.verbose {
                    println!("{}", msg)
                }
            }
        }
    }

    worker
        .join()
        .map_err(|_| anyhow!("analysis thread panicked"))?
}

/// Loads inputs, runs both analyses, composes and persists the report.
///
/// Nothing is written unless every attempted analysis has finished.
pub fn run_analysis(
    config: &AuditConfig,
    tx: Option<Sender<AnalysisEvent>>,
) -> Result<AnalysisReport> {
    let notify = |e: AnalysisEvent| {
        if let Some(ref tx) = tx {
            let _ = tx.send(e);
        }
    };

    config.validate().context("Invalid configuration")?;

    // 1. Load inputs
    let concepts = load_concepts(&config.concepts)
        .with_context(|| format!("Failed to load concepts from {:?}", config.concepts))?;
    notify(AnalysisEvent::ConceptsLoaded(concepts.len()));

    let retrievals = match config.retrievals {
        Some(ref path) => {
            let log = load_retrievals(path)
                .with_context(|| format!("Failed to load retrievals from {:?}", path))?;
            notify(AnalysisEvent::RetrievalsLoaded {
                problems: log.len(),
                retrievals: log.values().map(Vec::len).sum(),
            });
            Some(log)
        }
        None => None,
    };

    // 2. Redundancy (always attempted; degrades instead of failing)
    let embedder = create_embedder(config.effective_model());
    let options = RedundancyOptions {
        similarity_threshold: config.similarity_threshold,
        top_pairs: config.top_pairs,
        keep_matrix: config.include_similarity_matrix,
    };
    let redundancy = RedundancyAnalyzer::new(embedder.as_ref(), options).analyze(&concepts, &notify);

    // 3. Transferability (only with a retrieval log)
    let transferability = match retrievals {
        Some(ref log) => Some(analyze_transferability_with(
            &concepts,
            log,
            TransferOptions {
                top_transferred: config.top_transferred,
                dangling: config.dangling,
            },
            &notify,
        )),
        None => {
            notify(AnalysisEvent::TransferabilitySkipped);
            None
        }
    };

    // 4. Compose and persist
    let metadata = ReportMetadata {
        concepts_file: config.concepts.clone(),
        retrievals_file: config.retrievals.clone(),
        similarity_threshold: config.similarity_threshold,
        model: config.effective_model().to_string(),
    };
    let report = AnalysisReport::compose(
        metadata,
        Some(redundancy),
        transferability,
        &config.thresholds,
    );

    let interp_path = report
        .save(&config.output)
        .with_context(|| format!("Failed to write report to {:?}", config.output))?;
    notify(AnalysisEvent::ReportWritten(config.output.clone()));
    notify(AnalysisEvent::Complete(format!(
        "Written to {:?} and {:?}",
        config.output, interp_path
    )));
    info!(output = %config.output.display(), "analysis complete");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_concepts_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.json");
        let config = AuditConfig {
            concepts: dir.path().join("absent.json"),
            output: output.clone(),
            ..AuditConfig::default()
        };

        assert!(run_analysis(&config, None).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_events_are_emitted_in_order() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let concepts = dir.path().join("concepts.json");
        fs::write(&concepts, r#"{"concepts": {"p1_0": {"name": "a", "kind": "k"}}}"#)?;

        let config = AuditConfig {
            concepts,
            output: dir.path().join("report.json"),
            ..AuditConfig::default()
        };
        let (tx, rx) = crossbeam_channel::unbounded();
        run_analysis(&config, Some(tx))?;

        let events: Vec<AnalysisEvent> = rx.try_iter().collect();
        assert_eq!(events[0], AnalysisEvent::ConceptsLoaded(1));
        assert!(events.contains(&AnalysisEvent::TransferabilitySkipped));
        assert!(matches!(events.last(), Some(AnalysisEvent::Complete(_))));
        Ok(())
    }
}
