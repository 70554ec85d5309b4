pub mod analysis;
pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod runner;

// Re-export key items for convenience
pub use analysis::{
    RedundancyResult, TransferabilityResult, analyze_redundancy, analyze_transferability,
};
pub use config::{AuditConfig, DanglingPolicy, InterpretationThresholds};
pub use error::AuditError;
pub use report::AnalysisReport;
pub use runner::{run, run_analysis};
pub use self::core::{AnalysisEvent, Concept, ConceptStore, RetrievalLog};
