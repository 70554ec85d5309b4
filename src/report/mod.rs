//! Report composition and persistence

pub mod interpretation;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{RedundancyResult, TransferabilityResult};
use crate::config::InterpretationThresholds;
use crate::error::Result;

pub use interpretation::{
    Labels, RedundancyLevel, SelfRetrievalLevel, TransferStrength, generate_interpretation,
};

/// Run metadata recorded alongside the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub concepts_file: PathBuf,
    pub retrievals_file: Option<PathBuf>,
    pub similarity_threshold: f64,
    pub model: String,
}

/// Final result of one analysis run. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub redundancy: Option<RedundancyResult>,
    pub transferability: Option<TransferabilityResult>,
    pub labels: Labels,
    pub interpretation: String,
}

impl AnalysisReport {
    /// Combines whichever analyses ran into a report with derived labels and text.
    pub fn compose(
        metadata: ReportMetadata,
        redundancy: Option<RedundancyResult>,
        transferability: Option<TransferabilityResult>,
        thresholds: &InterpretationThresholds,
    ) -> Self {
        let labels = Labels::derive(redundancy.as_ref(), transferability.as_ref(), thresholds);
        let interpretation =
            generate_interpretation(redundancy.as_ref(), transferability.as_ref(), thresholds);
        Self {
            metadata,
            redundancy,
            transferability,
            labels,
            interpretation,
        }
    }

    /// Writes the JSON report, then the interpretation text next to it.
    ///
    /// Returns the path of the interpretation file.
    pub fn save(&self, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(output, json)?;

        let interp_path = interpretation_path(output);
        fs::write(&interp_path, &self.interpretation)?;

        info!(
            report = %output.display(),
            interpretation = %interp_path.display(),
            "report saved"
        );
        Ok(interp_path)
    }
}

/// `<dir>/<stem>_interpretation.txt` for a report at `<dir>/<stem>.<ext>`.
pub fn interpretation_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "memory_report".to_string());
    output.with_file_name(format!("{}_interpretation.txt", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            concepts_file: PathBuf::from("concepts.json"),
            retrievals_file: None,
            similarity_threshold: 0.85,
            model: "hashing-384".to_string(),
        }
    }

    #[test]
    fn test_interpretation_path() {
        assert_eq!(
            interpretation_path(Path::new("out/report.json")),
            PathBuf::from("out/report_interpretation.txt")
        );
        assert_eq!(
            interpretation_path(Path::new("report")),
            PathBuf::from("report_interpretation.txt")
        );
    }

    #[test]
    fn test_compose_without_transferability() {
        let report = AnalysisReport::compose(
            metadata(),
            Some(RedundancyResult::empty(4)),
            None,
            &InterpretationThresholds::default(),
        );
        assert!(report.labels.transfer.is_none());
        assert_eq!(report.labels.redundancy, Some(RedundancyLevel::LargelyUnique));
        assert!(report.interpretation.contains("Analyzed 4 concepts"));
    }

    #[test]
    fn test_save_writes_both_files() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("nested").join("report.json");
        let report = AnalysisReport::compose(
            metadata(),
            Some(RedundancyResult::empty(0)),
            None,
            &InterpretationThresholds::default(),
        );

        let interp = report.save(&output)?;

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
        assert_eq!(json["metadata"]["model"], "hashing-384");
        assert!(json["transferability"].is_null());
        assert!(json["redundancy"]["similarity_matrix"].is_null());
        assert_eq!(fs::read_to_string(interp)?, report.interpretation);
        Ok(())
    }
}
