use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuditError, Result};

/// Default cosine similarity above which two concepts count as redundant
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Default embedding model identifier
pub const DEFAULT_MODEL: &str = "hashing-384";

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "memaudit.toml";

/// How retrievals of ids missing from the concept store are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Treat them as unknown origin and say nothing more
    #[default]
    Ignore,
    /// Count and list them separately in the transferability result
    Flag,
}

/// Cut-offs used to turn rates into qualitative labels.
///
/// These are judgment calls, so they live in configuration rather than code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretationThresholds {
    /// Transfer rate strictly above this is "strong"
    pub strong_transfer: f64,
    /// Transfer rate strictly above this (and not strong) is "moderate"
    pub moderate_transfer: f64,
    /// Self-retrieval rate strictly below this is "low"
    pub low_self_retrieval: f64,
    /// Redundancy rate strictly above this means common patterns are present
    pub common_patterns: f64,
    /// Transfer rate above which the memory is recommended as generalizing
    pub recommend_generalization: f64,
    /// Self-retrieval rate above which an investigation is recommended
    pub recommend_investigate_self_retrieval: f64,
}

impl Default for InterpretationThresholds {
    fn default() -> Self {
        Self {
            strong_transfer: 0.7,
            moderate_transfer: 0.4,
            low_self_retrieval: 0.3,
            common_patterns: 0.1,
            recommend_generalization: 0.6,
            recommend_investigate_self_retrieval: 0.4,
        }
    }
}

/// Main configuration for a memory audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Path to the concept store (JSON)
    pub concepts: PathBuf,
    /// Optional retrieval log (JSON); enables transferability analysis
    pub retrievals: Option<PathBuf>,
    /// Path to the JSON report; the interpretation text lands next to it
    pub output: PathBuf,
    /// Cosine similarity at or above which two concepts are redundant
    pub similarity_threshold: f64,
    /// Embedding model identifier (`hashing`, `hashing-<dims>`, `none`)
    pub model: String,
    /// Skip the embedding step entirely
    pub skip_semantic: bool,
    /// Serialize the full O(n^2) similarity matrix into the report
    pub include_similarity_matrix: bool,
    /// Number of most similar pairs kept for inspection
    pub top_pairs: usize,
    /// Number of most transferred concepts kept in the ranking
    pub top_transferred: usize,
    /// Treatment of retrieved ids absent from the concept store
    pub dangling: DanglingPolicy,
    /// Policy cut-offs for the interpretation
    pub thresholds: InterpretationThresholds,
    /// Print progress events to stdout
    pub verbose: bool,
}

impl AuditConfig {
    /// Checks inputs exist and values are in range before any analysis starts.
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AuditError::InvalidConfig {
                reason: format!(
                    "similarity threshold {} is outside [-1, 1]",
                    self.similarity_threshold
                ),
            });
        }
        ensure_present(&self.concepts)?;
        if let Some(ref retrievals) = self.retrievals {
            ensure_present(retrievals)?;
        }
        Ok(())
    }

    /// Attempts to load configuration from `memaudit.toml` in the current directory.
    pub fn load_from_file() -> Option<Self> {
        Self::load_from_path(Path::new(CONFIG_FILE))
    }

    /// Parses a config file. A missing file is silent; an unparsable one is
    /// logged and ignored so defaults apply.
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Model identifier actually used, accounting for `skip_semantic`.
    pub fn effective_model(&self) -> &str {
        if self.skip_semantic { "none" } else { &self.model }
    }
}

/// Only a definite absence is `NotFound`. If existence cannot be checked
/// (permissions), the loader reports the real failure later.
fn ensure_present(path: &Path) -> Result<()> {
    if let Ok(false) = path.try_exists() {
        return Err(AuditError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            concepts: PathBuf::from("concepts.json"),
            retrievals: None,
            output: PathBuf::from("memory_report.json"),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            model: DEFAULT_MODEL.to_string(),
            skip_semantic: false,
            include_similarity_matrix: false,
            top_pairs: 10,
            top_transferred: 20,
            dangling: DanglingPolicy::Ignore,
            thresholds: InterpretationThresholds::default(),
            verbose: false,
        }
    }
}
