//! Core types shared across memaudit modules

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Separator between the origin problem id and the local index in a concept id
pub const ORIGIN_SEPARATOR: char = '_';

/// Concept id -> concept record. Ordered so every scan over it is deterministic.
pub type ConceptStore = BTreeMap<String, Concept>;

/// Problem id -> concept ids retrieved while attempting that problem, in retrieval order.
pub type RetrievalLog = BTreeMap<String, Vec<String>>;

/// A stored, reusable problem-solving lesson
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default = "unknown_field")]
    pub name: String,
    /// Free-form category tag
    #[serde(default = "unknown_field")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ConceptParameter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptParameter {
    pub name: String,
}

fn unknown_field() -> String {
    "unknown".to_string()
}

impl Concept {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            description: None,
            parameters: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = Some(
            names
                .into_iter()
                .map(|n| ConceptParameter { name: n.into() })
                .collect(),
        );
        self
    }

    /// Canonical text used for semantic comparison.
    ///
    /// Fields appear in a fixed order: name, kind, description, parameter names.
    /// Empty descriptions and empty parameter lists are omitted.
    pub fn describe(&self) -> String {
        let mut parts = vec![
            format!("Name: {}", self.name),
            format!("Kind: {}", self.kind),
        ];
        if let Some(ref description) = self.description
            && !description.is_empty()
        {
            parts.push(format!("Description: {}", description));
        }
        if let Some(ref params) = self.parameters
            && !params.is_empty()
        {
            let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
            parts.push(format!("Parameters: {}", names.join(", ")));
        }
        parts.join(" | ")
    }
}

/// Recovers the origin problem from a concept id of the form `<origin>_<index>`.
///
/// Splits on the last separator. Returns `None` when there is no separator.
pub fn origin_problem(concept_id: &str) -> Option<&str> {
    concept_id
        .rsplit_once(ORIGIN_SEPARATOR)
        .map(|(origin, _)| origin)
}

/// Progress events emitted during an analysis run
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisEvent {
    /// Concept store parsed
    ConceptsLoaded(usize),
    /// Retrieval log parsed
    RetrievalsLoaded { problems: usize, retrievals: usize },
    /// Embedding of this many descriptions started
    EmbeddingStarted(usize),
    /// Embedding finished
    EmbeddingFinished,
    /// Semantic analysis could not run; redundancy degrades to zero findings
    SemanticAnalysisSkipped(String),
    /// Redundancy analysis finished
    RedundancyDone { pairs: usize, clusters: usize },
    /// Transferability analysis finished
    TransferabilityDone { total: usize },
    /// No retrieval log supplied
    TransferabilitySkipped,
    /// Report persisted
    ReportWritten(PathBuf),
    /// Run completed with this message
    Complete(String),
}
