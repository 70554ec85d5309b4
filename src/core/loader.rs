//! Input loaders for concept stores and retrieval logs
//!
//! Both artifacts are JSON objects. Loading never mutates anything on disk.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::core::types::{Concept, ConceptStore, RetrievalLog};
use crate::error::{AuditError, Result};

/// Key under which a wrapped concept store keeps its mapping
const CONCEPTS_KEY: &str = "concepts";

/// Reads and parses a JSON artifact.
///
/// Only a missing path is `NotFound`. Anything else that stops the bytes from
/// becoming JSON (a directory, unreadable file, invalid UTF-8) is `Malformed`
/// and names the path.
fn read_json(path: &Path) -> Result<Value> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AuditError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AuditError::malformed(path, format!("cannot read input: {}", e)),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| AuditError::malformed(path, e.to_string()))
}

/// Loads a concept store.
///
/// The top level is either the id -> concept mapping itself or an object that
/// holds it under `"concepts"`.
pub fn load_concepts(path: &Path) -> Result<ConceptStore> {
    let value = read_json(path)?;
    let Value::Object(mut top) = value else {
        return Err(AuditError::malformed(path, "concept store is not an object"));
    };

    let mapping = match top.remove(CONCEPTS_KEY) {
        Some(Value::Object(inner)) => inner,
        Some(_) => {
            return Err(AuditError::malformed(
                path,
                "\"concepts\" is not a mapping of concept records",
            ));
        }
        None => top,
    };

    let store = parse_concepts(path, mapping)?;
    debug!(path = %path.display(), count = store.len(), "loaded concept store");
    Ok(store)
}

fn parse_concepts(path: &Path, mapping: Map<String, Value>) -> Result<ConceptStore> {
    let mut store = ConceptStore::new();
    for (id, record) in mapping {
        if !record.is_object() {
            return Err(AuditError::malformed(
                path,
                format!("concept {:?} is not a record", id),
            ));
        }
        let concept: Concept = serde_json::from_value(record)
            .map_err(|e| AuditError::malformed(path, format!("concept {:?}: {}", id, e)))?;
        store.insert(id, concept);
    }
    Ok(store)
}

/// Loads a retrieval log: problem id -> ordered list of retrieved concept ids.
pub fn load_retrievals(path: &Path) -> Result<RetrievalLog> {
    let value = read_json(path)?;
    let log: RetrievalLog = serde_json::from_value(value).map_err(|e| {
        AuditError::malformed(
            path,
            format!("expected a mapping of problem id to concept id list: {}", e),
        )
    })?;
    debug!(
        path = %path.display(),
        problems = log.len(),
        retrievals = log.values().map(Vec::len).sum::<usize>(),
        "loaded retrieval log"
    );
    Ok(log)
}
