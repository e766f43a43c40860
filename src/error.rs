//! Errors for the crate's fallible edges: loading a corpus and assembling
//! user facts. The planning and evaluation operations themselves never fail.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid corpus JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate service id '{0}'")]
    DuplicateService(String),
    #[error("duplicate life event id '{0}'")]
    DuplicateLifeEvent(String),
}

#[derive(Debug, Error)]
pub enum FactError {
    #[error("malformed fact '{0}' (expected path=value)")]
    MalformedAssignment(String),
    #[error("fact path '{0}' conflicts with an existing non-object value")]
    PathConflict(String),
    #[error("failed to read facts file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("facts must be a JSON object")]
    NotAnObject,
    #[error("invalid facts: {0}")]
    Invalid(#[from] serde_json::Error),
}
