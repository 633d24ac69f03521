//! Error types for the diary library code.
//!
//! `thiserror` is used for the typed errors raised by the models and the
//! store; `anyhow` takes over in main.rs where they are reported.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing user-supplied values into model types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid month `{0}` (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("unknown mood `{0}`")]
    UnknownMood(String),

    #[error("invalid time `{0}` (expected HH:MM)")]
    InvalidTime(String),

    #[error("unknown medication kind `{0}`")]
    UnknownMedicationKind(String),
}

/// A single problem found while validating a stored or imported record.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("record {index}{}: {message}", id_suffix(.id))]
pub struct ValidationError {
    /// Position of the record in the source array.
    pub index: usize,
    /// Record id, when one could be read.
    pub id: Option<String>,
    pub message: String,
}

/// Errors that can occur while reading or writing the data directory.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{} is not valid JSON: {source}", .path.display())]
    MalformedFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} invalid record(s) in {}: {}", .issues.len(), .path.display(), summarize(.issues))]
    InvalidRecords {
        path: PathBuf,
        issues: Vec<ValidationError>,
    },

    #[error("invalid episode: {0}")]
    Invalid(ValidationError),

    #[error("episode not found: {0}")]
    NotFound(String),

    #[error("an episode with id {0} already exists")]
    DuplicateId(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_deref()
        .map(|id| format!(" (id {id})"))
        .unwrap_or_default()
}

fn summarize(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
