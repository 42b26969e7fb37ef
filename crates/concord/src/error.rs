//! Error types for the Concord library.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::SourceDocument;

/// Main error type for Concord operations.
///
/// Every variant that can abort a build names the document and, where one is
/// involved, the annotator or stage so that a failed build can be diagnosed
/// from the message alone.
#[derive(Debug, Error)]
pub enum ConcordError {
    /// A source annotation graph could not be loaded.
    #[error("Failed to read annotations of '{annotator}' for '{document}': {message}")]
    Read {
        document: String,
        annotator: String,
        message: String,
    },

    /// The working graph (curation or correction) does not exist yet.
    #[error("No {target} graph stored for '{document}'")]
    NotFound { document: String, target: String },

    /// Curation was requested but no annotator has finished the document.
    #[error("No finished annotation documents for '{document}'")]
    NoSources { document: String },

    /// Migrating a working graph to the current schema failed.
    #[error("Schema upgrade failed for '{document}': {message}")]
    SchemaUpgrade { document: String, message: String },

    /// Writing a graph to the store failed.
    #[error("Failed to persist '{document}': {message}")]
    Persist { document: String, message: String },

    /// The diff engine failed.
    #[error("Diff failed for '{document}' during {stage}: {message}")]
    DiffEngine {
        document: String,
        stage: String,
        message: String,
    },

    /// The merge engine failed.
    #[error("Merge failed for '{document}' during {stage}: {message}")]
    MergeEngine {
        document: String,
        stage: String,
        message: String,
    },

    /// A source has no sentence at a segment boundary.
    #[error("Annotator '{annotator}' has no sentence at offset {begin} in '{document}'")]
    Segmentation {
        document: String,
        annotator: String,
        begin: usize,
    },

    /// Window with begin after end.
    #[error("Invalid window [{begin}, {end})")]
    InvalidWindow { begin: usize, end: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConcordError {
    /// Whether this error only means the working graph has not been created yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConcordError::NotFound { .. })
    }

    /// Attribute a collaborator error to the diff engine.
    pub(crate) fn into_diff_error(self, document: &SourceDocument, stage: &str) -> Self {
        match self {
            err @ ConcordError::DiffEngine { .. } => err,
            other => ConcordError::DiffEngine {
                document: document.to_string(),
                stage: stage.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Attribute a collaborator error to the merge engine.
    pub(crate) fn into_merge_error(self, document: &SourceDocument, stage: &str) -> Self {
        match self {
            err @ ConcordError::MergeEngine { .. } => err,
            other => ConcordError::MergeEngine {
                document: document.to_string(),
                stage: stage.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Attribute a collaborator error to the schema upgrade.
    pub(crate) fn into_upgrade_error(self, document: &SourceDocument) -> Self {
        match self {
            err @ ConcordError::SchemaUpgrade { .. } => err,
            other => ConcordError::SchemaUpgrade {
                document: document.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for Concord operations.
pub type Result<T> = std::result::Result<T, ConcordError>;
