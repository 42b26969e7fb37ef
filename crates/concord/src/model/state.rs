//! Per-session state handed to a consensus build.

use chrono::{DateTime, Utc};

use super::document::{AnnotatorId, Mode, SourceDocument, Window};
use super::layer::AnnotationLayer;

/// Everything a build needs to know about the caller's session.
///
/// The builder only writes back [`BuildState::document_timestamp`] after it
/// persisted a working graph, so the session can detect concurrent writes.
#[derive(Debug, Clone)]
pub struct BuildState {
    pub document: SourceDocument,
    pub mode: Mode,
    pub window: Window,
    pub layers: Vec<AnnotationLayer>,
    /// The authenticated user (the curator or the corrector).
    pub user: AnnotatorId,
    /// Timestamp of the last working-graph write seen by this session.
    pub document_timestamp: Option<DateTime<Utc>>,
}

impl BuildState {
    pub fn new(
        document: SourceDocument,
        mode: Mode,
        window: Window,
        user: impl Into<AnnotatorId>,
    ) -> Self {
        Self {
            document,
            mode,
            window,
            layers: Vec::new(),
            user: user.into(),
            document_timestamp: None,
        }
    }

    /// Set the annotation layers to compare.
    pub fn with_layers(mut self, layers: Vec<AnnotationLayer>) -> Self {
        self.layers = layers;
        self
    }

    /// Record the timestamp of a write. A missing timestamp leaves the
    /// previous one in place.
    pub fn update_document_timestamp_after_write(&mut self, timestamp: Option<DateTime<Utc>>) {
        if let Some(ts) = timestamp {
            self.document_timestamp = Some(ts);
        }
    }
}
