//! Selecting the annotator graphs a build compares.

use tracing::debug;

use crate::diff::CasMap;
use crate::error::{ConcordError, Result};
use crate::model::{AnnotationDocument, BuildState, Cas, SourceDocument, WorkingTarget};
use crate::service::DocumentService;

/// The annotator graphs of one document, keyed by annotator.
///
/// Also remembers the *base document*: in curation the finished document of
/// the first annotator in name order, whose graph serves as the skeleton of a
/// new curation graph; in correction the user's own document.
#[derive(Debug, Clone)]
pub struct AnnotationSourceSet {
    sources: CasMap,
    base: AnnotationDocument,
}

impl AnnotationSourceSet {
    /// Select the sources for the build described by `state`.
    pub fn build(documents: &dyn DocumentService, state: &BuildState) -> Result<Self> {
        match state.mode.target() {
            WorkingTarget::Curation => Self::for_curation(documents, &state.document),
            WorkingTarget::Correction => {
                Self::for_correction(documents, &state.document, &state.user)
            }
        }
    }

    /// Every finished annotator of `document`.
    ///
    /// Fails if any finished graph cannot be read: a silently missing
    /// annotator would make every completeness check wrong.
    pub fn for_curation(documents: &dyn DocumentService, document: &SourceDocument) -> Result<Self> {
        let mut finished: Vec<AnnotationDocument> = documents
            .list_annotation_documents(document)?
            .into_iter()
            .filter(|d| d.state.is_finished())
            .collect();
        finished.sort_by(|a, b| a.user.cmp(&b.user));

        let mut sources = CasMap::new();
        for annotation_document in &finished {
            let cas = documents.read_annotation_cas(annotation_document)?;
            sources.insert(annotation_document.user.clone(), cas);
        }

        let base = finished
            .into_iter()
            .next()
            .ok_or_else(|| ConcordError::NoSources {
                document: document.to_string(),
            })?;

        debug!(
            document = %document,
            annotators = sources.len(),
            base = %base.user,
            "Curation sources loaded"
        );
        Ok(Self { sources, base })
    }

    /// Only the graph of `user`.
    pub fn for_correction(
        documents: &dyn DocumentService,
        document: &SourceDocument,
        user: &str,
    ) -> Result<Self> {
        let base = documents.get_annotation_document(document, user)?;
        let cas = documents.read_annotation_cas(&base)?;

        let mut sources = CasMap::new();
        sources.insert(base.user.clone(), cas);
        Ok(Self { sources, base })
    }

    /// The graphs keyed by annotator.
    pub fn sources(&self) -> &CasMap {
        &self.sources
    }

    /// Graph of one annotator.
    pub fn get(&self, user: &str) -> Option<&Cas> {
        self.sources.get(user)
    }

    /// The annotators, in name order.
    pub fn annotators(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// The base document.
    pub fn base_document(&self) -> &AnnotationDocument {
        &self.base
    }

    /// Graph of the base document.
    pub fn base_cas(&self) -> &Cas {
        // Both constructors insert the base document's graph
        &self.sources[&self.base.user]
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
