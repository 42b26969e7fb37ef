//! The consensus builder and its public API.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::config::ConsensusConfig;
use crate::curation::{
    classify_segment, Acquired, AnnotationSourceSet, CasAcquisition, ConsensusContainer,
    SegmentIndex, SegmentView,
};
use crate::diff::{DiffEngine, SpanDiff};
use crate::error::Result;
use crate::merge::{AgreementMerge, MergeEngine};
use crate::model::{BuildState, Cas, WorkingTarget};
use crate::service::{
    CasStorageService, CorrectionDocumentService, CurationDocumentService, DocumentService,
    SchemaService,
};

/// Everything a build talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub documents: Arc<dyn DocumentService>,
    pub curation: Arc<dyn CurationDocumentService>,
    pub correction: Arc<dyn CorrectionDocumentService>,
    pub storage: Arc<dyn CasStorageService>,
    pub schema: Arc<dyn SchemaService>,
    pub diff: Arc<dyn DiffEngine>,
    pub merge: Arc<dyn MergeEngine>,
}

impl Collaborators {
    /// Use one repository for every store, with [`SpanDiff`] and
    /// [`AgreementMerge`] as engines.
    pub fn with_repository<R>(repository: Arc<R>, schema: impl SchemaService + 'static) -> Self
    where
        R: DocumentService
            + CurationDocumentService
            + CorrectionDocumentService
            + CasStorageService
            + 'static,
    {
        Self {
            documents: repository.clone(),
            curation: repository.clone(),
            correction: repository.clone(),
            storage: repository,
            schema: Arc::new(schema),
            diff: Arc::new(SpanDiff::new()),
            merge: Arc::new(AgreementMerge::new()),
        }
    }

    /// Replace the diff engine.
    pub fn with_diff(mut self, diff: impl DiffEngine + 'static) -> Self {
        self.diff = Arc::new(diff);
        self
    }

    /// Replace the merge engine.
    pub fn with_merge(mut self, merge: impl MergeEngine + 'static) -> Self {
        self.merge = Arc::new(merge);
        self
    }
}

/// Builds the sentence-level agreement view of a document.
pub struct ConsensusBuilder {
    services: Collaborators,
    config: ConsensusConfig,
}

impl ConsensusBuilder {
    /// Create a builder with default configuration.
    pub fn new(services: Collaborators) -> Self {
        Self::with_config(services, ConsensusConfig::default())
    }

    /// Create a builder with custom configuration.
    pub fn with_config(services: Collaborators, config: ConsensusConfig) -> Self {
        Self { services, config }
    }

    fn acquisition(&self) -> CasAcquisition<'_> {
        CasAcquisition {
            documents: self.services.documents.as_ref(),
            curation: self.services.curation.as_ref(),
            correction: self.services.correction.as_ref(),
            storage: self.services.storage.as_ref(),
            schema: self.services.schema.as_ref(),
            diff: self.services.diff.as_ref(),
            merge: self.services.merge.as_ref(),
            config: &self.config,
        }
    }

    /// Get the working graph of `state`, creating and persisting it if needed.
    pub fn acquire_working_cas(&self, state: &mut BuildState) -> Result<Acquired> {
        let sources = AnnotationSourceSet::build(self.services.documents.as_ref(), state)?;
        self.acquisition().acquire(state, &sources)
    }

    /// Classify every sentence of the state's window.
    ///
    /// The working graph is acquired first, so a build on a document without
    /// a curation graph creates one. Nothing is returned unless every segment
    /// was classified.
    pub fn build(&self, state: &mut BuildState) -> Result<ConsensusContainer> {
        self.config.validate()?;

        let started = Instant::now();
        let sources = AnnotationSourceSet::build(self.services.documents.as_ref(), state)?;
        let working = self.acquisition().acquire(state, &sources)?.cas;

        let reference: &Cas = match state.mode.target() {
            WorkingTarget::Curation => &working,
            WorkingTarget::Correction => sources.base_cas(),
        };
        let index = SegmentIndex::build(
            &state.document,
            reference,
            state.window,
            sources.sources(),
            &working,
        )?;

        let adapters = self.services.schema.diff_adapters(&state.layers);
        debug!(
            document = %state.document,
            segments = index.len(),
            engine = self.services.diff.name(),
            "Calculating differences"
        );

        let mut container = ConsensusContainer::new();
        for (n, segment) in index.segments().enumerate() {
            if n > 0 && n % self.config.progress_interval == 0 {
                debug!(processed = n, total = index.len(), "Processing differences");
            }

            let diff = self
                .services
                .diff
                .diff(
                    &adapters,
                    self.config.link_compare,
                    sources.sources(),
                    segment.begin,
                    segment.end,
                )
                .map_err(|e| e.into_diff_error(&state.document, "segment diff"))?;

            container.insert(SegmentView::new(
                segment,
                classify_segment(&diff),
                index.source_addresses(segment.begin),
                index.working_address(segment.begin),
            ));
        }

        debug!(
            document = %state.document,
            segments = container.len(),
            disagreeing = container.disagreeing(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Difference calculation completed"
        );
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::SentenceState;
    use crate::error::ConcordError;
    use crate::model::{
        AnnotationDocument, AnnotationDocumentState, AnnotationLayer, Mode, SourceDocument, Window,
    };
    use crate::service::{MemoryRepository, StaticSchema};

    const TEXT: &str = "John met Mary. They talked.";

    fn doc() -> SourceDocument {
        SourceDocument::new("project", "doc.txt")
    }

    fn setup(labels: &[(&str, &str)]) -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        for (user, label) in labels {
            let mut cas = Cas::with_sentences(TEXT, &[(0, 14), (15, 27)]);
            cas.add_labeled("NamedEntity", 0, 4, "value", *label);
            repo.add_annotation_document(
                AnnotationDocument::new(doc(), *user, AnnotationDocumentState::Finished),
                cas,
            );
        }
        repo
    }

    fn state() -> BuildState {
        BuildState::new(doc(), Mode::Curation, Window::new(0, 27).unwrap(), "curator")
            .with_layers(vec![AnnotationLayer::span("NamedEntity", &["value"])])
    }

    #[test]
    fn test_build_classifies_each_sentence() {
        let repo = setup(&[("alice", "PER"), ("bob", "ORG")]);
        let builder = ConsensusBuilder::new(Collaborators::with_repository(repo, StaticSchema::new()));

        let container = builder.build(&mut state()).unwrap();
        assert_eq!(container.len(), 2);
        assert_eq!(container.get(0).unwrap().state(), SentenceState::Disagree);
        assert_eq!(container.get(15).unwrap().state(), SentenceState::Agree);
        assert_eq!(container.get(15).unwrap().sequence_number(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let repo = setup(&[("alice", "PER")]);
        let config = ConsensusConfig {
            progress_interval: 0,
            ..ConsensusConfig::default()
        };
        let builder = ConsensusBuilder::with_config(
            Collaborators::with_repository(repo, StaticSchema::new()),
            config,
        );
        assert!(matches!(
            builder.build(&mut state()),
            Err(ConcordError::Config(_))
        ));
    }
}
