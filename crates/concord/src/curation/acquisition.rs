//! Getting or lazily creating the working graph of a build.
//!
//! Acquisition first tries to read the stored working graph. A graph that
//! cannot be read counts as not created yet: a fresh one is built from the
//! annotator sources, persisted, and returned. A graph that was read can be
//! migrated to the current schema on the way out.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConsensusConfig;
use crate::diff::DiffEngine;
use crate::error::{ConcordError, Result};
use crate::merge::MergeEngine;
use crate::model::{BuildState, Cas, SourceDocument, WorkingTarget};
use crate::service::{
    CasStorageService, CorrectionDocumentService, CurationDocumentService, DocumentService,
    SchemaService,
};

use super::sources::AnnotationSourceSet;

/// Suspends the storage cache until dropped.
///
/// The enabled state is captured on creation. Dropping the guard re-enables
/// the cache only if it was enabled before, so the prior state survives every
/// exit path, including `?` and panics.
pub struct CacheSuspension<'a> {
    storage: &'a dyn CasStorageService,
    was_enabled: bool,
}

impl<'a> CacheSuspension<'a> {
    pub fn new(storage: &'a dyn CasStorageService) -> Self {
        let was_enabled = storage.is_cache_enabled();
        storage.disable_cache();
        Self {
            storage,
            was_enabled,
        }
    }

    /// Whether the cache was enabled when the guard was created.
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl Drop for CacheSuspension<'_> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.storage.enable_cache();
        }
    }
}

/// Outcome of reading a stored working graph.
#[derive(Debug)]
pub enum TryRead {
    Found(Cas),
    Absent,
}

/// How the working graph was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionOutcome {
    /// Read from the store as is.
    Read,
    /// Read, migrated to the current schema and written back.
    Upgraded,
    /// Created from the annotator sources and written.
    Created,
}

/// A working graph and how it was obtained.
#[derive(Debug)]
pub struct Acquired {
    pub cas: Cas,
    pub outcome: AcquisitionOutcome,
}

/// The acquisition state machine over borrowed collaborators.
pub struct CasAcquisition<'a> {
    pub documents: &'a dyn DocumentService,
    pub curation: &'a dyn CurationDocumentService,
    pub correction: &'a dyn CorrectionDocumentService,
    pub storage: &'a dyn CasStorageService,
    pub schema: &'a dyn SchemaService,
    pub diff: &'a dyn DiffEngine,
    pub merge: &'a dyn MergeEngine,
    pub config: &'a ConsensusConfig,
}

impl CasAcquisition<'_> {
    /// Get the working graph for `state`, creating it if none is stored.
    ///
    /// Records the timestamp of every write in `state`.
    pub fn acquire(&self, state: &mut BuildState, sources: &AnnotationSourceSet) -> Result<Acquired> {
        let target = state.mode.target();

        match self.try_read(target, &state.document) {
            TryRead::Found(mut cas) => {
                if !self.config.upgrade_on_open {
                    debug!(document = %state.document, working = %target, "Working graph read");
                    return Ok(Acquired {
                        cas,
                        outcome: AcquisitionOutcome::Read,
                    });
                }
                self.upgrade_and_persist(target, &mut cas, state)?;
                Ok(Acquired {
                    cas,
                    outcome: AcquisitionOutcome::Upgraded,
                })
            }
            TryRead::Absent => {
                let cas = match target {
                    WorkingTarget::Curation => self.create_curation(state, sources)?,
                    WorkingTarget::Correction => self.create_correction(state, sources)?,
                };
                Ok(Acquired {
                    cas,
                    outcome: AcquisitionOutcome::Created,
                })
            }
        }
    }

    /// Read the stored working graph. Never fails.
    pub fn try_read(&self, target: WorkingTarget, document: &SourceDocument) -> TryRead {
        let read = match target {
            WorkingTarget::Curation => self.curation.read_curation_cas(document),
            WorkingTarget::Correction => self.correction.read_correction_cas(document),
        };

        match read {
            Ok(cas) => TryRead::Found(cas),
            Err(err) if err.is_not_found() => {
                debug!(document = %document, working = %target, "No working graph stored yet");
                TryRead::Absent
            }
            Err(err) => {
                warn!(
                    document = %document,
                    working = %target,
                    error = %err,
                    "Unreadable working graph, recreating"
                );
                TryRead::Absent
            }
        }
    }

    fn upgrade_and_persist(
        &self,
        target: WorkingTarget,
        cas: &mut Cas,
        state: &mut BuildState,
    ) -> Result<()> {
        let document = &state.document;
        let from_version = cas.schema_version();

        let timestamp = match target {
            WorkingTarget::Curation => {
                self.curation
                    .upgrade_curation_cas(cas, document)
                    .map_err(|e| e.into_upgrade_error(document))?;
                self.curation.write_curation_cas(cas, document, true)?;
                self.curation.curation_cas_timestamp(document)?
            }
            WorkingTarget::Correction => {
                self.correction
                    .upgrade_correction_cas(cas, document)
                    .map_err(|e| e.into_upgrade_error(document))?;
                self.correction.write_correction_cas(cas, document)?;
                self.correction.correction_cas_timestamp(document)?
            }
        };

        info!(
            document = %document,
            working = %target,
            from_version,
            to_version = cas.schema_version(),
            "Working graph upgraded"
        );
        state.update_document_timestamp_after_write(timestamp);
        Ok(())
    }

    fn create_correction(&self, state: &mut BuildState, sources: &AnnotationSourceSet) -> Result<Cas> {
        let document = &state.document;
        let cas = sources
            .get(&state.user)
            .cloned()
            .ok_or_else(|| ConcordError::Read {
                document: document.to_string(),
                annotator: state.user.clone(),
                message: "no source graph for the correcting user".to_string(),
            })?;

        self.correction.write_correction_cas(&cas, document)?;
        let timestamp = self.correction.correction_cas_timestamp(document)?;
        info!(document = %document, user = %state.user, "Correction graph created");

        state.update_document_timestamp_after_write(timestamp);
        Ok(cas)
    }

    fn create_curation(&self, state: &mut BuildState, sources: &AnnotationSourceSet) -> Result<Cas> {
        let started = Instant::now();
        let document = state.document.clone();

        // The skeleton is mutated by the merge below and must stay out of the cache
        let mut merge_cas = {
            let _suspension = CacheSuspension::new(self.storage);
            self.documents.read_annotation_cas(sources.base_document())?
        };

        let length = merge_cas.document_length();
        let adapters = self.schema.diff_adapters(&state.layers);
        let diff = self
            .diff
            .diff(&adapters, self.config.link_compare, sources.sources(), 0, length)
            .map_err(|e| e.into_diff_error(&document, "curation create"))?;
        let report = self
            .merge
            .merge(
                &diff,
                &adapters,
                &document,
                &state.user,
                &mut merge_cas,
                sources.sources(),
                self.config.merge_incomplete,
            )
            .map_err(|e| e.into_merge_error(&document, "curation create"))?;
        debug!(
            document = %document,
            merged = report.merged,
            skipped = report.skipped,
            "Layer annotations merged"
        );

        let codebook = self
            .schema
            .codebook_adapters(&document)
            .map_err(|e| e.into_diff_error(&document, "codebook"))?;
        if !codebook.is_empty() {
            let diff = self
                .diff
                .diff(&codebook, self.config.link_compare, sources.sources(), 0, length)
                .map_err(|e| e.into_diff_error(&document, "codebook"))?;
            let report = self
                .merge
                .merge(
                    &diff,
                    &codebook,
                    &document,
                    &state.user,
                    &mut merge_cas,
                    sources.sources(),
                    self.config.merge_incomplete,
                )
                .map_err(|e| e.into_merge_error(&document, "codebook"))?;
            debug!(document = %document, merged = report.merged, "Codebook annotations merged");
        }

        self.curation.write_curation_cas(&merge_cas, &document, false)?;
        let timestamp = self.curation.curation_cas_timestamp(&document)?;
        state.update_document_timestamp_after_write(timestamp);

        info!(
            document = %document,
            annotators = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Curation graph created"
        );
        Ok(merge_cas)
    }
}
