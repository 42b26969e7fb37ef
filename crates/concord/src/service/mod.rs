//! Collaborator contracts: document stores, the storage cache and the schema.
//!
//! The consensus builder only talks to these traits. Two complete stores are
//! provided: [`MemoryRepository`] for tests and embedding, and
//! [`FileRepository`] keeping a project as JSON files on disk.

mod fs;
mod memory;
mod schema;

pub use fs::FileRepository;
pub use memory::MemoryRepository;
pub use schema::StaticSchema;

use chrono::{DateTime, Utc};

use crate::diff::DiffAdapter;
use crate::error::Result;
use crate::model::{AnnotationDocument, AnnotationLayer, Cas, SourceDocument};

/// Access to annotator assignments and their graphs.
pub trait DocumentService: Send + Sync {
    /// All annotator assignments of a document, in any state.
    fn list_annotation_documents(&self, document: &SourceDocument)
        -> Result<Vec<AnnotationDocument>>;

    /// Read an annotator's graph. Fails with `ConcordError::Read`.
    fn read_annotation_cas(&self, annotation_document: &AnnotationDocument) -> Result<Cas>;

    /// The assignment of `user` to a document.
    fn get_annotation_document(
        &self,
        document: &SourceDocument,
        user: &str,
    ) -> Result<AnnotationDocument>;
}

/// Storage of the curator's merged graph.
pub trait CurationDocumentService: Send + Sync {
    /// Read the curation graph. Fails with `ConcordError::NotFound` when none exists.
    fn read_curation_cas(&self, document: &SourceDocument) -> Result<Cas>;

    /// Store the curation graph. `update_timestamp` bumps the stored timestamp
    /// even when a previous one exists.
    fn write_curation_cas(
        &self,
        cas: &Cas,
        document: &SourceDocument,
        update_timestamp: bool,
    ) -> Result<()>;

    /// Migrate a curation graph to the current schema.
    fn upgrade_curation_cas(&self, cas: &mut Cas, document: &SourceDocument) -> Result<()>;

    /// When the curation graph was last written.
    fn curation_cas_timestamp(&self, document: &SourceDocument) -> Result<Option<DateTime<Utc>>>;
}

/// Storage of the corrector's working graph.
pub trait CorrectionDocumentService: Send + Sync {
    /// Read the correction graph. Fails with `ConcordError::NotFound` when none exists.
    fn read_correction_cas(&self, document: &SourceDocument) -> Result<Cas>;

    /// Store the correction graph.
    fn write_correction_cas(&self, cas: &Cas, document: &SourceDocument) -> Result<()>;

    /// Migrate a correction graph to the current schema.
    fn upgrade_correction_cas(&self, cas: &mut Cas, document: &SourceDocument) -> Result<()>;

    /// When the correction graph was last written.
    fn correction_cas_timestamp(&self, document: &SourceDocument)
        -> Result<Option<DateTime<Utc>>>;
}

/// Process-wide cache of deserialized graphs.
///
/// Toggling goes through `&self` because the cache is shared by every reader.
pub trait CasStorageService: Send + Sync {
    fn is_cache_enabled(&self) -> bool;
    fn enable_cache(&self);
    fn disable_cache(&self);
}

/// Layer definitions and their diff adapters.
pub trait SchemaService: Send + Sync {
    /// Adapters for the layers that take part in diffing.
    fn diff_adapters(&self, layers: &[AnnotationLayer]) -> Vec<DiffAdapter>;

    /// Adapters for the document-level codebook annotations.
    fn codebook_adapters(&self, document: &SourceDocument) -> Result<Vec<DiffAdapter>>;
}
