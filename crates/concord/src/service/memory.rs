//! In-memory document store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::{ConcordError, Result};
use crate::model::{
    AnnotationDocument, AnnotationDocumentState, AnnotatorId, Cas, SourceDocument, WorkingTarget,
};

use super::{CasStorageService, CorrectionDocumentService, CurationDocumentService, DocumentService};

/// A stored graph, or a slot whose content can no longer be deserialized.
#[derive(Debug, Clone)]
enum Slot {
    Stored { cas: Cas, timestamp: DateTime<Utc> },
    Corrupt,
}

#[derive(Debug, Default)]
struct Inner {
    assignments: BTreeMap<SourceDocument, Vec<AnnotationDocument>>,
    annotations: HashMap<(SourceDocument, AnnotatorId), Slot>,
    curation: HashMap<SourceDocument, Slot>,
    correction: HashMap<SourceDocument, Slot>,
    cache: HashMap<(SourceDocument, AnnotatorId), Cas>,
}

/// Thread-safe in-memory implementation of every store trait.
///
/// Annotation reads go through a cache while caching is enabled; reads made
/// with the cache disabled neither consult nor fill it. Counters expose how
/// the store was used so callers can check access patterns.
#[derive(Debug)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
    cache_enabled: AtomicBool,
    fail_writes: AtomicBool,
    uncached_reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Create an empty store with caching enabled.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            cache_enabled: AtomicBool::new(true),
            fail_writes: AtomicBool::new(false),
            uncached_reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Assign a document to an annotator and store their graph.
    pub fn add_annotation_document(&self, annotation_document: AnnotationDocument, cas: Cas) {
        let mut inner = self.inner();
        let key = (
            annotation_document.document.clone(),
            annotation_document.user.clone(),
        );
        inner.annotations.insert(
            key.clone(),
            Slot::Stored {
                cas,
                timestamp: Utc::now(),
            },
        );
        inner.cache.remove(&key);

        let list = inner
            .assignments
            .entry(annotation_document.document.clone())
            .or_default();
        list.retain(|d| d.user != annotation_document.user);
        list.push(annotation_document);
    }

    /// Change the lifecycle state of an assignment.
    pub fn set_state(&self, document: &SourceDocument, user: &str, state: AnnotationDocumentState) {
        let mut inner = self.inner();
        if let Some(list) = inner.assignments.get_mut(document) {
            for d in list.iter_mut().filter(|d| d.user == user) {
                d.state = state;
            }
        }
    }

    /// Make an annotator's graph unreadable.
    pub fn corrupt_annotation_cas(&self, document: &SourceDocument, user: &str) {
        let mut inner = self.inner();
        let key = (document.clone(), user.to_string());
        inner.cache.remove(&key);
        inner.annotations.insert(key, Slot::Corrupt);
    }

    /// Make the curation graph unreadable.
    pub fn corrupt_curation_cas(&self, document: &SourceDocument) {
        self.inner().curation.insert(document.clone(), Slot::Corrupt);
    }

    /// Store a curation graph directly.
    pub fn put_curation_cas(&self, document: &SourceDocument, cas: Cas) {
        self.inner().curation.insert(
            document.clone(),
            Slot::Stored {
                cas,
                timestamp: Utc::now(),
            },
        );
    }

    /// Store a correction graph directly.
    pub fn put_correction_cas(&self, document: &SourceDocument, cas: Cas) {
        self.inner().correction.insert(
            document.clone(),
            Slot::Stored {
                cas,
                timestamp: Utc::now(),
            },
        );
    }

    /// The stored curation graph, bypassing the cache.
    pub fn curation_cas(&self, document: &SourceDocument) -> Option<Cas> {
        match self.inner().curation.get(document) {
            Some(Slot::Stored { cas, .. }) => Some(cas.clone()),
            _ => None,
        }
    }

    /// The stored correction graph, bypassing the cache.
    pub fn correction_cas(&self, document: &SourceDocument) -> Option<Cas> {
        match self.inner().correction.get(document) {
            Some(Slot::Stored { cas, .. }) => Some(cas.clone()),
            _ => None,
        }
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of annotation reads served with the cache disabled.
    pub fn uncached_reads(&self) -> usize {
        self.uncached_reads.load(Ordering::SeqCst)
    }

    /// Number of successful working-graph writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of cached annotation graphs.
    pub fn cached_graphs(&self) -> usize {
        self.inner().cache.len()
    }

    fn check_write(&self, document: &SourceDocument) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ConcordError::Persist {
                document: document.to_string(),
                message: "store is read-only".to_string(),
            });
        }
        Ok(())
    }

    fn store(
        slots: &mut HashMap<SourceDocument, Slot>,
        cas: &Cas,
        document: &SourceDocument,
        update_timestamp: bool,
    ) {
        let timestamp = match slots.get(document) {
            Some(Slot::Stored { timestamp, .. }) if !update_timestamp => *timestamp,
            _ => Utc::now(),
        };
        slots.insert(
            document.clone(),
            Slot::Stored {
                cas: cas.clone(),
                timestamp,
            },
        );
    }
}

fn read_slot(
    slot: Option<&Slot>,
    document: &SourceDocument,
    target: WorkingTarget,
) -> Result<Cas> {
    match slot {
        Some(Slot::Stored { cas, .. }) => Ok(cas.clone()),
        Some(Slot::Corrupt) => Err(ConcordError::Read {
            document: document.to_string(),
            annotator: target.owner().to_string(),
            message: "stored graph is corrupt".to_string(),
        }),
        None => Err(ConcordError::NotFound {
            document: document.to_string(),
            target: target.to_string(),
        }),
    }
}

fn slot_timestamp(slot: Option<&Slot>) -> Option<DateTime<Utc>> {
    match slot {
        Some(Slot::Stored { timestamp, .. }) => Some(*timestamp),
        _ => None,
    }
}

impl DocumentService for MemoryRepository {
    fn list_annotation_documents(
        &self,
        document: &SourceDocument,
    ) -> Result<Vec<AnnotationDocument>> {
        Ok(self
            .inner()
            .assignments
            .get(document)
            .cloned()
            .unwrap_or_default())
    }

    fn read_annotation_cas(&self, annotation_document: &AnnotationDocument) -> Result<Cas> {
        let key = (
            annotation_document.document.clone(),
            annotation_document.user.clone(),
        );
        let mut inner = self.inner();
        let cache_enabled = self.cache_enabled.load(Ordering::SeqCst);

        if cache_enabled {
            if let Some(cas) = inner.cache.get(&key) {
                return Ok(cas.clone());
            }
        } else {
            self.uncached_reads.fetch_add(1, Ordering::SeqCst);
        }

        let cas = match inner.annotations.get(&key) {
            Some(Slot::Stored { cas, .. }) => cas.clone(),
            Some(Slot::Corrupt) => {
                return Err(ConcordError::Read {
                    document: annotation_document.document.to_string(),
                    annotator: annotation_document.user.clone(),
                    message: "stored graph is corrupt".to_string(),
                });
            }
            None => {
                return Err(ConcordError::Read {
                    document: annotation_document.document.to_string(),
                    annotator: annotation_document.user.clone(),
                    message: "no graph stored".to_string(),
                });
            }
        };

        if cache_enabled {
            inner.cache.insert(key, cas.clone());
        }
        Ok(cas)
    }

    fn get_annotation_document(
        &self,
        document: &SourceDocument,
        user: &str,
    ) -> Result<AnnotationDocument> {
        self.inner()
            .assignments
            .get(document)
            .and_then(|list| list.iter().find(|d| d.user == user).cloned())
            .ok_or_else(|| ConcordError::Read {
                document: document.to_string(),
                annotator: user.to_string(),
                message: "user is not assigned to this document".to_string(),
            })
    }
}

impl CurationDocumentService for MemoryRepository {
    fn read_curation_cas(&self, document: &SourceDocument) -> Result<Cas> {
        read_slot(self.inner().curation.get(document), document, WorkingTarget::Curation)
    }

    fn write_curation_cas(
        &self,
        cas: &Cas,
        document: &SourceDocument,
        update_timestamp: bool,
    ) -> Result<()> {
        self.check_write(document)?;
        Self::store(&mut self.inner().curation, cas, document, update_timestamp);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn upgrade_curation_cas(&self, cas: &mut Cas, _document: &SourceDocument) -> Result<()> {
        cas.upgrade();
        Ok(())
    }

    fn curation_cas_timestamp(&self, document: &SourceDocument) -> Result<Option<DateTime<Utc>>> {
        Ok(slot_timestamp(self.inner().curation.get(document)))
    }
}

impl CorrectionDocumentService for MemoryRepository {
    fn read_correction_cas(&self, document: &SourceDocument) -> Result<Cas> {
        read_slot(self.inner().correction.get(document), document, WorkingTarget::Correction)
    }

    fn write_correction_cas(&self, cas: &Cas, document: &SourceDocument) -> Result<()> {
        self.check_write(document)?;
        Self::store(&mut self.inner().correction, cas, document, true);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn upgrade_correction_cas(&self, cas: &mut Cas, _document: &SourceDocument) -> Result<()> {
        cas.upgrade();
        Ok(())
    }

    fn correction_cas_timestamp(
        &self,
        document: &SourceDocument,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(slot_timestamp(self.inner().correction.get(document)))
    }
}

impl CasStorageService for MemoryRepository {
    fn is_cache_enabled(&self) -> bool {
        self.cache_enabled.load(Ordering::SeqCst)
    }

    fn enable_cache(&self) {
        self.cache_enabled.store(true, Ordering::SeqCst);
    }

    fn disable_cache(&self) {
        self.cache_enabled.store(false, Ordering::SeqCst);
    }
}
