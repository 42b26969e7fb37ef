//! JSON-on-disk project store.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! └── <project>/
//!     └── <document>/
//!         ├── documents.json          # annotator assignments and states
//!         ├── annotation/
//!         │   ├── alice.json          # one graph per annotator
//!         │   └── bob.json
//!         ├── curation.json           # curator's working graph
//!         └── correction.json         # corrector's working graph
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConcordError, Result};
use crate::model::{
    AnnotationDocument, AnnotationDocumentState, Cas, SourceDocument, WorkingTarget,
};

use super::{CasStorageService, CorrectionDocumentService, CurationDocumentService, DocumentService};

const ASSIGNMENTS_FILE: &str = "documents.json";
const ANNOTATION_DIR: &str = "annotation";
const CURATION_FILE: &str = "curation.json";
const CORRECTION_FILE: &str = "correction.json";

/// One line of `documents.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Assignment {
    user: String,
    state: AnnotationDocumentState,
}

/// Project store keeping every graph as a pretty-printed JSON file.
///
/// Parsed graphs are kept in an in-process cache keyed by path while caching
/// is enabled. Writes through this store invalidate the cached entry.
#[derive(Debug)]
pub struct FileRepository {
    root: PathBuf,
    cache: Mutex<HashMap<PathBuf, Cas>>,
    cache_enabled: AtomicBool,
}

impl FileRepository {
    /// Open a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Mutex::new(HashMap::new()),
            cache_enabled: AtomicBool::new(true),
        }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything about one document.
    pub fn document_dir(&self, document: &SourceDocument) -> PathBuf {
        self.root.join(&document.project).join(&document.name)
    }

    fn annotation_path(&self, document: &SourceDocument, user: &str) -> PathBuf {
        self.document_dir(document)
            .join(ANNOTATION_DIR)
            .join(format!("{}.json", user))
    }

    fn curation_path(&self, document: &SourceDocument) -> PathBuf {
        self.document_dir(document).join(CURATION_FILE)
    }

    fn correction_path(&self, document: &SourceDocument) -> PathBuf {
        self.document_dir(document).join(CORRECTION_FILE)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<PathBuf, Cas>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store an annotator's graph and record their assignment.
    pub fn import_annotation(
        &self,
        document: &SourceDocument,
        user: &str,
        state: AnnotationDocumentState,
        cas: &Cas,
    ) -> Result<()> {
        let path = self.annotation_path(document, user);
        save_json(&path, cas).map_err(|message| ConcordError::Persist {
            document: document.to_string(),
            message,
        })?;
        self.cache().remove(&path);

        let mut assignments = self.load_assignments(document)?;
        assignments.retain(|a| a.user != user);
        assignments.push(Assignment {
            user: user.to_string(),
            state,
        });
        assignments.sort_by(|a, b| a.user.cmp(&b.user));

        let path = self.document_dir(document).join(ASSIGNMENTS_FILE);
        save_json(&path, &assignments).map_err(|message| ConcordError::Persist {
            document: document.to_string(),
            message,
        })
    }

    fn load_assignments(&self, document: &SourceDocument) -> Result<Vec<Assignment>> {
        let path = self.document_dir(document).join(ASSIGNMENTS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        load_json(&path).map_err(|message| ConcordError::Read {
            document: document.to_string(),
            annotator: ASSIGNMENTS_FILE.to_string(),
            message,
        })
    }

    /// Load a graph, consulting the cache while it is enabled.
    fn read_cas(&self, path: &Path) -> std::result::Result<Cas, String> {
        let cache_enabled = self.cache_enabled.load(Ordering::SeqCst);
        if cache_enabled {
            if let Some(cas) = self.cache().get(path) {
                return Ok(cas.clone());
            }
        }

        let cas: Cas = load_json(path)?;
        if cache_enabled {
            self.cache().insert(path.to_path_buf(), cas.clone());
        }
        Ok(cas)
    }

    fn write_cas(&self, path: &Path, cas: &Cas, document: &SourceDocument) -> Result<()> {
        save_json(path, cas).map_err(|message| ConcordError::Persist {
            document: document.to_string(),
            message,
        })?;
        self.cache().remove(path);
        debug!(path = %path.display(), "Graph written");
        Ok(())
    }

    fn read_working(
        &self,
        path: &Path,
        document: &SourceDocument,
        target: WorkingTarget,
    ) -> Result<Cas> {
        if !path.exists() {
            return Err(ConcordError::NotFound {
                document: document.to_string(),
                target: target.to_string(),
            });
        }
        self.read_cas(path).map_err(|message| ConcordError::Read {
            document: document.to_string(),
            annotator: target.owner().to_string(),
            message,
        })
    }
}

/// Serialize `value` to `path`, creating parent directories as needed.
fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::result::Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                format!("Failed to create directory '{}': {}", parent.display(), e)
            })?;
        }
    }

    let file = File::create(path)
        .map_err(|e| format!("Failed to create file '{}': {}", path.display(), e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .map_err(|e| format!("Failed to serialize '{}': {}", path.display(), e))
}

/// Deserialize a JSON file.
fn load_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))
}

/// Modification time of a file, if it exists.
fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

impl DocumentService for FileRepository {
    fn list_annotation_documents(
        &self,
        document: &SourceDocument,
    ) -> Result<Vec<AnnotationDocument>> {
        Ok(self
            .load_assignments(document)?
            .into_iter()
            .map(|a| AnnotationDocument::new(document.clone(), a.user, a.state))
            .collect())
    }

    fn read_annotation_cas(&self, annotation_document: &AnnotationDocument) -> Result<Cas> {
        let path = self.annotation_path(&annotation_document.document, &annotation_document.user);
        self.read_cas(&path).map_err(|message| ConcordError::Read {
            document: annotation_document.document.to_string(),
            annotator: annotation_document.user.clone(),
            message,
        })
    }

    fn get_annotation_document(
        &self,
        document: &SourceDocument,
        user: &str,
    ) -> Result<AnnotationDocument> {
        self.list_annotation_documents(document)?
            .into_iter()
            .find(|d| d.user == user)
            .ok_or_else(|| ConcordError::Read {
                document: document.to_string(),
                annotator: user.to_string(),
                message: "user is not assigned to this document".to_string(),
            })
    }
}

impl CurationDocumentService for FileRepository {
    fn read_curation_cas(&self, document: &SourceDocument) -> Result<Cas> {
        self.read_working(&self.curation_path(document), document, WorkingTarget::Curation)
    }

    /// File timestamps always move on write, so `update_timestamp` has no
    /// further effect here.
    fn write_curation_cas(
        &self,
        cas: &Cas,
        document: &SourceDocument,
        _update_timestamp: bool,
    ) -> Result<()> {
        self.write_cas(&self.curation_path(document), cas, document)
    }

    fn upgrade_curation_cas(&self, cas: &mut Cas, document: &SourceDocument) -> Result<()> {
        if cas.upgrade() {
            debug!(document = %document, "Curation graph upgraded");
        }
        Ok(())
    }

    fn curation_cas_timestamp(&self, document: &SourceDocument) -> Result<Option<DateTime<Utc>>> {
        Ok(modified_at(&self.curation_path(document)))
    }
}

impl CorrectionDocumentService for FileRepository {
    fn read_correction_cas(&self, document: &SourceDocument) -> Result<Cas> {
        self.read_working(&self.correction_path(document), document, WorkingTarget::Correction)
    }

    fn write_correction_cas(&self, cas: &Cas, document: &SourceDocument) -> Result<()> {
        self.write_cas(&self.correction_path(document), cas, document)
    }

    fn upgrade_correction_cas(&self, cas: &mut Cas, document: &SourceDocument) -> Result<()> {
        if cas.upgrade() {
            debug!(document = %document, "Correction graph upgraded");
        }
        Ok(())
    }

    fn correction_cas_timestamp(
        &self,
        document: &SourceDocument,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(modified_at(&self.correction_path(document)))
    }
}

impl CasStorageService for FileRepository {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CURATION_USER;
    use tempfile::TempDir;

    fn doc() -> SourceDocument {
        SourceDocument::new("news", "article-1.txt")
    }

    #[test]
    fn test_document_layout() {
        let repo = FileRepository::new("/data");
        assert_eq!(
            repo.annotation_path(&doc(), "alice").to_string_lossy(),
            "/data/news/article-1.txt/annotation/alice.json"
        );
        assert_eq!(
            repo.curation_path(&doc()).to_string_lossy(),
            "/data/news/article-1.txt/curation.json"
        );
    }

    #[test]
    fn test_import_and_list() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        let cas = Cas::with_sentences("One. Two.", &[(0, 4), (5, 9)]);

        repo.import_annotation(&doc(), "bob", AnnotationDocumentState::Finished, &cas)
            .unwrap();
        repo.import_annotation(&doc(), "alice", AnnotationDocumentState::InProgress, &cas)
            .unwrap();

        let docs = repo.list_annotation_documents(&doc()).unwrap();
        let users: Vec<&str> = docs.iter().map(|d| d.user.as_str()).collect();
        assert_eq!(users, vec!["alice", "bob"]);

        let read = repo.read_annotation_cas(&docs[1]).unwrap();
        assert_eq!(read, cas);
    }

    #[test]
    fn test_missing_curation_is_not_found() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        assert!(repo.read_curation_cas(&doc()).unwrap_err().is_not_found());
        assert_eq!(repo.curation_cas_timestamp(&doc()).unwrap(), None);
    }

    #[test]
    fn test_corrupt_curation_is_read_error() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        let path = repo.curation_path(&doc());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        match repo.read_curation_cas(&doc()).unwrap_err() {
            ConcordError::Read { annotator, .. } => assert_eq!(annotator, CURATION_USER),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_annotation_with_reused_address_is_read_error() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        let cas = Cas::new("One.");
        repo.import_annotation(&doc(), "alice", AnnotationDocumentState::Finished, &cas)
            .unwrap();
        fs::write(
            repo.annotation_path(&doc(), "alice"),
            r#"{"text": "One.", "next_address": 1,
                "sentences": [{"address": 1, "begin": 0, "end": 4}],
                "annotations": [{"address": 1, "layer": "POS", "begin": 0, "end": 3}]}"#,
        )
        .unwrap();

        let ad = repo.get_annotation_document(&doc(), "alice").unwrap();
        match repo.read_annotation_cas(&ad).unwrap_err() {
            ConcordError::Read { annotator, message, .. } => {
                assert_eq!(annotator, "alice");
                assert!(message.contains("duplicate address"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_then_read_curation() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        let cas = Cas::with_sentences("One.", &[(0, 4)]);

        repo.write_curation_cas(&cas, &doc(), false).unwrap();
        assert_eq!(repo.read_curation_cas(&doc()).unwrap(), cas);
        assert!(repo.curation_cas_timestamp(&doc()).unwrap().is_some());
    }

    #[test]
    fn test_disabled_cache_is_not_filled() {
        let dir = TempDir::new().unwrap();
        let repo = FileRepository::new(dir.path());
        let cas = Cas::new("text");
        repo.import_annotation(&doc(), "alice", AnnotationDocumentState::Finished, &cas)
            .unwrap();
        let ad = repo.get_annotation_document(&doc(), "alice").unwrap();

        repo.disable_cache();
        repo.read_annotation_cas(&ad).unwrap();
        assert!(repo.cache().is_empty());

        repo.enable_cache();
        repo.read_annotation_cas(&ad).unwrap();
        assert_eq!(repo.cache().len(), 1);
    }
}
