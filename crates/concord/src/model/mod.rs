//! Data model: annotation graphs, documents, layers and session state.

mod cas;
mod document;
mod layer;
mod state;

pub use cas::{Address, Annotation, Cas, Link, Sentence, CURRENT_SCHEMA_VERSION};
pub use document::{
    AnnotationDocument, AnnotationDocumentState, AnnotatorId, Mode, SourceDocument, Window,
    WorkingTarget, CORRECTION_USER, CURATION_USER,
};
pub use layer::{AnnotationLayer, LayerKind, TOKEN_LAYER};
pub use state::BuildState;
