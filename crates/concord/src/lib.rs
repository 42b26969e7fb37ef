//! Concord: sentence-level consensus over independently annotated documents.
//!
//! Several annotators annotate the same document, each in their own graph.
//! Concord compares these graphs sentence by sentence, tells a curator where
//! the annotators agree and where they conflict, and gets or lazily creates
//! the curator's working graph pre-filled with the undisputed annotations.
//!
//! # Core Principles
//!
//! - **Complete or nothing**: a build returns a verdict for every sentence of
//!   the window, or an error
//! - **Addressable**: every segment records the sentence address in each
//!   annotator's graph and in the working graph
//! - **Pluggable**: stores, schema, diff and merge are traits
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use concord::{
//!     AnnotationLayer, BuildState, Collaborators, ConsensusBuilder, FileRepository, Mode,
//!     SourceDocument, StaticSchema, Window,
//! };
//!
//! let repository = Arc::new(FileRepository::new("project-data"));
//! let builder = ConsensusBuilder::new(Collaborators::with_repository(
//!     repository,
//!     StaticSchema::new(),
//! ));
//!
//! let mut state = BuildState::new(
//!     SourceDocument::new("news", "doc1.txt"),
//!     Mode::Curation,
//!     Window::new(0, 500).unwrap(),
//!     "curator",
//! )
//! .with_layers(vec![AnnotationLayer::span("NamedEntity", &["value"])]);
//!
//! let container = builder.build(&mut state).unwrap();
//! println!("Disagreeing sentences: {}", container.disagreeing());
//! ```

pub mod config;
pub mod curation;
pub mod diff;
pub mod error;
pub mod merge;
pub mod model;
pub mod service;

mod consensus;

pub use crate::consensus::{Collaborators, ConsensusBuilder};
pub use config::ConsensusConfig;
pub use curation::{
    AcquisitionOutcome, ConsensusContainer, SegmentView, SentenceState,
};
pub use diff::{DiffEngine, LinkCompareBehavior, SpanDiff};
pub use error::{ConcordError, Result};
pub use merge::{AgreementMerge, MergeEngine};
pub use model::{
    AnnotationDocument, AnnotationDocumentState, AnnotationLayer, BuildState, Cas, Mode,
    SourceDocument, Window,
};
pub use service::{FileRepository, MemoryRepository, StaticSchema};
