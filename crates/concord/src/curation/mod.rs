//! The pieces of a consensus build.
//!
//! A build selects the annotator sources ([`AnnotationSourceSet`]), acquires
//! the working graph ([`CasAcquisition`]), indexes the window into sentence
//! segments ([`SegmentIndex`]) and classifies each segment
//! ([`classify_segment`]) into a [`ConsensusContainer`].

mod acquisition;
mod classifier;
mod container;
mod segment;
mod sources;

pub use acquisition::{Acquired, AcquisitionOutcome, CacheSuspension, CasAcquisition, TryRead};
pub use classifier::{classify_segment, is_stacked, SentenceState};
pub use container::{ConsensusContainer, SegmentView};
pub use segment::{Segment, SegmentIndex};
pub use sources::AnnotationSourceSet;
