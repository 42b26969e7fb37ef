//! Writing agreed annotations into a working graph.
//!
//! The [`MergeEngine`] trait is the contract used when a curation graph is
//! created. [`AgreementMerge`] is a reference engine that keeps only the
//! positions all annotators agree on.

mod agreement;

pub use agreement::AgreementMerge;

use serde::Serialize;

use crate::diff::{CasMap, DiffAdapter, DiffResult};
use crate::error::Result;
use crate::model::{Cas, SourceDocument};

/// What a merge did to the target graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Annotations of owned layers removed from the target before merging.
    pub removed: usize,
    /// Annotations copied into the target.
    pub merged: usize,
    /// Configuration sets left out because annotators disagreed.
    pub skipped: usize,
    /// Links whose target was not merged.
    pub dropped_links: usize,
}

/// Writes the outcome of a diff into a target graph.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait MergeEngine: Send + Sync {
    /// Merge `diff` into `target`, mutating it in place.
    ///
    /// `adapters` name the layers the engine owns in `target`: their previous
    /// annotations are replaced. With `merge_incomplete`, positions that not
    /// every annotator annotated, but nobody contradicted, are merged too.
    #[allow(clippy::too_many_arguments)]
    fn merge(
        &self,
        diff: &DiffResult,
        adapters: &[DiffAdapter],
        document: &SourceDocument,
        curator: &str,
        target: &mut Cas,
        sources: &CasMap,
        merge_incomplete: bool,
    ) -> Result<MergeReport>;

    /// Name of this engine (for logging).
    fn name(&self) -> &str;
}
