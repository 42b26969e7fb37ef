//! Diff engine contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{AnnotationLayer, AnnotatorId, Cas, LayerKind};

use super::result::DiffResult;

/// Graphs to compare, keyed by annotator.
pub type CasMap = BTreeMap<AnnotatorId, Cas>;

/// How links take part in the equivalence of two annotations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCompareBehavior {
    /// Link roles are part of the equivalence key; targets are not.
    #[default]
    LinkRoleAsLabel,
    /// Link target spans are part of the equivalence key; roles are not.
    LinkTargetAsLabel,
}

/// Tells the diff which layer to compare and by which features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffAdapter {
    pub layer: String,
    pub kind: LayerKind,
    pub label_features: Vec<String>,
}

impl DiffAdapter {
    pub fn new(layer: impl Into<String>, kind: LayerKind, label_features: &[&str]) -> Self {
        Self {
            layer: layer.into(),
            kind,
            label_features: label_features.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl From<&AnnotationLayer> for DiffAdapter {
    fn from(layer: &AnnotationLayer) -> Self {
        Self {
            layer: layer.name.clone(),
            kind: layer.kind,
            label_features: layer.label_features.clone(),
        }
    }
}

/// Compares the graphs of several annotators over a character range.
///
/// Implementations must be thread-safe (Send + Sync); segments are
/// independent and may be diffed concurrently.
pub trait DiffEngine: Send + Sync {
    /// Group the annotations of `sources` inside `[begin, end)` into
    /// configuration sets.
    fn diff(
        &self,
        adapters: &[DiffAdapter],
        behavior: LinkCompareBehavior,
        sources: &CasMap,
        begin: usize,
        end: usize,
    ) -> Result<DiffResult>;

    /// Name of this engine (for logging).
    fn name(&self) -> &str;
}
