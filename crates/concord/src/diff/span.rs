//! Reference diff engine comparing annotations by layer and span.

use std::collections::BTreeMap;

use crate::error::{ConcordError, Result};
use crate::model::{Annotation, Cas, LayerKind};

use super::engine::{CasMap, DiffAdapter, DiffEngine, LinkCompareBehavior};
use super::result::{ConfigurationSet, DiffResult, Position};

/// Diff engine anchoring annotations at `(layer, begin, end)`.
///
/// Two annotations at the same position are equivalent when their label
/// feature values match and their links match under the requested
/// [`LinkCompareBehavior`]. Only annotations lying fully inside the requested
/// range are compared. Chain adapters are skipped: a chain has no single span
/// to anchor at.
#[derive(Debug, Clone, Default)]
pub struct SpanDiff;

impl SpanDiff {
    pub fn new() -> Self {
        Self
    }
}

/// Equivalence key of an annotation.
fn equivalence_key(
    annotation: &Annotation,
    adapter: &DiffAdapter,
    behavior: LinkCompareBehavior,
    cas: &Cas,
) -> String {
    let mut parts: Vec<String> = adapter
        .label_features
        .iter()
        .map(|name| format!("{}={}", name, annotation.feature(name).unwrap_or("")))
        .collect();

    let mut links: Vec<String> = annotation
        .links
        .iter()
        .map(|link| match behavior {
            LinkCompareBehavior::LinkRoleAsLabel => format!("role:{}", link.role),
            LinkCompareBehavior::LinkTargetAsLabel => match cas.annotation(link.target) {
                Some(target) => format!("target:{}-{}", target.begin, target.end),
                None => "target:?".to_string(),
            },
        })
        .collect();
    links.sort();
    parts.extend(links);

    parts.join("|")
}

impl DiffEngine for SpanDiff {
    fn diff(
        &self,
        adapters: &[DiffAdapter],
        behavior: LinkCompareBehavior,
        sources: &CasMap,
        begin: usize,
        end: usize,
    ) -> Result<DiffResult> {
        if begin > end {
            return Err(ConcordError::InvalidWindow { begin, end });
        }

        let mut sets: BTreeMap<Position, ConfigurationSet> = BTreeMap::new();

        let anchored: Vec<&DiffAdapter> = adapters
            .iter()
            .filter(|adapter| adapter.kind != LayerKind::Chain)
            .collect();

        for (user, cas) in sources {
            for adapter in &anchored {
                for annotation in cas.covered_annotations(&adapter.layer, begin, end) {
                    let position =
                        Position::new(&adapter.layer, annotation.begin, annotation.end);
                    let key = equivalence_key(annotation, adapter, behavior, cas);
                    sets.entry(position.clone())
                        .or_insert_with(|| ConfigurationSet::new(position))
                        .add_instance(&key, user, annotation.address);
                }
            }
        }

        Ok(DiffResult::new(sources.keys().cloned(), sets.into_values()))
    }

    fn name(&self) -> &str {
        "span-diff"
    }
}
