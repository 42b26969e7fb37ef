//! Reference merge engine.

use std::collections::HashMap;

use tracing::debug;

use crate::diff::{CasMap, DiffAdapter, DiffResult};
use crate::error::{ConcordError, Result};
use crate::model::{Address, AnnotatorId, Cas, Link, SourceDocument};

use super::{MergeEngine, MergeReport};

/// Merge engine copying unanimous positions into the target.
///
/// A position is merged when it has exactly one configuration and that
/// configuration is complete. Incomplete single-configuration positions are
/// merged only on request. Links are remapped to the merged copies of their
/// targets and dropped when the target was not merged.
#[derive(Debug, Clone, Default)]
pub struct AgreementMerge;

impl AgreementMerge {
    pub fn new() -> Self {
        Self
    }
}

impl MergeEngine for AgreementMerge {
    fn merge(
        &self,
        diff: &DiffResult,
        adapters: &[DiffAdapter],
        document: &SourceDocument,
        curator: &str,
        target: &mut Cas,
        sources: &CasMap,
        merge_incomplete: bool,
    ) -> Result<MergeReport> {
        let mut report = MergeReport::default();

        for adapter in adapters {
            report.removed += target.clear_layer(&adapter.layer);
        }

        // (annotator, source address) -> merged address
        let mut merged: HashMap<(AnnotatorId, Address), Address> = HashMap::new();
        let mut pending_links: Vec<(Address, AnnotatorId, Vec<Link>)> = Vec::new();

        for set in diff.configuration_sets() {
            if set.is_differing() {
                report.skipped += 1;
                continue;
            }
            if !merge_incomplete && !set.is_complete(diff.cas_group_ids()) {
                report.skipped += 1;
                continue;
            }

            let Some(configuration) = set.configurations().first() else {
                continue;
            };
            let Some((user, address)) = configuration.representative() else {
                continue;
            };

            let source = sources
                .get(user)
                .and_then(|cas| cas.annotation(address))
                .ok_or_else(|| ConcordError::MergeEngine {
                    document: document.to_string(),
                    stage: format!("merge into {}", curator),
                    message: format!(
                        "annotation {} of '{}' at {} is not in the source graphs",
                        address,
                        user,
                        set.position()
                    ),
                })?;

            let copy = target.copy_annotation(source);
            report.merged += 1;

            for annotator in configuration.cas_group_ids() {
                for addr in configuration.addresses(annotator) {
                    merged.insert((annotator.clone(), *addr), copy);
                }
            }
            if !source.links.is_empty() {
                pending_links.push((copy, user.clone(), source.links.clone()));
            }
        }

        for (copy, user, links) in pending_links {
            for link in links {
                match merged.get(&(user.clone(), link.target)) {
                    Some(target_addr) => {
                        target.add_link(copy, link.role, *target_addr);
                    }
                    None => report.dropped_links += 1,
                }
            }
        }

        debug!(
            document = %document,
            curator,
            merged = report.merged,
            skipped = report.skipped,
            removed = report.removed,
            "Merge completed"
        );

        Ok(report)
    }

    fn name(&self) -> &str {
        "agreement-merge"
    }
}
