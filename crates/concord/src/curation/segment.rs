//! Splitting a window into sentence segments and locating each segment in
//! every graph.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diff::CasMap;
use crate::error::{ConcordError, Result};
use crate::model::{Address, AnnotatorId, Cas, SourceDocument, Window};

/// One sentence-sized unit of comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub begin: usize,
    pub end: usize,
    /// 1-based number of the sentence in the document.
    pub sequence_number: usize,
}

/// Segments of a window with the sentence address of each segment in every
/// source graph and in the working graph.
///
/// Each graph allocates its own addresses, so the same sentence has a
/// different address in every graph.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex {
    segments: BTreeMap<usize, Segment>,
    source_addresses: BTreeMap<AnnotatorId, BTreeMap<usize, Address>>,
    working_addresses: BTreeMap<usize, Address>,
}

impl SegmentIndex {
    /// Index the sentences of `reference` lying fully inside `window`.
    ///
    /// Sentences sharing a begin offset collapse into the last one in document
    /// order, which keeps its own sequence number. Fails
    /// with `ConcordError::Segmentation` if a source has no sentence at some
    /// segment begin.
    pub fn build(
        document: &SourceDocument,
        reference: &Cas,
        window: Window,
        sources: &CasMap,
        working: &Cas,
    ) -> Result<Self> {
        let mut segments = BTreeMap::new();
        let mut sequence_number = reference.sentence_number(window.begin());
        for sentence in reference.covered_sentences(window.begin(), window.end()) {
            segments.insert(
                sentence.begin,
                Segment {
                    begin: sentence.begin,
                    end: sentence.end,
                    sequence_number,
                },
            );
            sequence_number += 1;
        }

        let mut source_addresses = BTreeMap::new();
        for (annotator, cas) in sources {
            let mut addresses = BTreeMap::new();
            for &begin in segments.keys() {
                let sentence = cas.sentence_at(begin).ok_or_else(|| ConcordError::Segmentation {
                    document: document.to_string(),
                    annotator: annotator.clone(),
                    begin,
                })?;
                addresses.insert(begin, sentence.address);
            }
            source_addresses.insert(annotator.clone(), addresses);
        }

        let working_addresses = segments
            .keys()
            .filter_map(|&begin| working.sentence_at(begin).map(|s| (begin, s.address)))
            .collect();

        Ok(Self {
            segments,
            source_addresses,
            working_addresses,
        })
    }

    /// Segments in increasing begin order.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The sentence address of every source at the segment starting at `begin`.
    pub fn source_addresses(&self, begin: usize) -> BTreeMap<AnnotatorId, Address> {
        self.source_addresses
            .iter()
            .filter_map(|(annotator, addresses)| {
                addresses
                    .get(&begin)
                    .map(|address| (annotator.clone(), *address))
            })
            .collect()
    }

    /// The sentence address in the working graph, if it has one there.
    pub fn working_address(&self, begin: usize) -> Option<Address> {
        self.working_addresses.get(&begin).copied()
    }
}
