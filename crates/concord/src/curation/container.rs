//! The per-segment result of a build.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;

use crate::model::{Address, AnnotatorId};

use super::classifier::SentenceState;
use super::segment::Segment;

/// The verdict for one segment and where to find it in every graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentView {
    begin: usize,
    end: usize,
    sequence_number: usize,
    state: SentenceState,
    source_addresses: BTreeMap<AnnotatorId, Address>,
    working_address: Option<Address>,
}

impl SegmentView {
    pub fn new(
        segment: &Segment,
        state: SentenceState,
        source_addresses: BTreeMap<AnnotatorId, Address>,
        working_address: Option<Address>,
    ) -> Self {
        Self {
            begin: segment.begin,
            end: segment.end,
            sequence_number: segment.sequence_number,
            state,
            source_addresses,
            working_address,
        }
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn sequence_number(&self) -> usize {
        self.sequence_number
    }

    pub fn state(&self) -> SentenceState {
        self.state
    }

    /// Sentence address of the segment in each annotator's graph.
    pub fn source_addresses(&self) -> &BTreeMap<AnnotatorId, Address> {
        &self.source_addresses
    }

    /// Sentence address of the segment in the working graph.
    pub fn working_address(&self) -> Option<Address> {
        self.working_address
    }
}

/// Segment views of a window, keyed by begin offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConsensusContainer {
    views: BTreeMap<usize, SegmentView>,
}

impl ConsensusContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, view: SegmentView) {
        self.views.insert(view.begin, view);
    }

    /// The view of the segment starting at `begin`.
    pub fn get(&self, begin: usize) -> Option<&SegmentView> {
        self.views.get(&begin)
    }

    /// Views in increasing begin order.
    pub fn iter(&self) -> impl Iterator<Item = &SegmentView> {
        self.views.values()
    }

    pub fn begins(&self) -> impl Iterator<Item = usize> + '_ {
        self.views.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn agreeing(&self) -> usize {
        self.iter().filter(|v| !v.state.is_disagree()).count()
    }

    pub fn disagreeing(&self) -> usize {
        self.iter().filter(|v| v.state.is_disagree()).count()
    }

    /// Views whose begin offset lies in `range`.
    pub fn segments_in(&self, range: Range<usize>) -> impl Iterator<Item = &SegmentView> {
        self.views.range(range).map(|(_, view)| view)
    }

    /// The segment covering `offset`.
    pub fn segment_containing(&self, offset: usize) -> Option<&SegmentView> {
        self.views
            .range(..=offset)
            .next_back()
            .map(|(_, view)| view)
            .filter(|view| offset < view.end)
    }

    /// First disagreeing segment starting after `offset`.
    pub fn next_disagreement(&self, offset: usize) -> Option<&SegmentView> {
        self.views
            .range(offset.saturating_add(1)..)
            .map(|(_, view)| view)
            .find(|view| view.state.is_disagree())
    }

    /// Last disagreeing segment starting before `offset`.
    pub fn previous_disagreement(&self, offset: usize) -> Option<&SegmentView> {
        self.views
            .range(..offset)
            .rev()
            .map(|(_, view)| view)
            .find(|view| view.state.is_disagree())
    }
}

impl<'a> IntoIterator for &'a ConsensusContainer {
    type Item = &'a SegmentView;
    type IntoIter = std::collections::btree_map::Values<'a, usize, SegmentView>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.values()
    }
}
