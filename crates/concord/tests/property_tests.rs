//! Property-based tests for segment classification and window coverage.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p concord --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p concord --test property_tests
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use concord::curation::{classify_segment, is_stacked, SentenceState};
use concord::diff::{ConfigurationSet, DiffResult, Position};
use concord::model::Address;
use concord::{
    AnnotationDocument, AnnotationDocumentState, AnnotationLayer, BuildState, Cas, Collaborators,
    ConsensusBuilder, MemoryRepository, Mode, SourceDocument, StaticSchema, Window,
};

const ANNOTATORS: [&str; 3] = ["alice", "bob", "carol"];
const LABELS: [&str; 3] = ["PER", "ORG", "LOC"];

// =============================================================================
// Test Strategies
// =============================================================================

/// One instance: (label index, annotator index).
fn instance() -> impl Strategy<Value = (usize, usize)> {
    (0..LABELS.len(), 0..ANNOTATORS.len())
}

/// Number of expected annotators, and the instances at up to four positions.
type RawDiff = (usize, Vec<Vec<(usize, usize)>>);

fn raw_diff() -> impl Strategy<Value = RawDiff> {
    (
        1..=ANNOTATORS.len(),
        prop::collection::vec(prop::collection::vec(instance(), 1..5), 0..4),
    )
}

fn position(n: usize) -> Position {
    Position::new("NE", n * 10, n * 10 + 5)
}

fn to_diff_result((expected, positions): &RawDiff) -> DiffResult {
    let mut address = 0u32;
    let sets: Vec<ConfigurationSet> = positions
        .iter()
        .enumerate()
        .map(|(n, instances)| {
            let mut set = ConfigurationSet::new(position(n));
            for &(label, annotator) in instances {
                address += 1;
                set.add_instance(LABELS[label], ANNOTATORS[annotator], Address(address));
            }
            set
        })
        .collect();
    let expected = ANNOTATORS[..*expected].iter().map(|a| a.to_string());
    DiffResult::new(expected, sets)
}

/// Configuration sets at up to four positions, each with up to five instances.
fn diff_result() -> impl Strategy<Value = DiffResult> {
    raw_diff().prop_map(|raw| to_diff_result(&raw))
}

/// Verdict worked out directly from the generated instances.
fn expected_verdict((expected, positions): &RawDiff) -> SentenceState {
    let required: BTreeSet<usize> = (0..*expected).collect();

    let disagrees = positions.iter().any(|instances| {
        let annotators: BTreeSet<usize> = instances.iter().map(|&(_, a)| a).collect();
        let labels: BTreeSet<usize> = instances.iter().map(|&(l, _)| l).collect();

        let stacked = labels.len() > 1
            && labels.iter().any(|&label| {
                let backers: BTreeSet<usize> = instances
                    .iter()
                    .filter(|&&(l, _)| l == label)
                    .map(|&(_, a)| a)
                    .collect();
                backers.len() != annotators.len()
            });

        let distinct: BTreeSet<(usize, usize)> = instances.iter().copied().collect();
        let duplicated = distinct.len() != instances.len();
        let incomplete = annotators != required || duplicated;

        stacked || incomplete
    });

    if disagrees {
        SentenceState::Disagree
    } else {
        SentenceState::Agree
    }
}

/// Sentences as (length, gap before) pairs.
fn sentence_layout() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((1usize..12, 0usize..3), 1..15)
}

fn layout_to_spans(layout: &[(usize, usize)]) -> (String, Vec<(usize, usize)>) {
    let mut spans = Vec::new();
    let mut offset = 0;
    for &(length, gap) in layout {
        offset += gap;
        spans.push((offset, offset + length));
        offset += length;
    }
    ("x".repeat(offset), spans)
}

// =============================================================================
// Classification Properties
// =============================================================================

proptest! {
    #[test]
    fn classification_is_deterministic(diff in diff_result()) {
        prop_assert_eq!(classify_segment(&diff), classify_segment(&diff));
    }

    #[test]
    fn disagreement_iff_stacked_or_incomplete(raw in raw_diff()) {
        let diff = to_diff_result(&raw);
        for (n, instances) in raw.1.iter().enumerate() {
            let set = diff.configuration_set(&position(n)).unwrap();
            let labels: BTreeSet<usize> = instances.iter().map(|&(l, _)| l).collect();
            prop_assert_eq!(set.configurations().len(), labels.len());
        }
        prop_assert_eq!(classify_segment(&diff), expected_verdict(&raw));
    }

    #[test]
    fn stacking_takes_precedence(diff in diff_result()) {
        if diff.differing_configuration_sets().any(is_stacked) {
            prop_assert_eq!(classify_segment(&diff), SentenceState::Disagree);
        }
    }

    #[test]
    fn incompleteness_always_disagrees(diff in diff_result()) {
        if !diff.incomplete_configuration_sets().is_empty() {
            prop_assert_eq!(classify_segment(&diff), SentenceState::Disagree);
        }
    }
}

// =============================================================================
// Coverage Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn container_covers_window_exactly(
        layout in sentence_layout(),
        a in 0usize..200,
        b in 0usize..200,
    ) {
        let (text, spans) = layout_to_spans(&layout);
        let length = text.len();
        let (begin, end) = (a.min(b).min(length), a.max(b).min(length));

        let document = SourceDocument::new("p", "d");
        let repo = Arc::new(MemoryRepository::new());
        for user in ["alice", "bob"] {
            repo.add_annotation_document(
                AnnotationDocument::new(document.clone(), user, AnnotationDocumentState::Finished),
                Cas::with_sentences(text.clone(), &spans),
            );
        }
        let builder = ConsensusBuilder::new(Collaborators::with_repository(repo, StaticSchema::new()));

        let mut state = BuildState::new(
            document,
            Mode::Curation,
            Window::new(begin, end).unwrap(),
            "curator",
        )
        .with_layers(vec![AnnotationLayer::span("NamedEntity", &["value"])]);
        let container = builder.build(&mut state).unwrap();

        let expected: Vec<usize> = spans
            .iter()
            .filter(|(b, e)| *b >= begin && *e <= end)
            .map(|(b, _)| *b)
            .collect();
        let actual: Vec<usize> = container.begins().collect();
        prop_assert_eq!(actual, expected);

        for view in container.iter() {
            prop_assert_eq!(view.source_addresses().len(), 2);
            prop_assert_eq!(view.state(), SentenceState::Agree);
        }
    }
}
