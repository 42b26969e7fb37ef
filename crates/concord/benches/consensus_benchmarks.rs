//! Consensus build performance benchmarks.
//!
//! Measures segment classification over documents with many sentences and
//! annotators, and the one-time creation of a curation graph.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use concord::{
    AnnotationDocument, AnnotationDocumentState, AnnotationLayer, BuildState, Cas, Collaborators,
    ConsensusBuilder, MemoryRepository, Mode, SourceDocument, StaticSchema, Window,
};

const SENTENCE: &str = "Alice met Bob in Paris. ";
const LABELS: [&str; 3] = ["PER", "ORG", "LOC"];

fn document() -> SourceDocument {
    SourceDocument::new("bench", "doc.txt")
}

/// Graph with `sentences` sentences, each carrying three entities. Every
/// seventh sentence gets an annotator-specific label so some segments disagree.
fn generate_cas(sentences: usize, annotator: usize) -> Cas {
    let text = SENTENCE.repeat(sentences);
    let spans: Vec<(usize, usize)> = (0..sentences)
        .map(|n| (n * SENTENCE.len(), n * SENTENCE.len() + SENTENCE.len() - 1))
        .collect();
    let mut cas = Cas::with_sentences(text, &spans);

    for n in 0..sentences {
        let offset = n * SENTENCE.len();
        cas.add_labeled("NamedEntity", offset, offset + 5, "value", "PER");
        cas.add_labeled("NamedEntity", offset + 10, offset + 13, "value", "PER");
        let place = if n % 7 == 0 { LABELS[annotator % LABELS.len()] } else { "LOC" };
        cas.add_labeled("NamedEntity", offset + 17, offset + 22, "value", place);
    }
    cas
}

fn repository(sentences: usize, annotators: usize) -> Arc<MemoryRepository> {
    let repo = Arc::new(MemoryRepository::new());
    for annotator in 0..annotators {
        repo.add_annotation_document(
            AnnotationDocument::new(
                document(),
                format!("annotator{}", annotator),
                AnnotationDocumentState::Finished,
            ),
            generate_cas(sentences, annotator),
        );
    }
    repo
}

fn state(length: usize) -> BuildState {
    BuildState::new(
        document(),
        Mode::Curation,
        Window::new(0, length).unwrap(),
        "curator",
    )
    .with_layers(vec![AnnotationLayer::span("NamedEntity", &["value"])])
}

/// Benchmark builds over an existing curation graph.
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for sentences in [10usize, 100, 1000].iter() {
        let repo = repository(*sentences, 3);
        let builder = ConsensusBuilder::new(Collaborators::with_repository(
            repo,
            StaticSchema::new(),
        ));
        let length = sentences * SENTENCE.len();
        // Create the curation graph outside the measurement
        builder.build(&mut state(length)).unwrap();

        group.throughput(Throughput::Elements(*sentences as u64));
        group.bench_with_input(BenchmarkId::new("sentences", sentences), &length, |b, length| {
            b.iter(|| black_box(builder.build(&mut state(*length)).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark how the number of annotators affects a build.
fn bench_annotator_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("annotator_scaling");
    let sentences = 200;
    let length = sentences * SENTENCE.len();

    for annotators in [2usize, 5, 10].iter() {
        let repo = repository(sentences, *annotators);
        let builder = ConsensusBuilder::new(Collaborators::with_repository(
            repo,
            StaticSchema::new(),
        ));
        builder.build(&mut state(length)).unwrap();

        group.bench_with_input(
            BenchmarkId::new("annotators", annotators),
            annotators,
            |b, _| b.iter(|| black_box(builder.build(&mut state(length)).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark creation of the curation graph.
fn bench_curation_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("curation_create");
    group.sample_size(20);

    for sentences in [100usize, 1000].iter() {
        let length = sentences * SENTENCE.len();
        group.bench_with_input(BenchmarkId::new("sentences", sentences), sentences, |b, n| {
            b.iter_with_setup(
                || {
                    ConsensusBuilder::new(Collaborators::with_repository(
                        repository(*n, 3),
                        StaticSchema::new(),
                    ))
                },
                |builder| black_box(builder.acquire_working_cas(&mut state(length)).unwrap()),
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_annotator_scaling,
    bench_curation_create
);
criterion_main!(benches);
