//! In-memory annotation graph for one document.
//!
//! A [`Cas`] holds the document text, its sentence segmentation and the layer
//! annotations of one annotator (or of the curator). Every sentence and
//! annotation carries an [`Address`] that is unique within its graph. Addresses
//! of different graphs are unrelated even when the spans coincide.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Schema version written by this crate. Graphs with an older version are
/// migrated by [`Cas::upgrade`].
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Address of a sentence or annotation inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u32);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sentence-level unit of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub address: Address,
    pub begin: usize,
    pub end: usize,
}

/// A typed edge from one annotation to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Role of the link target (e.g. "agent", "patient").
    pub role: String,
    /// Address of the target annotation in the same graph.
    pub target: Address,
}

/// A layer annotation over a character span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub address: Address,
    /// Name of the layer this annotation belongs to.
    pub layer: String,
    pub begin: usize,
    pub end: usize,
    /// Feature values in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub features: IndexMap<String, String>,
    /// Outgoing links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Annotation {
    /// Get a feature value.
    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }
}

/// Annotation graph of one document.
///
/// Deserialization rejects graphs that reuse an address and moves
/// `next_address` past the largest address in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCas")]
pub struct Cas {
    text: String,
    #[serde(default)]
    schema_version: u32,
    next_address: u32,
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

/// Sentences sort by begin, longer sentences first at a shared begin.
fn sentence_order(sentence: &Sentence) -> (usize, Reverse<usize>) {
    (sentence.begin, Reverse(sentence.end))
}

/// Serialized form of a [`Cas`] before address checks.
#[derive(Deserialize)]
struct RawCas {
    text: String,
    #[serde(default)]
    schema_version: u32,
    next_address: u32,
    #[serde(default)]
    sentences: Vec<Sentence>,
    #[serde(default)]
    annotations: Vec<Annotation>,
}

impl TryFrom<RawCas> for Cas {
    type Error = String;

    fn try_from(mut raw: RawCas) -> Result<Self, Self::Error> {
        raw.sentences.sort_by_key(sentence_order);

        let addresses = raw
            .sentences
            .iter()
            .map(|s| s.address)
            .chain(raw.annotations.iter().map(|a| a.address));

        let mut seen = HashSet::new();
        let mut highest = 0u32;
        for address in addresses {
            if !seen.insert(address) {
                return Err(format!("duplicate address {}", address));
            }
            highest = highest.max(address.0);
        }

        let next_address = match highest.checked_add(1) {
            Some(floor) => raw.next_address.max(floor),
            None => return Err(format!("address {} leaves no room to allocate", highest)),
        };

        Ok(Self {
            text: raw.text,
            schema_version: raw.schema_version,
            next_address,
            sentences: raw.sentences,
            annotations: raw.annotations,
        })
    }
}

impl Cas {
    /// Create an empty graph over the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            schema_version: CURRENT_SCHEMA_VERSION,
            next_address: 1,
            sentences: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Create a graph and segment it at the given sentence spans.
    pub fn with_sentences(text: impl Into<String>, spans: &[(usize, usize)]) -> Self {
        let mut cas = Self::new(text);
        for &(begin, end) in spans {
            cas.add_sentence(begin, end);
        }
        cas
    }

    /// The document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the document in characters.
    pub fn document_length(&self) -> usize {
        self.text.chars().count()
    }

    /// Schema version this graph was written with.
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn allocate(&mut self) -> Address {
        let address = Address(self.next_address);
        self.next_address += 1;
        address
    }

    /// Add a sentence, keeping sentences in document order.
    pub fn add_sentence(&mut self, begin: usize, end: usize) -> Address {
        let address = self.allocate();
        let sentence = Sentence { address, begin, end };
        let key = sentence_order(&sentence);
        let idx = self.sentences.partition_point(|s| sentence_order(s) <= key);
        self.sentences.insert(idx, sentence);
        address
    }

    /// All sentences in document order: by begin offset, then longest first.
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Sentences lying fully inside `[begin, end)`.
    pub fn covered_sentences(&self, begin: usize, end: usize) -> impl Iterator<Item = &Sentence> {
        self.sentences
            .iter()
            .filter(move |s| s.begin >= begin && s.end <= end)
    }

    /// The last sentence in document order starting exactly at `begin`.
    pub fn sentence_at(&self, begin: usize) -> Option<&Sentence> {
        self.sentences.iter().rev().find(|s| s.begin == begin)
    }

    /// 1-based number of the first sentence starting at or after `offset`.
    pub fn sentence_number(&self, offset: usize) -> usize {
        self.sentences.partition_point(|s| s.begin < offset) + 1
    }

    /// Add an annotation without features.
    pub fn add_annotation(&mut self, layer: impl Into<String>, begin: usize, end: usize) -> Address {
        let address = self.allocate();
        self.annotations.push(Annotation {
            address,
            layer: layer.into(),
            begin,
            end,
            features: IndexMap::new(),
            links: Vec::new(),
        });
        address
    }

    /// Add an annotation with a single label feature.
    pub fn add_labeled(
        &mut self,
        layer: impl Into<String>,
        begin: usize,
        end: usize,
        feature: impl Into<String>,
        value: impl Into<String>,
    ) -> Address {
        let address = self.add_annotation(layer, begin, end);
        self.set_feature(address, feature, value);
        address
    }

    /// Set a feature on an annotation. Returns false if the address is unknown.
    pub fn set_feature(
        &mut self,
        address: Address,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        match self.annotation_mut(address) {
            Some(annotation) => {
                annotation.features.insert(name.into(), value.into());
                true
            }
            None => false,
        }
    }

    /// Add a link from `source` to `target`. Returns false if `source` is unknown.
    pub fn add_link(&mut self, source: Address, role: impl Into<String>, target: Address) -> bool {
        match self.annotation_mut(source) {
            Some(annotation) => {
                annotation.links.push(Link {
                    role: role.into(),
                    target,
                });
                true
            }
            None => false,
        }
    }

    /// All layer annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Look up an annotation by address.
    pub fn annotation(&self, address: Address) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.address == address)
    }

    fn annotation_mut(&mut self, address: Address) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.address == address)
    }

    /// Annotations of `layer` lying fully inside `[begin, end)`.
    pub fn covered_annotations<'a>(
        &'a self,
        layer: &'a str,
        begin: usize,
        end: usize,
    ) -> impl Iterator<Item = &'a Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.layer == layer && a.begin >= begin && a.end <= end)
    }

    /// First annotation of `layer` with exactly the given span.
    pub fn find_annotation(&self, layer: &str, begin: usize, end: usize) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.layer == layer && a.begin == begin && a.end == end)
    }

    /// Remove every annotation of `layer`. Returns the number removed.
    pub fn clear_layer(&mut self, layer: &str) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.layer != layer);
        before - self.annotations.len()
    }

    /// Copy an annotation from another graph under a fresh address.
    ///
    /// Links are not copied because their targets are addresses of the other
    /// graph; callers remap them with [`Cas::add_link`].
    pub fn copy_annotation(&mut self, source: &Annotation) -> Address {
        let address = self.allocate();
        self.annotations.push(Annotation {
            address,
            layer: source.layer.clone(),
            begin: source.begin,
            end: source.end,
            features: source.features.clone(),
            links: Vec::new(),
        });
        address
    }

    /// Migrate the graph to [`CURRENT_SCHEMA_VERSION`].
    ///
    /// Addresses are compacted and renumbered, sentences first, so any address
    /// held outside the graph is invalid afterwards. Links are remapped.
    /// Returns true if anything changed.
    pub fn upgrade(&mut self) -> bool {
        let mut mapping: HashMap<Address, Address> = HashMap::new();
        let mut next = 1u32;

        for sentence in &mut self.sentences {
            let new = Address(next);
            next += 1;
            mapping.insert(sentence.address, new);
            sentence.address = new;
        }
        for annotation in &mut self.annotations {
            let new = Address(next);
            next += 1;
            mapping.insert(annotation.address, new);
            annotation.address = new;
        }
        for annotation in &mut self.annotations {
            annotation
                .links
                .retain(|link| mapping.contains_key(&link.target));
            for link in &mut annotation.links {
                link.target = mapping[&link.target];
            }
        }

        let renumbered = mapping.iter().any(|(old, new)| old != new);
        let changed = renumbered
            || self.schema_version != CURRENT_SCHEMA_VERSION
            || self.next_address != next;

        self.next_address = next;
        self.schema_version = CURRENT_SCHEMA_VERSION;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Cas {
        let mut cas = Cas::with_sentences(
            "Alice met Bob. Bob left early. Then it rained.",
            &[(15, 30), (0, 14), (31, 46)],
        );
        cas.add_labeled("NamedEntity", 0, 5, "value", "PER");
        cas.add_labeled("NamedEntity", 10, 13, "value", "PER");
        cas
    }

    #[test]
    fn test_sentences_are_ordered() {
        let cas = sample();
        let begins: Vec<usize> = cas.sentences().iter().map(|s| s.begin).collect();
        assert_eq!(begins, vec![0, 15, 31]);
    }

    #[test]
    fn test_covered_sentences() {
        let cas = sample();
        let covered: Vec<usize> = cas.covered_sentences(0, 31).map(|s| s.begin).collect();
        assert_eq!(covered, vec![0, 15]);

        // A sentence crossing the window end is not covered
        let covered: Vec<usize> = cas.covered_sentences(0, 20).map(|s| s.begin).collect();
        assert_eq!(covered, vec![0]);
    }

    #[test]
    fn test_sentence_number() {
        let cas = sample();
        assert_eq!(cas.sentence_number(0), 1);
        assert_eq!(cas.sentence_number(15), 2);
        assert_eq!(cas.sentence_number(16), 3);
    }

    #[test]
    fn test_shared_begin_orders_longest_first() {
        let mut cas = Cas::with_sentences("One. Two.", &[(0, 4)]);
        let long = cas.add_sentence(0, 9);
        let spans: Vec<(usize, usize)> = cas.sentences().iter().map(|s| (s.begin, s.end)).collect();
        assert_eq!(spans, vec![(0, 9), (0, 4)]);
        assert_ne!(cas.sentence_at(0).unwrap().address, long);
        assert_eq!(cas.sentence_at(0).unwrap().end, 4);
    }

    #[test]
    fn test_document_length_counts_chars() {
        let cas = Cas::new("Grüße.");
        assert_eq!(cas.document_length(), 6);
    }

    #[test]
    fn test_clear_layer() {
        let mut cas = sample();
        cas.add_annotation("POS", 0, 5);
        assert_eq!(cas.clear_layer("NamedEntity"), 2);
        assert_eq!(cas.annotations().len(), 1);
    }

    #[test]
    fn test_upgrade_renumbers_and_remaps_links() {
        let mut cas = Cas::new("a b c");
        cas.add_sentence(0, 5);
        let a = cas.add_annotation("Span", 0, 1);
        let b = cas.add_annotation("Span", 2, 3);
        cas.add_link(a, "arg", b);

        // Leave a hole in the address space
        let c = cas.add_annotation("Other", 4, 5);
        cas.clear_layer("Other");
        assert_eq!(cas.annotation(c), None);

        let hole = cas.add_annotation("Span", 4, 5);
        assert!(cas.upgrade());
        assert_eq!(cas.schema_version(), CURRENT_SCHEMA_VERSION);

        let first = cas.find_annotation("Span", 0, 1).unwrap();
        let second = cas.find_annotation("Span", 2, 3).unwrap();
        assert_eq!(first.links[0].target, second.address);

        let last = cas.find_annotation("Span", 4, 5).unwrap();
        assert_ne!(last.address, hole);

        // A second upgrade has nothing left to do
        assert!(!cas.upgrade());
    }

    #[test]
    fn test_json_roundtrip_keeps_addresses() {
        let cas = sample();
        let json = serde_json::to_string(&cas).unwrap();
        let back: Cas = serde_json::from_str(&json).unwrap();
        assert_eq!(cas, back);
    }

    #[test]
    fn test_load_moves_next_address_past_used() {
        let json = r#"{
            "text": "Alice met Bob.",
            "schema_version": 2,
            "next_address": 1,
            "sentences": [{"address": 3, "begin": 0, "end": 14}],
            "annotations": [
                {"address": 1, "layer": "POS", "begin": 0, "end": 5},
                {"address": 2, "layer": "NamedEntity", "begin": 0, "end": 5}
            ]
        }"#;
        let mut cas: Cas = serde_json::from_str(json).unwrap();

        let source = cas.annotation(Address(2)).unwrap().clone();
        let copied = cas.copy_annotation(&source);
        assert_eq!(copied, Address(4));

        let mut addresses: Vec<u32> = cas
            .sentences()
            .iter()
            .map(|s| s.address.0)
            .chain(cas.annotations().iter().map(|a| a.address.0))
            .collect();
        addresses.sort_unstable();
        addresses.dedup();
        assert_eq!(addresses.len(), 4);
    }

    #[test]
    fn test_load_rejects_duplicate_addresses() {
        let json = r#"{
            "text": "Alice met Bob.",
            "next_address": 9,
            "sentences": [{"address": 1, "begin": 0, "end": 14}],
            "annotations": [{"address": 1, "layer": "POS", "begin": 0, "end": 5}]
        }"#;
        let err = serde_json::from_str::<Cas>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate address #1"));
    }
}
