//! Diff output: configuration sets grouped by anchor position.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::model::{Address, AnnotatorId};

/// Logical anchor of a configuration set: a layer and a span.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub begin: usize,
    pub end: usize,
    pub layer: String,
}

impl Position {
    pub fn new(layer: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            begin,
            end,
            layer: layer.into(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}, {})", self.layer, self.begin, self.end)
    }
}

/// Equivalent annotation instances at one position.
///
/// Maps each contributing annotator to the addresses of its instances in that
/// annotator's own graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    key: String,
    instances: BTreeMap<AnnotatorId, Vec<Address>>,
}

impl Configuration {
    /// Create an empty configuration for an equivalence key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            instances: BTreeMap::new(),
        }
    }

    /// Add an instance contributed by `annotator`.
    pub fn with_instance(mut self, annotator: impl Into<AnnotatorId>, address: Address) -> Self {
        self.add(annotator, address);
        self
    }

    pub fn add(&mut self, annotator: impl Into<AnnotatorId>, address: Address) {
        self.instances.entry(annotator.into()).or_default().push(address);
    }

    /// The equivalence key shared by all instances.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Annotators contributing to this configuration.
    pub fn cas_group_ids(&self) -> impl Iterator<Item = &AnnotatorId> {
        self.instances.keys()
    }

    /// Number of contributing annotators.
    pub fn cas_group_count(&self) -> usize {
        self.instances.len()
    }

    /// Addresses contributed by one annotator.
    pub fn addresses(&self, annotator: &str) -> &[Address] {
        self.instances.get(annotator).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The instance of the first contributing annotator.
    pub fn representative(&self) -> Option<(&AnnotatorId, Address)> {
        self.instances
            .iter()
            .find_map(|(user, addrs)| addrs.first().map(|a| (user, *a)))
    }

    /// Whether some annotator contributed more than one instance.
    pub fn has_duplicates(&self) -> bool {
        self.instances.values().any(|addrs| addrs.len() > 1)
    }
}

/// All configurations found at one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationSet {
    position: Position,
    configurations: Vec<Configuration>,
}

impl ConfigurationSet {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            configurations: Vec::new(),
        }
    }

    /// Add a configuration.
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// Record an instance under `key`, creating the configuration on first use.
    pub fn add_instance(&mut self, key: &str, annotator: &str, address: Address) {
        match self.configurations.iter_mut().find(|c| c.key == key) {
            Some(configuration) => configuration.add(annotator, address),
            None => self
                .configurations
                .push(Configuration::new(key).with_instance(annotator, address)),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn configurations(&self) -> &[Configuration] {
        &self.configurations
    }

    /// Distinct annotators contributing to any configuration.
    pub fn cas_group_ids(&self) -> BTreeSet<&AnnotatorId> {
        self.configurations
            .iter()
            .flat_map(Configuration::cas_group_ids)
            .collect()
    }

    /// Whether the annotators disagree at this position.
    pub fn is_differing(&self) -> bool {
        self.configurations.len() > 1
    }

    /// Every expected annotator contributed, and none twice to one configuration.
    pub fn is_complete(&self, expected: &BTreeSet<AnnotatorId>) -> bool {
        let contributors = self.cas_group_ids();
        contributors.len() == expected.len()
            && expected.iter().all(|user| contributors.contains(user))
            && !self.configurations.iter().any(Configuration::has_duplicates)
    }
}

/// Result of comparing several graphs over one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    cas_group_ids: BTreeSet<AnnotatorId>,
    sets: BTreeMap<Position, ConfigurationSet>,
}

impl DiffResult {
    /// Build a result from the compared annotators and the sets found.
    pub fn new(
        cas_group_ids: impl IntoIterator<Item = AnnotatorId>,
        sets: impl IntoIterator<Item = ConfigurationSet>,
    ) -> Self {
        Self {
            cas_group_ids: cas_group_ids.into_iter().collect(),
            sets: sets
                .into_iter()
                .map(|set| (set.position.clone(), set))
                .collect(),
        }
    }

    /// The annotators that were compared.
    pub fn cas_group_ids(&self) -> &BTreeSet<AnnotatorId> {
        &self.cas_group_ids
    }

    /// All configuration sets ordered by position.
    pub fn configuration_sets(&self) -> impl Iterator<Item = &ConfigurationSet> {
        self.sets.values()
    }

    /// Configuration set at a position.
    pub fn configuration_set(&self, position: &Position) -> Option<&ConfigurationSet> {
        self.sets.get(position)
    }

    /// Whether any position has competing configurations.
    pub fn has_differences(&self) -> bool {
        self.sets.values().any(ConfigurationSet::is_differing)
    }

    /// Sets with competing configurations, ordered by position.
    pub fn differing_configuration_sets(&self) -> impl Iterator<Item = &ConfigurationSet> {
        self.sets.values().filter(|set| set.is_differing())
    }

    /// Sets missing an annotator or holding duplicate instances.
    pub fn incomplete_configuration_sets(&self) -> Vec<&ConfigurationSet> {
        self.sets
            .values()
            .filter(|set| !set.is_complete(&self.cas_group_ids))
            .collect()
    }

    /// Whether no annotation was found at all.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
