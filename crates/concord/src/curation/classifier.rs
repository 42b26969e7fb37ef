//! Agreement verdict for one segment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diff::{ConfigurationSet, DiffResult};

/// Whether the annotators agree on a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentenceState {
    Agree,
    Disagree,
}

impl SentenceState {
    pub fn is_disagree(self) -> bool {
        self == SentenceState::Disagree
    }
}

impl fmt::Display for SentenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentenceState::Agree => write!(f, "AGREE"),
            SentenceState::Disagree => write!(f, "DISAGREE"),
        }
    }
}

/// Whether some configuration of `set` lacks an annotator that contributed to
/// another configuration at the same position.
pub fn is_stacked(set: &ConfigurationSet) -> bool {
    let annotators = set.cas_group_ids().len();
    set.configurations()
        .iter()
        .any(|configuration| configuration.cas_group_count() != annotators)
}

/// Classify the diff of one segment.
///
/// The checks run in order and the first match wins:
///
/// 1. no differences and nothing incomplete: `Agree`
/// 2. a differing set holds a stacked configuration: `Disagree`
/// 3. some set is incomplete: `Disagree`
/// 4. otherwise `Agree`
///
/// Step 4 means differences where every configuration is backed by every
/// contributing annotator still count as agreement.
pub fn classify_segment(diff: &DiffResult) -> SentenceState {
    let incomplete = diff.incomplete_configuration_sets();

    if !diff.has_differences() && incomplete.is_empty() {
        return SentenceState::Agree;
    }

    if diff.differing_configuration_sets().any(is_stacked) {
        return SentenceState::Disagree;
    }

    if !incomplete.is_empty() {
        return SentenceState::Disagree;
    }

    // NOTE: differing but unstacked and complete sets fall through to agreement
    SentenceState::Agree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Configuration, Position};
    use crate::model::Address;

    fn users(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_diff_agrees() {
        let diff = DiffResult::new(users(&["alice", "bob"]), Vec::new());
        assert_eq!(classify_segment(&diff), SentenceState::Agree);
    }

    #[test]
    fn test_unanimous_agrees() {
        let mut set = ConfigurationSet::new(Position::new("NE", 0, 4));
        set.add_instance("PER", "alice", Address(1));
        set.add_instance("PER", "bob", Address(2));
        let diff = DiffResult::new(users(&["alice", "bob"]), vec![set]);
        assert_eq!(classify_segment(&diff), SentenceState::Agree);
    }

    #[test]
    fn test_conflicting_labels_disagree() {
        let set = ConfigurationSet::new(Position::new("NE", 0, 4))
            .with_configuration(Configuration::new("PER").with_instance("alice", Address(1)))
            .with_configuration(Configuration::new("ORG").with_instance("bob", Address(2)));
        assert!(is_stacked(&set));
        let diff = DiffResult::new(users(&["alice", "bob"]), vec![set]);
        assert_eq!(classify_segment(&diff), SentenceState::Disagree);
    }

    #[test]
    fn test_missing_annotator_disagrees() {
        let mut set = ConfigurationSet::new(Position::new("NE", 0, 4));
        set.add_instance("PER", "alice", Address(1));
        set.add_instance("PER", "bob", Address(2));
        let diff = DiffResult::new(users(&["alice", "bob", "carol"]), vec![set]);
        assert_eq!(classify_segment(&diff), SentenceState::Disagree);
    }

    #[test]
    fn test_fully_backed_differences_agree() {
        // Both annotators put both labels on the same span
        let set = ConfigurationSet::new(Position::new("NE", 0, 4))
            .with_configuration(
                Configuration::new("PER")
                    .with_instance("alice", Address(1))
                    .with_instance("bob", Address(5)),
            )
            .with_configuration(
                Configuration::new("ORG")
                    .with_instance("alice", Address(2))
                    .with_instance("bob", Address(6)),
            );
        let diff = DiffResult::new(users(&["alice", "bob"]), vec![set]);
        assert!(diff.has_differences());
        assert!(diff.incomplete_configuration_sets().is_empty());
        assert_eq!(classify_segment(&diff), SentenceState::Agree);
    }

    #[test]
    fn test_display() {
        assert_eq!(SentenceState::Disagree.to_string(), "DISAGREE");
        assert!(SentenceState::Disagree.is_disagree());
    }
}
