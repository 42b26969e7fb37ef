//! Documents, annotator assignments and curation modes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConcordError, Result};

/// Identity of an annotator. Keys of every per-annotator map.
pub type AnnotatorId = String;

/// Pseudo-user owning the curation graph.
pub const CURATION_USER: &str = "CURATION_USER";

/// Pseudo-user owning the correction graph.
pub const CORRECTION_USER: &str = "CORRECTION_USER";

/// A source document inside a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceDocument {
    pub project: String,
    pub name: String,
}

impl SourceDocument {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.name)
    }
}

/// Lifecycle state of one annotator's work on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnnotationDocumentState {
    /// Not opened yet.
    New,
    /// Being annotated.
    InProgress,
    /// Marked as done by the annotator.
    Finished,
    /// Excluded from the project.
    Ignore,
}

impl AnnotationDocumentState {
    /// Only finished documents feed curation.
    pub fn is_finished(&self) -> bool {
        matches!(self, AnnotationDocumentState::Finished)
    }
}

/// One annotator's assignment to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub document: SourceDocument,
    pub user: AnnotatorId,
    pub state: AnnotationDocumentState,
}

impl AnnotationDocument {
    pub fn new(
        document: SourceDocument,
        user: impl Into<AnnotatorId>,
        state: AnnotationDocumentState,
    ) -> Self {
        Self {
            document,
            user: user.into(),
            state,
        }
    }
}

/// How the working graph is obtained and which sources are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Several finished annotators, merged by a curator.
    Curation,
    /// One annotator correcting pre-existing annotations.
    Correction,
    /// One annotator reviewing automatic suggestions.
    Automation,
}

impl Mode {
    /// The store holding this mode's working graph.
    pub fn target(self) -> WorkingTarget {
        match self {
            Mode::Curation => WorkingTarget::Curation,
            Mode::Correction | Mode::Automation => WorkingTarget::Correction,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Curation => write!(f, "curation"),
            Mode::Correction => write!(f, "correction"),
            Mode::Automation => write!(f, "automation"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "curation" => Ok(Mode::Curation),
            "correction" => Ok(Mode::Correction),
            "automation" => Ok(Mode::Automation),
            _ => Err(format!(
                "Unknown mode: {}. Use curation, correction, or automation.",
                s
            )),
        }
    }
}

/// Which working graph a build reads or creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkingTarget {
    /// The curator's merged graph.
    Curation,
    /// The corrector's copy of their own graph.
    Correction,
}

impl WorkingTarget {
    /// Pseudo-user owning this working graph.
    pub fn owner(self) -> &'static str {
        match self {
            WorkingTarget::Curation => CURATION_USER,
            WorkingTarget::Correction => CORRECTION_USER,
        }
    }
}

impl fmt::Display for WorkingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkingTarget::Curation => write!(f, "curation"),
            WorkingTarget::Correction => write!(f, "correction"),
        }
    }
}

/// Half-open character range `[begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    begin: usize,
    end: usize,
}

impl Window {
    pub fn new(begin: usize, end: usize) -> Result<Self> {
        if begin > end {
            return Err(ConcordError::InvalidWindow { begin, end });
        }
        Ok(Self { begin, end })
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl std::str::FromStr for Window {
    type Err = String;

    /// Parse `BEGIN:END`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (begin, end) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid window '{}': expected BEGIN:END", s))?;
        let begin: usize = begin
            .trim()
            .parse()
            .map_err(|e| format!("Invalid window begin '{}': {}", begin, e))?;
        let end: usize = end
            .trim()
            .parse()
            .map_err(|e| format!("Invalid window end '{}': {}", end, e))?;
        Window::new(begin, end).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_target() {
        assert_eq!(Mode::Curation.target(), WorkingTarget::Curation);
        assert_eq!(Mode::Correction.target(), WorkingTarget::Correction);
        assert_eq!(Mode::Automation.target(), WorkingTarget::Correction);
    }

    #[test]
    fn test_working_graph_owner() {
        assert_eq!(WorkingTarget::Curation.owner(), CURATION_USER);
        assert_eq!(WorkingTarget::Correction.owner(), CORRECTION_USER);
    }

    #[test]
    fn test_window_validation() {
        assert!(Window::new(5, 5).is_ok());
        assert!(matches!(
            Window::new(6, 5),
            Err(ConcordError::InvalidWindow { begin: 6, end: 5 })
        ));
    }

    #[test]
    fn test_window_parse() {
        let w: Window = "10:250".parse().unwrap();
        assert_eq!((w.begin(), w.end()), (10, 250));
        assert!("10".parse::<Window>().is_err());
        assert!("9:3".parse::<Window>().is_err());
    }

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&AnnotationDocumentState::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
    }
}
