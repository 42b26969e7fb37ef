//! Annotation layer definitions.

use serde::{Deserialize, Serialize};

/// Name of the token layer. Tokens are never compared.
pub const TOKEN_LAYER: &str = "Token";

/// Structural kind of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Annotations over a character span.
    Span,
    /// Annotations connecting two span annotations through links.
    Relation,
    /// Coreference-style chains. Not supported by the diff.
    Chain,
}

/// A layer as configured in the project schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationLayer {
    pub name: String,
    pub kind: LayerKind,
    /// Features whose values decide whether two annotations are equivalent.
    #[serde(default)]
    pub label_features: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AnnotationLayer {
    /// A span layer with the given label features.
    pub fn span(name: impl Into<String>, label_features: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Span,
            label_features: label_features.iter().map(|f| f.to_string()).collect(),
            enabled: true,
        }
    }

    /// A relation layer with the given label features.
    pub fn relation(name: impl Into<String>, label_features: &[&str]) -> Self {
        Self {
            kind: LayerKind::Relation,
            ..Self::span(name, label_features)
        }
    }

    /// A chain layer.
    pub fn chain(name: impl Into<String>) -> Self {
        Self {
            kind: LayerKind::Chain,
            ..Self::span(name, &[])
        }
    }

    /// Mark the layer as disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether annotations of this layer take part in diffing.
    pub fn is_diffable(&self) -> bool {
        self.enabled && self.kind != LayerKind::Chain && self.name != TOKEN_LAYER
    }
}
