//! Schema service backed by a fixed codebook definition.

use crate::diff::DiffAdapter;
use crate::error::Result;
use crate::model::{AnnotationLayer, SourceDocument};

use super::SchemaService;

/// Schema service deriving adapters from the layers it is given.
///
/// Chain layers, the token layer and disabled layers are not compared. The
/// codebook is the same for every document.
#[derive(Debug, Clone, Default)]
pub struct StaticSchema {
    codebook: Vec<AnnotationLayer>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the codebook layers compared during curation-graph creation.
    pub fn with_codebook(mut self, codebook: Vec<AnnotationLayer>) -> Self {
        self.codebook = codebook;
        self
    }
}

fn adapters_for(layers: &[AnnotationLayer]) -> Vec<DiffAdapter> {
    layers
        .iter()
        .filter(|layer| layer.is_diffable())
        .map(DiffAdapter::from)
        .collect()
}

impl SchemaService for StaticSchema {
    fn diff_adapters(&self, layers: &[AnnotationLayer]) -> Vec<DiffAdapter> {
        adapters_for(layers)
    }

    fn codebook_adapters(&self, _document: &SourceDocument) -> Result<Vec<DiffAdapter>> {
        Ok(adapters_for(&self.codebook))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TOKEN_LAYER;

    #[test]
    fn test_adapters_skip_undiffable_layers() {
        let layers = vec![
            AnnotationLayer::span(TOKEN_LAYER, &[]),
            AnnotationLayer::span("NamedEntity", &["value"]),
            AnnotationLayer::chain("Coreference"),
            AnnotationLayer::relation("Dependency", &["type"]),
        ];
        let adapters = StaticSchema::new().diff_adapters(&layers);
        let names: Vec<&str> = adapters.iter().map(|a| a.layer.as_str()).collect();
        assert_eq!(names, vec!["NamedEntity", "Dependency"]);
        assert_eq!(adapters[0].label_features, vec!["value".to_string()]);
    }

    #[test]
    fn test_codebook_adapters() {
        let schema = StaticSchema::new()
            .with_codebook(vec![AnnotationLayer::span("Codebook.Topic", &["code"])]);
        let adapters = schema
            .codebook_adapters(&SourceDocument::new("p", "d"))
            .unwrap();
        assert_eq!(adapters.len(), 1);
    }
}
