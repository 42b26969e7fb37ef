//! CLI command implementations.

pub mod acquire;
pub mod build;

use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use concord::model::CURATION_USER;
use concord::{
    AnnotationLayer, BuildState, Collaborators, ConsensusBuilder, ConsensusConfig,
    FileRepository, Mode, SourceDocument, StaticSchema, Window,
};
use tracing::debug;

use crate::cli::TargetArgs;

const LAYERS_FILE: &str = "layers.json";
const CODEBOOK_FILE: &str = "codebook.json";

/// A builder wired to a project directory and the state of one request.
pub struct Session {
    pub builder: ConsensusBuilder,
    pub state: BuildState,
}

/// Open the project named by `target`.
///
/// Without a window the whole document is covered.
pub fn open(target: &TargetArgs, window: Option<Window>) -> Result<Session, Box<dyn Error>> {
    let document = parse_document(&target.document)?;

    let layers_path = target
        .layers
        .clone()
        .unwrap_or_else(|| target.root.join(LAYERS_FILE));
    if !layers_path.exists() {
        return Err(format!(
            "Layer definitions not found: {}\nPass --layers or create {} in the project root.",
            layers_path.display(),
            LAYERS_FILE
        )
        .into());
    }
    let layers = load_layers(&layers_path)?;

    let codebook = match codebook_path(target) {
        Some(path) => load_layers(&path)?,
        None => Vec::new(),
    };

    let config = match &target.config {
        Some(path) => ConsensusConfig::load(path)?,
        None => ConsensusConfig::default(),
    };

    let user = match (&target.user, target.mode) {
        (Some(user), _) => user.clone(),
        (None, Mode::Curation) => CURATION_USER.to_string(),
        (None, mode) => return Err(format!("--user is required in {} mode", mode).into()),
    };

    let window = match window {
        Some(window) => window,
        None => Window::new(0, usize::MAX)?,
    };

    debug!(
        root = %target.root.display(),
        document = %document,
        layers = layers.len(),
        codebook = codebook.len(),
        "Opening project"
    );

    let repository = Arc::new(FileRepository::new(&target.root));
    let schema = StaticSchema::new().with_codebook(codebook);
    let builder = ConsensusBuilder::with_config(
        Collaborators::with_repository(repository, schema),
        config,
    );
    let state = BuildState::new(document, target.mode, window, user).with_layers(layers);

    Ok(Session { builder, state })
}

/// Parse `PROJECT/NAME`.
fn parse_document(s: &str) -> Result<SourceDocument, Box<dyn Error>> {
    match s.split_once('/') {
        Some((project, name)) if !project.is_empty() && !name.is_empty() => {
            Ok(SourceDocument::new(project, name))
        }
        _ => Err(format!("Invalid document '{}': expected PROJECT/NAME", s).into()),
    }
}

fn codebook_path(target: &TargetArgs) -> Option<PathBuf> {
    match &target.codebook {
        Some(path) => Some(path.clone()),
        None => {
            let path = target.root.join(CODEBOOK_FILE);
            path.exists().then_some(path)
        }
    }
}

fn load_layers(path: &Path) -> Result<Vec<AnnotationLayer>, Box<dyn Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let layers = serde_json::from_reader(BufReader::new(file))?;
    Ok(layers)
}
