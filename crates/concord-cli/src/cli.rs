//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use concord::{Mode, Window};

/// Concord: sentence-level consensus over independently annotated documents
#[derive(Parser)]
#[command(name = "concord")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify every sentence of a document as agreeing or disagreeing
    Build {
        #[command(flatten)]
        target: TargetArgs,

        /// Character range to classify as BEGIN:END (default: whole document)
        #[arg(short, long)]
        window: Option<Window>,

        /// Only list disagreeing sentences
        #[arg(long)]
        disagreements_only: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get or create the working graph of a document
    Acquire {
        #[command(flatten)]
        target: TargetArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Arguments naming a document and how to work on it.
#[derive(Args)]
pub struct TargetArgs {
    /// Project directory managed by concord
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Document as PROJECT/NAME
    #[arg(value_name = "DOCUMENT")]
    pub document: String,

    /// Working mode
    #[arg(short, long, default_value = "curation")]
    pub mode: Mode,

    /// Acting user (default: the curation pseudo-user in curation mode)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Layer definitions as JSON (default: <ROOT>/layers.json)
    #[arg(long)]
    pub layers: Option<PathBuf>,

    /// Codebook layer definitions as JSON (default: <ROOT>/codebook.json if present)
    #[arg(long)]
    pub codebook: Option<PathBuf>,

    /// Build configuration as JSON
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
