//! Build configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::LinkCompareBehavior;
use crate::error::{ConcordError, Result};

/// Configuration for consensus builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// How link features take part in annotation equality.
    pub link_compare: LinkCompareBehavior,
    /// Merge positions some annotators left empty when nobody contradicts them.
    pub merge_incomplete: bool,
    /// Migrate a stored working graph to the current schema when it is read.
    pub upgrade_on_open: bool,
    /// Segments between two progress messages.
    pub progress_interval: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            link_compare: LinkCompareBehavior::default(),
            merge_incomplete: false,
            upgrade_on_open: false,
            progress_interval: 100,
        }
    }
}

impl ConsensusConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConcordError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_interval == 0 {
            return Err(ConcordError::Config(
                "progress_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ConsensusConfig::default();
        assert_eq!(config.link_compare, LinkCompareBehavior::LinkRoleAsLabel);
        assert!(!config.merge_incomplete);
        assert_eq!(config.progress_interval, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"merge_incomplete": true, "link_compare": "link_target_as_label"}}"#)
            .unwrap();

        let config = ConsensusConfig::load(file.path()).unwrap();
        assert!(config.merge_incomplete);
        assert_eq!(config.link_compare, LinkCompareBehavior::LinkTargetAsLabel);
        assert_eq!(config.progress_interval, 100);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"progress_interval": 0}}"#).unwrap();
        let err = ConsensusConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConcordError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConsensusConfig::load("/nonexistent/concord.json").unwrap_err();
        assert!(matches!(err, ConcordError::Io { .. }));
    }
}
