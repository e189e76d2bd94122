//! Paths and storage locations

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Root directory for everything quarry persists.
    #[serde(default = "default_index_root")]
    pub index_root: PathBuf,

    /// Glob patterns restricting which repo files are ingested.
    /// Empty means everything the scanner considers text.
    #[serde(default)]
    pub include_paths: Vec<String>,

    /// Glob patterns excluded on top of the built-in defaults.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

impl CoreConfig {
    /// Directory holding one persisted vector index per collection.
    pub fn collections_dir(&self) -> PathBuf {
        self.index_root.join("collections")
    }

    /// Location of the chunk snapshot store.
    pub fn snapshots_path(&self) -> PathBuf {
        self.index_root.join("snapshots")
    }

    /// Boundary-layer convenience: where the CLI notes the most
    /// recently indexed collection. The core never reads this.
    pub fn active_pointer_path(&self) -> PathBuf {
        self.index_root.join("active")
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            index_root: default_index_root(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }
}

impl crate::validation::Validate for CoreConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.index_root.as_os_str().is_empty() {
            return Err(crate::error::ConfigError::ValidationError {
                field: "core.index_root".to_string(),
                message: "index root cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn default_index_root() -> PathBuf {
    PathBuf::from(".quarry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Validate;

    #[test]
    fn default_is_valid() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn derived_paths_live_under_root() {
        let config = CoreConfig {
            index_root: PathBuf::from("/data/quarry"),
            ..Default::default()
        };
        assert_eq!(
            config.collections_dir(),
            PathBuf::from("/data/quarry/collections")
        );
        assert_eq!(
            config.active_pointer_path(),
            PathBuf::from("/data/quarry/active")
        );
    }
}
