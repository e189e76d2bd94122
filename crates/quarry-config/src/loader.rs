//! Loads configuration from disk and the environment.

use crate::error::{ConfigError, Result};
use crate::types::Config;
use crate::validation::Validate;
use std::path::{Path, PathBuf};

/// Filenames probed, in order, when no explicit path is given.
const DEFAULT_FILES: &[&str] = &[".quarry.toml", ".quarry.yml", ".quarry.yaml", ".quarry.json"];

impl Config {
    /// Load from the first default file that exists, falling back to
    /// defaults when none does, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = DEFAULT_FILES
            .iter()
            .map(|name| PathBuf::from(name))
            .find(|p| p.exists())
            .map(|p| Self::parse_file(&p))
            .transpose()?
            .unwrap_or_default();

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load a specific file; the format is chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let parse_err = |message: String| ConfigError::ParseError {
            path: path.to_path_buf(),
            message,
        };

        match extension {
            "toml" => toml::from_str(&raw).map_err(|e| parse_err(e.to_string())),
            "yml" | "yaml" => serde_yaml::from_str(&raw).map_err(|e| parse_err(e.to_string())),
            "json" => serde_json::from_str(&raw).map_err(|e| parse_err(e.to_string())),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("QUARRY_INDEX_ROOT") {
            if !root.is_empty() {
                self.core.index_root = PathBuf::from(root);
            }
        }
        if let Ok(model) = std::env::var("QUARRY_LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(model) = std::env::var("QUARRY_EMBED_MODEL") {
            if !model.is_empty() {
                self.embedding.model_name = model;
            }
        }
    }
}
