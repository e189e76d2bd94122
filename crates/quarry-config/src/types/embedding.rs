//! Embedding provider settings

use serde::{Deserialize, Serialize};

/// Which embedding collaborator to talk to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama instance.
    Ollama,
    /// OpenAI-compatible HTTP endpoint.
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_backend")]
    pub backend: EmbeddingBackend,

    /// Embedding model name. The model is fixed per collection: all
    /// chunks and all queries must embed with the same one.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Expected vector dimensionality; every embedding is checked
    /// against this before the index is written.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model_name: default_model_name(),
            dimension: default_dimension(),
        }
    }
}

impl crate::validation::Validate for EmbeddingConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::validation::validate_positive;

        if self.model_name.is_empty() {
            return Err(crate::error::ConfigError::ValidationError {
                field: "embedding.model_name".to_string(),
                message: "model name cannot be empty".to_string(),
            });
        }
        validate_positive("embedding.dimension", self.dimension)?;
        Ok(())
    }
}

fn default_backend() -> EmbeddingBackend {
    EmbeddingBackend::Ollama
}

fn default_model_name() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimension() -> usize {
    768
}
