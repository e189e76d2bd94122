//! Configuration type definitions, organized by concern.

pub mod chunking;
pub mod core;
pub mod embedding;
pub mod llm;
pub mod retrieval;

pub use chunking::ChunkingConfig;
pub use core::CoreConfig;
pub use embedding::{EmbeddingBackend, EmbeddingConfig};
pub use llm::LlmConfig;
pub use retrieval::RetrievalConfig;

use serde::{Deserialize, Serialize};

/// Top-level configuration aggregating all settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Paths and storage locations
    #[serde(default)]
    pub core: CoreConfig,

    /// Window splitting
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Score-threshold retrieval policy
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Language model settings
    #[serde(default)]
    pub llm: LlmConfig,
}

impl crate::validation::Validate for Config {
    fn validate(&self) -> crate::error::Result<()> {
        self.core.validate()?;
        self.chunking.validate()?;
        self.retrieval.validate()?;
        self.embedding.validate()?;
        self.llm.validate()?;
        Ok(())
    }
}
