//! Score-threshold retrieval policy

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum similarity a candidate must reach to be returned.
    #[serde(default = "default_min_score")]
    pub min_score: f32,

    /// Initial candidate count, and the step the search breadth grows
    /// by while every fetched candidate still clears the threshold.
    #[serde(default = "default_k_increment")]
    pub k_increment: usize,

    /// Hard cap on search breadth.
    #[serde(default = "default_max_k")]
    pub max_k: usize,

    /// Breadth of the raw similarity search that feeds confidence
    /// scoring (independent of the threshold policy above).
    #[serde(default = "default_confidence_top_k")]
    pub confidence_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            k_increment: default_k_increment(),
            max_k: default_max_k(),
            confidence_top_k: default_confidence_top_k(),
        }
    }
}

impl crate::validation::Validate for RetrievalConfig {
    fn validate(&self) -> crate::error::Result<()> {
        use crate::validation::{validate_positive, validate_unit_range};

        validate_unit_range("retrieval.min_score", self.min_score)?;
        validate_positive("retrieval.k_increment", self.k_increment)?;
        validate_positive("retrieval.confidence_top_k", self.confidence_top_k)?;

        if self.max_k < self.k_increment {
            return Err(crate::error::ConfigError::ValidationError {
                field: "retrieval.max_k".to_string(),
                message: format!(
                    "max_k ({}) must be >= k_increment ({})",
                    self.max_k, self.k_increment
                ),
            });
        }
        Ok(())
    }
}

fn default_min_score() -> f32 {
    0.4
}

fn default_k_increment() -> usize {
    4
}

fn default_max_k() -> usize {
    20
}

fn default_confidence_top_k() -> usize {
    20
}
