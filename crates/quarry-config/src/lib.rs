//! Configuration for quarry
//!
//! Typed, validated configuration with support for TOML, YAML and JSON
//! files plus a handful of environment overrides.
//!
//! # Example
//!
//! ```no_run
//! use quarry_config::Config;
//!
//! // Load from the default locations (.quarry.{toml,yml,yaml,json})
//! let config = Config::load()?;
//!
//! let window = config.chunking.chunk_size;
//! let threshold = config.retrieval.min_score;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use error::{ConfigError, Result};
pub use types::*;
pub use validation::Validate;
