mod ask;
mod index;
mod status;

pub use ask::handle_ask;
pub use index::handle_index;
pub use status::handle_status;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quarry_config::Config;
use quarry_core::models::CollectionId;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "quarry", about = "Index a repository and ask questions about it")]
pub struct Cli {
    /// Path to a config file (defaults to .quarry.{toml,yml,yaml,json})
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a repository into a fresh collection
    Index {
        /// Repository root to ingest
        path: PathBuf,
    },
    /// Ask a question against an indexed collection
    Ask {
        question: String,
        /// Case-insensitive regex narrowing reported sources
        #[arg(long)]
        filter: Option<String>,
        /// Emit tokens incrementally instead of waiting for the answer
        #[arg(long)]
        stream: bool,
        /// Collection id (defaults to the most recently indexed one)
        #[arg(long)]
        collection: Option<String>,
    },
    /// Show snapshot roll-ups for a collection
    Status {
        #[arg(long)]
        collection: Option<String>,
    },
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::load().context("loading config"),
    }
}

/// The default-lookup convenience lives here at the boundary: an
/// explicit --collection always wins, otherwise fall back to the id
/// noted by the last successful `quarry index`.
pub fn resolve_collection(config: &Config, explicit: Option<String>) -> Result<CollectionId> {
    if let Some(id) = explicit {
        return Ok(CollectionId::from_raw(id));
    }
    let pointer = config.core.active_pointer_path();
    let id = std::fs::read_to_string(&pointer)
        .with_context(|| "no collection given and none indexed yet; run `quarry index` first")?;
    Ok(CollectionId::from_raw(id.trim().to_string()))
}

pub fn remember_collection(config: &Config, id: &CollectionId) -> Result<()> {
    std::fs::create_dir_all(&config.core.index_root)?;
    std::fs::write(config.core.active_pointer_path(), id.as_str())?;
    Ok(())
}
