//! Splits loaded files into overlapping character windows.
//!
//! Overlap exists so context spanning a window boundary is not lost;
//! downstream enrichment and embedding treat each window independently.

use anyhow::{Context, Result};
use quarry_config::ChunkingConfig;
use text_splitter::{ChunkConfig, TextSplitter};

pub struct WindowChunker {
    splitter: TextSplitter<text_splitter::Characters>,
}

impl WindowChunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .context("chunk overlap must be smaller than chunk size")?;
        Ok(Self {
            splitter: TextSplitter::new(chunk_config),
        })
    }

    /// Split `content` into windows, preserving input order.
    pub fn split(&self, content: &str) -> Vec<String> {
        self.splitter
            .chunks(content)
            .map(|chunk| chunk.to_string())
            .collect()
    }
}
