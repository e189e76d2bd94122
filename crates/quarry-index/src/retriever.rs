//! Score-threshold retrieval with an expanding candidate count.

use async_trait::async_trait;
use quarry_config::RetrievalConfig;
use quarry_core::models::ScoredChunk;
use quarry_core::traits::Embedder;
use quarry_core::{Error, Result};
use std::sync::Arc;

use crate::vector::VectorIndex;

/// Text-in, scored-chunks-out similarity search. The seam the retriever
/// (and its tests) work against.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredChunk>>;
}

/// A loaded vector index paired with the embedder its vectors came from.
pub struct SearchIndex {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl SearchIndex {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl SimilaritySearch for SearchIndex {
    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<ScoredChunk>> {
        let query_vector = self.embedder.embed(query).await.map_err(Error::Embedding)?;
        self.index.search(&query_vector, limit).await
    }
}

/// Wraps similarity search with the score-threshold + expanding-k
/// policy: grow the candidate count while every fetched candidate still
/// clears the threshold, up to a hard cap. An empty result is a valid
/// "no relevant context" outcome, not an error.
pub struct Retriever {
    searcher: Arc<dyn SimilaritySearch>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(searcher: Arc<dyn SimilaritySearch>, config: RetrievalConfig) -> Self {
        Self { searcher, config }
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let mut k = self.config.k_increment.min(self.config.max_k);
        loop {
            let hits = self.searcher.similarity_search(query, k).await?;
            let fetched = hits.len();
            let mut qualifying: Vec<ScoredChunk> = hits
                .into_iter()
                .filter(|hit| hit.score >= self.config.min_score)
                .collect();

            let exhausted = fetched < k;
            let some_rejected = qualifying.len() < fetched;
            if some_rejected || exhausted || k >= self.config.max_k {
                qualifying.truncate(self.config.max_k);
                return Ok(qualifying);
            }
            k = (k + self.config.k_increment).min(self.config.max_k);
        }
    }
}
