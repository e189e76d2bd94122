//! Composes retrieved chunks and a question into a structured answer.

use anyhow::anyhow;
use quarry_config::{Config, RetrievalConfig};
use quarry_core::models::{AnswerEnvelope, CollectionId, ScoredChunk};
use quarry_core::traits::{Embedder, LlmProvider};
use quarry_core::{Error, Result};
use quarry_index::{Retriever, SearchIndex, SimilaritySearch, VectorIndex};
use regex::RegexBuilder;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

use crate::parser;
use crate::prompts;

#[derive(Clone)]
pub struct Synthesizer {
    pub(crate) searcher: Arc<dyn SimilaritySearch>,
    pub(crate) llm: Arc<dyn LlmProvider>,
    pub(crate) retrieval: RetrievalConfig,
}

impl Synthesizer {
    /// Load the persisted index for `collection` and wire it up.
    /// Fails with `NotIndexed` when that collection was never built:
    /// the one failure ask paths surface as an error.
    pub async fn open(
        config: &Config,
        collection: &CollectionId,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let index = VectorIndex::load(&config.core.collections_dir(), collection).await?;
        let searcher: Arc<dyn SimilaritySearch> =
            Arc::new(SearchIndex::new(Arc::new(index), embedder));
        Ok(Self::new(searcher, llm, config.retrieval.clone()))
    }

    pub fn new(
        searcher: Arc<dyn SimilaritySearch>,
        llm: Arc<dyn LlmProvider>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            searcher,
            llm,
            retrieval,
        }
    }

    pub(crate) fn retriever(&self) -> Retriever {
        Retriever::new(self.searcher.clone(), self.retrieval.clone())
    }

    /// Answer `question` from the collection, optionally narrowing the
    /// reported provenance with a case-insensitive regex. The filter
    /// never changes what the model sees, only which sources are
    /// attributed and scored.
    pub async fn answer(&self, question: &str, filter: Option<&str>) -> Result<AnswerEnvelope> {
        // Reject a bad filter before spending a model call on it.
        let filter = compile_filter(filter)?;

        let candidates = self.retriever().retrieve(question).await?;
        let prompt = prompts::qa_prompt(question, &candidates);

        let (text, sources) = match self.llm.complete(&prompt).await {
            Ok(raw) => {
                let parsed = parser::parse_structured(&raw, self.llm.as_ref()).await;
                (parsed.answer, parsed.sources)
            }
            Err(err) => {
                warn!("model invocation failed: {err}");
                (prompts::APOLOGY.to_string(), Vec::new())
            }
        };

        let docs = apply_filter(&candidates, filter.as_ref());
        let confidence = self.confidence(question, &docs).await;

        Ok(AnswerEnvelope {
            text,
            sources,
            confidence,
            source_documents: docs.into_iter().map(|d| d.chunk).collect(),
        })
    }

    /// Mean raw similarity (top-`confidence_top_k`, unfiltered search)
    /// over candidates whose file path survived the filter, rounded to
    /// two decimals. Zero when nothing survived.
    pub(crate) async fn confidence(&self, question: &str, docs: &[ScoredChunk]) -> f32 {
        if docs.is_empty() {
            return 0.0;
        }
        let paths: HashSet<&str> = docs.iter().map(|d| d.chunk.file_path.as_str()).collect();

        let hits = match self
            .searcher
            .similarity_search(question, self.retrieval.confidence_top_k)
            .await
        {
            Ok(hits) => hits,
            Err(err) => {
                warn!("confidence search failed: {err}");
                return 0.0;
            }
        };

        let scores: Vec<f32> = hits
            .into_iter()
            .filter(|h| paths.contains(h.chunk.file_path.as_str()))
            .map(|h| h.score)
            .collect();
        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        (mean * 100.0).round() / 100.0
    }
}

pub(crate) fn compile_filter(filter: Option<&str>) -> Result<Option<regex::Regex>> {
    filter
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|err| Error::Other(anyhow!("invalid provenance filter: {err}")))
        })
        .transpose()
}

/// Keep candidates whose content + serialized metadata match.
pub(crate) fn apply_filter(
    candidates: &[ScoredChunk],
    filter: Option<&regex::Regex>,
) -> Vec<ScoredChunk> {
    match filter {
        None => candidates.to_vec(),
        Some(re) => candidates
            .iter()
            .filter(|c| {
                let haystack = format!("{}{}", c.chunk.content, c.chunk.metadata_json());
                re.is_match(&haystack)
            })
            .cloned()
            .collect(),
    }
}
