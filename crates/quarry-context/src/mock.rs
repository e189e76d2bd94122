//! Deterministic collaborators for tests and offline runs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use quarry_core::traits::{Embedder, LlmProvider, TokenStream};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Embeds text as an L2-normalized byte histogram. Identical inputs map
/// to identical vectors and similar text stays nearby, which is all the
/// retrieval tests need.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut counts = vec![0.0f32; self.dimension];
        for byte in text.bytes() {
            counts[byte as usize % self.dimension] += 1.0;
        }
        let norm = counts.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in counts.iter_mut() {
                *v /= norm;
            }
        }
        Ok(counts)
    }
}

/// An embedding collaborator that is down; used to exercise the
/// no-partial-publish guarantee of ingestion.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(anyhow!("embedding endpoint unreachable"))
    }
}

/// Replays a scripted sequence of completions; the final entry repeats
/// once the script is exhausted.
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
}

impl MockLlm {
    pub fn returning(response: &str) -> Self {
        Self::scripted(vec![response.to_string()])
    }

    pub fn scripted(responses: Vec<String>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one response");
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    fn next_response(&self) -> String {
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap_or_default()
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.next_response())
    }

    async fn complete_stream(&self, _prompt: &str) -> Result<TokenStream> {
        let tokens: Vec<Result<String>> = self
            .next_response()
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(tokens)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A provider that is down: completions error, and streams die after an
/// optional run of tokens.
pub struct FailingLlm {
    partial_tokens: Vec<String>,
}

impl FailingLlm {
    pub fn new() -> Self {
        Self {
            partial_tokens: Vec::new(),
        }
    }

    /// Stream some tokens first, then fail mid-generation.
    pub fn after_tokens(tokens: &[&str]) -> Self {
        Self {
            partial_tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for FailingLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for FailingLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(anyhow!("model unreachable"))
    }

    async fn complete_stream(&self, _prompt: &str) -> Result<TokenStream> {
        let mut items: Vec<Result<String>> = self
            .partial_tokens
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        items.push(Err(anyhow!("model died mid-generation")));
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(64);
        let a = embedder.embed("fn main() {}").await.unwrap();
        let b = embedder.embed("fn main() {}").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn scripted_responses_pop_in_order() {
        let llm = MockLlm::scripted(vec!["first".into(), "second".into()]);
        assert_eq!(llm.complete("q").await.unwrap(), "first");
        assert_eq!(llm.complete("q").await.unwrap(), "second");
        // Last response repeats.
        assert_eq!(llm.complete("q").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn failing_stream_yields_prefix_then_error() {
        let llm = FailingLlm::after_tokens(&["a", "b"]);
        let mut stream = llm.complete_stream("q").await.unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "a");
        assert_eq!(stream.next().await.unwrap().unwrap(), "b");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
