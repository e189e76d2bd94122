use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Produces fixed-dimensionality vectors for chunk and query text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Tokens as they arrive from a streaming completion.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Single-shot and token-streaming completion against a language model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// One prompt in, the full completion text out.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Streaming variant; items are generated tokens in order.
    async fn complete_stream(&self, prompt: &str) -> Result<TokenStream>;

    fn name(&self) -> &'static str;
}
