//! Embedding collaborators over HTTP.
//!
//! Both providers speak a batched protocol, so ingestion can push whole
//! windows of chunks per request. Dimensionality is enforced later, at
//! index build time.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use quarry_config::{EmbeddingBackend, EmbeddingConfig};
use quarry_core::traits::Embedder;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;

const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const OPENAI_DEFAULT_MODEL: &str = "text-embedding-3-small";
const OLLAMA_DEFAULT_MODEL: &str = "nomic-embed-text";

/// Pick an embedding collaborator: an API key in the environment selects
/// the OpenAI-compatible endpoint, otherwise a local Ollama instance.
pub fn select_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        let model = match config.backend {
            EmbeddingBackend::External if !config.model_name.is_empty() => {
                config.model_name.clone()
            }
            _ => OPENAI_DEFAULT_MODEL.to_string(),
        };
        return Ok(Arc::new(OpenAiEmbedder::new(model, api_key)));
    }

    let model = if config.model_name.is_empty() {
        OLLAMA_DEFAULT_MODEL.to_string()
    } else {
        config.model_name.clone()
    };
    Ok(Arc::new(OllamaEmbedder::new(model)))
}

async fn read_failure(what: &str, resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow!("{what} request failed ({status}): {body}")
}

fn check_count(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        bail!("embedding count mismatch: got {got} vectors for {expected} inputs");
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

pub struct OpenAiEmbedder {
    model: String,
    api_key: String,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiVector>,
}

#[derive(Deserialize)]
struct OpenAiVector {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&BatchRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(read_failure("embeddings", resp).await);
        }

        let parsed: OpenAiResponse = resp.json().await?;
        check_count(parsed.data.len(), texts.len())?;
        Ok(parsed.data.into_iter().map(|v| v.embedding).collect())
    }
}

pub struct OllamaEmbedder {
    model: String,
    base_url: String,
    client: Client,
}

impl OllamaEmbedder {
    pub fn new(model: String) -> Self {
        let base_url =
            env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        Self {
            model,
            base_url,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        // /api/embed accepts a batch of inputs, unlike the older
        // single-prompt /api/embeddings.
        format!("{}/api/embed", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct OllamaResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("Ollama returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .client
            .post(self.endpoint())
            .json(&BatchRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(read_failure("Ollama embed", resp).await);
        }

        let parsed: OllamaResponse = resp.json().await?;
        check_count(parsed.embeddings.len(), texts.len())?;
        Ok(parsed.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_mismatch_is_rejected() {
        assert!(check_count(3, 3).is_ok());
        assert!(check_count(2, 3).is_err());
    }

    #[test]
    fn batch_request_wire_shape() {
        let input = vec!["fn a() {}".to_string()];
        let body = serde_json::to_value(BatchRequest {
            model: "nomic-embed-text",
            input: &input,
        })
        .unwrap();
        assert_eq!(body["model"], "nomic-embed-text");
        assert_eq!(body["input"][0], "fn a() {}");
    }

    #[test]
    fn provider_responses_deserialize() {
        let openai: OpenAiResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.1, 0.2]}]}"#).unwrap();
        assert_eq!(openai.data[0].embedding.len(), 2);

        let ollama: OllamaResponse =
            serde_json::from_str(r#"{"embeddings": [[0.5, 0.5], [1.0, 0.0]]}"#).unwrap();
        assert_eq!(ollama.embeddings.len(), 2);
    }
}
