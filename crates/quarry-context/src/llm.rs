//! Chat completion providers: OpenAI-compatible and Ollama, each with a
//! single-shot call and a token stream.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use quarry_config::LlmConfig;
use quarry_core::traits::{LlmProvider, TokenStream};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::sync::Arc;

/// Select a chat provider the same way embedders are selected: an API
/// key means the OpenAI-compatible endpoint, otherwise local Ollama.
pub fn select_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        return Ok(Arc::new(OpenAiProvider::new(config.clone(), api_key)));
    }
    Ok(Arc::new(OllamaProvider::new(config.clone())))
}

pub struct OpenAiProvider {
    config: LlmConfig,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: LlmConfig, api_key: String) -> Self {
        Self {
            config,
            api_key,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn body(&self, prompt: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stream": stream,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResp {
    choices: Vec<ChatRespChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatRespChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.body(prompt, false))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion failed ({status}): {body}"));
        }

        let parsed: ChatResp = resp.json().await?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        Ok(content)
    }

    async fn complete_stream(&self, prompt: &str) -> Result<TokenStream> {
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.body(prompt, true))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("chat stream request failed ({status}): {body}"));
        }

        let stream = resp.bytes_stream().eventsource().filter_map(|event| async {
            match event {
                Ok(event) => {
                    if event.data == "[DONE]" {
                        return None;
                    }
                    match serde_json::from_str::<StreamChunk>(&event.data) {
                        Ok(chunk) => {
                            let content = chunk
                                .choices
                                .first()
                                .and_then(|c| c.delta.content.clone())
                                .unwrap_or_default();
                            if content.is_empty() {
                                None
                            } else {
                                Some(Ok(content))
                            }
                        }
                        Err(err) => Some(Err(anyhow!("malformed stream event: {err}"))),
                    }
                }
                Err(err) => Some(Err(anyhow!("stream transport error: {err}"))),
            }
        });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

pub struct OllamaProvider {
    config: LlmConfig,
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: LlmConfig) -> Self {
        let base_url =
            env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        Self {
            config,
            base_url,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    fn body(&self, prompt: &str, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": stream,
            "options": {
                "num_predict": self.config.max_tokens as i64,
                "temperature": self.config.temperature,
            },
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&self.body(prompt, false))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama chat failed ({status}): {body}"));
        }

        let json: serde_json::Value = resp.json().await?;
        Ok(json["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn complete_stream(&self, prompt: &str) -> Result<TokenStream> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&self.body(prompt, true))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Ollama stream request failed ({status}): {body}"));
        }

        // Ollama streams newline-delimited JSON objects; carry a line
        // buffer across transport chunks.
        let stream = futures::stream::try_unfold(
            (resp, String::new()),
            |(mut resp, mut buffer)| async move {
                loop {
                    if let Some(pos) = buffer.find('\n') {
                        let line: String = buffer.drain(..=pos).collect();
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let value: serde_json::Value = serde_json::from_str(line)
                            .context("malformed Ollama stream line")?;
                        let token = value["message"]["content"]
                            .as_str()
                            .unwrap_or_default()
                            .to_string();
                        if token.is_empty() {
                            continue;
                        }
                        return Ok(Some((token, (resp, buffer))));
                    }
                    match resp.chunk().await.context("Ollama stream read failed")? {
                        Some(bytes) => buffer.push_str(&String::from_utf8_lossy(&bytes)),
                        None => return Ok(None),
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
