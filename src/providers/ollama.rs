//! Client for the Ollama HTTP API.
//!
//! Only the two calls the chat loop needs are covered: `GET /api/tags` to
//! list installed models and `POST /api/chat` with `stream: true`, whose
//! body is one JSON object per line.

use super::base_client::HttpClient;
use super::{ChatClient, ChatRequest, TokenStream};
use crate::core::error::{Result, TchatError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

/// Parses one NDJSON line of a streamed chat reply.
pub fn parse_chat_line(line: &str) -> Result<Option<String>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: ChatChunk = serde_json::from_str(line)?;
    if let Some(error) = chunk.error {
        return Err(TchatError::Api(error));
    }

    Ok(chunk
        .message
        .map(|m| m.content)
        .filter(|content| !content.is_empty()))
}

#[derive(Clone)]
pub struct OllamaClient {
    client: HttpClient,
}

impl OllamaClient {
    pub fn new(api_link: &str) -> Self {
        Self::with_http_client(HttpClient::new(api_link))
    }

    pub fn with_http_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self.client.get("api/tags").await?;
        let tags: TagsResponse = response.json().await?;
        let models: Vec<String> = tags
            .models
            .into_iter()
            .filter_map(|entry| entry.model.or(entry.name))
            .collect();
        debug!(count = models.len(), "listed models");
        Ok(models)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream> {
        debug!(model = %request.model, messages = request.messages.len(), "chat request");
        let response = self.client.post("api/chat", request).await?;
        Ok(HttpClient::stream_lines(response, parse_chat_line))
    }
}
