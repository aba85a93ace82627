use crate::core::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

pub mod base_client;
pub mod ollama;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Body of a streaming chat call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }
}

pub type TokenStream = BoxStream<'static, Result<String>>;

/// Handle to a chat server bound to one endpoint.
///
/// Changing the endpoint means building a new handle.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn list_models(&self) -> Result<Vec<String>>;

    /// Yields reply fragments in arrival order.
    async fn chat_stream(&self, request: &ChatRequest) -> Result<TokenStream>;
}

pub type ClientFactory = Box<dyn Fn(&str) -> Box<dyn ChatClient>>;

pub fn ollama_factory() -> ClientFactory {
    Box::new(|api_link| Box::new(ollama::OllamaClient::new(api_link)) as Box<dyn ChatClient>)
}
