//! Answer engine abstractions and implementations.
//!
//! `LocalEngine` is a text-completion model running next to the service
//! (llama.cpp server). `RemoteChatProvider` is the hosted chat completion
//! API with its client-credentials token exchange.

pub mod baidu;
pub mod llama;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use baidu::BaiduChatProvider;
pub use llama::LlamaServerEngine;
pub use mock::{MockLocalEngine, MockRemoteBehavior, MockRemoteProvider};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered but without generated text.
    #[error("Response contained no result: {0}")]
    MissingResult(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::NetworkError(_) => "network",
            ProviderError::ApiError(_) => "api",
            ProviderError::Authentication(_) => "authentication",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::MissingResult(_) => "missing_result",
        }
    }
}

/// Sampling controls for a completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: i32,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One role-tagged entry of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Local text-completion engine.
#[async_trait]
pub trait LocalEngine: Send + Sync {
    /// Complete `prompt`. The returned text is not trimmed.
    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Hosted chat completion API.
#[async_trait]
pub trait RemoteChatProvider: Send + Sync {
    /// Exchange client credentials for a bearer token.
    async fn access_token(&self) -> Result<String, ProviderError>;

    /// Submit the full message list and return the generated reply.
    async fn chat(
        &self,
        access_token: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}
