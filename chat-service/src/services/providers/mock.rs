//! Mock provider implementations for testing.

use super::{ChatMessage, GenerationParams, LocalEngine, ProviderError, RemoteChatProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Mock local engine that returns a fixed completion and records prompts.
pub struct MockLocalEngine {
    completion: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLocalEngine {
    pub fn new(completion: impl Into<String>) -> Self {
        Self {
            completion: Some(completion.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Engine whose every call fails.
    pub fn failing() -> Self {
        Self {
            completion: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LocalEngine for MockLocalEngine {
    async fn complete(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().await.push(prompt.to_string());
        self.completion
            .clone()
            .ok_or_else(|| ProviderError::NetworkError("mock engine unavailable".to_string()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// How the mock remote provider answers.
#[derive(Debug, Clone)]
pub enum MockRemoteBehavior {
    Reply(String),
    /// Chat call fails as if the connection dropped.
    TransportError,
    /// Token exchange fails.
    TokenError,
    /// Chat call succeeds without a `result`.
    MissingResult,
}

/// Mock remote provider that records every submitted message list.
pub struct MockRemoteProvider {
    behavior: MockRemoteBehavior,
    token_requests: AtomicUsize,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockRemoteProvider {
    pub fn new(behavior: MockRemoteBehavior) -> Self {
        Self {
            behavior,
            token_requests: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(MockRemoteBehavior::Reply(reply.into()))
    }

    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl RemoteChatProvider for MockRemoteProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let n = self.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
        match self.behavior {
            MockRemoteBehavior::TokenError => Err(ProviderError::Authentication(
                "mock token exchange rejected".to_string(),
            )),
            _ => Ok(format!("mock-token-{}", n)),
        }
    }

    async fn chat(
        &self,
        _access_token: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        self.requests.lock().await.push(messages.to_vec());
        match &self.behavior {
            MockRemoteBehavior::Reply(reply) => Ok(reply.clone()),
            MockRemoteBehavior::TransportError => {
                Err(ProviderError::NetworkError("connection reset".to_string()))
            }
            MockRemoteBehavior::MissingResult => {
                Err(ProviderError::MissingResult("error_code=336003".to_string()))
            }
            MockRemoteBehavior::TokenError => Err(ProviderError::Authentication(
                "mock token exchange rejected".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
