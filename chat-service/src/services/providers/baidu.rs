//! Baidu Qianfan chat completion client.
//!
//! Each call to [`BaiduChatProvider::access_token`] performs a fresh
//! client-credentials exchange; tokens are not cached.

use super::{ChatMessage, ProviderError, RemoteChatProvider};
use crate::config::BaiduConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct BaiduChatProvider {
    client: Client,
    config: BaiduConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

/// Errors come back with HTTP 200 and `error_code`/`error_msg` in place of `result`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    result: Option<String>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

impl BaiduChatProvider {
    pub fn new(config: BaiduConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() || config.secret_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Baidu API key and secret key are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RemoteChatProvider for BaiduChatProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.config.oauth_url)
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.api_key.as_str()),
                ("client_secret", self.config.secret_key.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("token response (status {}): {}", status, e))
        })?;

        match token.access_token {
            Some(access_token) if status.is_success() => Ok(access_token),
            _ => Err(ProviderError::Authentication(format!(
                "status {}: {} {}",
                status,
                token.error.unwrap_or_default(),
                token.error_description.unwrap_or_default()
            ))),
        }
    }

    async fn chat(
        &self,
        access_token: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        tracing::debug!(message_count = messages.len(), "Sending chat request to Baidu");

        let response = self
            .client
            .post(&self.config.chat_url)
            .query(&[("access_token", access_token)])
            .json(&ChatRequest { messages })
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(format!(
                "Baidu API error {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        chat.result.ok_or_else(|| {
            ProviderError::MissingResult(format!(
                "error_code={} error_msg={}",
                chat.error_code.unwrap_or_default(),
                chat.error_msg.unwrap_or_default()
            ))
        })
    }

    fn name(&self) -> &'static str {
        "baidu"
    }
}
