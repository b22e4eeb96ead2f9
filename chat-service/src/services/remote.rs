//! Free-form troubleshooting replies from the hosted chat API.

use std::sync::Arc;
use std::time::Instant;

use crate::models::{MessageRecord, Sender};
use crate::services::metrics;
use crate::services::providers::{ChatMessage, ProviderError, RemoteChatProvider};

pub const API_ERROR_REPLY: &str = "API error. Please try again later.";
pub const NO_RESULT_REPLY: &str = "Sorry, I didn't understand that.";

pub const ASSISTANT_INSTRUCTION: &str = "You are a Laptop info assistant. Please provide concise and to-the-point answers. You can use bullet points to list multiple items if necessary. Avoid including any unnecessary explanations or introductions.";

pub struct RemoteAnswerGenerator {
    provider: Arc<dyn RemoteChatProvider>,
}

impl RemoteAnswerGenerator {
    pub fn new(provider: Arc<dyn RemoteChatProvider>) -> Self {
        Self { provider }
    }

    /// Reply to the conversation in `history`.
    ///
    /// Never fails: provider errors are logged and replaced with a fixed
    /// fallback text.
    pub async fn reply(&self, history: &[MessageRecord]) -> String {
        let messages = build_remote_messages(history);
        let provider = self.provider.name();
        let started = Instant::now();

        let result = self.request(&messages).await;
        metrics::record_provider_latency(provider, started.elapsed().as_secs_f64());

        match result {
            Ok(text) => text,
            Err(e) => {
                metrics::record_provider_error(provider, e.kind());
                tracing::warn!(
                    provider = provider,
                    error = %e,
                    history_len = history.len(),
                    "Remote chat request failed, replying with fallback"
                );
                fallback_reply(&e).to_string()
            }
        }
    }

    async fn request(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let token = self.provider.access_token().await?;
        self.provider.chat(&token, messages).await
    }
}

/// Users speak as `user`; everything else the identity saw is `assistant`.
/// The instruction goes last.
pub fn build_remote_messages(history: &[MessageRecord]) -> Vec<ChatMessage> {
    history
        .iter()
        .map(|record| match record.sender {
            Sender::User => ChatMessage::user(record.message.as_str()),
            Sender::Assistance | Sender::System => ChatMessage::assistant(record.message.as_str()),
        })
        .chain(std::iter::once(ChatMessage::user(ASSISTANT_INSTRUCTION)))
        .collect()
}

fn fallback_reply(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::MissingResult(_) => NO_RESULT_REPLY,
        _ => API_ERROR_REPLY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageMode;
    use crate::services::providers::{ChatRole, MockRemoteBehavior, MockRemoteProvider};

    fn record(sender: Sender, message: &str) -> MessageRecord {
        MessageRecord::new("10.0.0.7", "0011223344556677", MessageMode::Remote, sender, message)
    }

    #[test]
    fn instruction_is_appended_after_history() {
        let history = vec![
            record(Sender::User, "my screen flickers"),
            record(Sender::Assistance, "- update the GPU driver"),
            record(Sender::User, "still flickers"),
        ];

        let messages = build_remote_messages(&history);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::user("my screen flickers"));
        assert_eq!(messages[1], ChatMessage::assistant("- update the GPU driver"));
        assert_eq!(messages[2], ChatMessage::user("still flickers"));
        assert_eq!(messages[3], ChatMessage::user(ASSISTANT_INSTRUCTION));
    }

    #[test]
    fn system_sender_maps_to_assistant() {
        let messages = build_remote_messages(&[record(Sender::System, "noted")]);
        assert_eq!(messages[0].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn fetches_a_token_every_turn() {
        let provider = Arc::new(MockRemoteProvider::replying("- try a hard reset"));
        let generator = RemoteAnswerGenerator::new(provider.clone());
        let history = vec![record(Sender::User, "won't boot")];

        assert_eq!(generator.reply(&history).await, "- try a hard reset");
        assert_eq!(generator.reply(&history).await, "- try a hard reset");
        assert_eq!(provider.token_requests(), 2);
    }

    #[tokio::test]
    async fn transport_failure_uses_api_error_reply() {
        let provider = Arc::new(MockRemoteProvider::new(MockRemoteBehavior::TransportError));
        let generator = RemoteAnswerGenerator::new(provider);

        let reply = generator.reply(&[record(Sender::User, "hi")]).await;
        assert_eq!(reply, API_ERROR_REPLY);
    }

    #[tokio::test]
    async fn token_failure_skips_chat_call() {
        let provider = Arc::new(MockRemoteProvider::new(MockRemoteBehavior::TokenError));
        let generator = RemoteAnswerGenerator::new(provider.clone());

        let reply = generator.reply(&[record(Sender::User, "hi")]).await;
        assert_eq!(reply, API_ERROR_REPLY);
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn missing_result_uses_not_understood_reply() {
        let provider = Arc::new(MockRemoteProvider::new(MockRemoteBehavior::MissingResult));
        let generator = RemoteAnswerGenerator::new(provider);

        let reply = generator.reply(&[record(Sender::User, "hi")]).await;
        assert_eq!(reply, NO_RESULT_REPLY);
    }
}
