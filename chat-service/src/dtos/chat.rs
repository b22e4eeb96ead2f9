use crate::models::{MessageMode, MessageRecord, Sender};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(max = 4000))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
}

/// Both fields are optional; the sender defaults to `User` and the
/// message to an empty string. The sender is parsed by the handler so an
/// unknown value surfaces as a validation error.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StoreMessageRequest {
    #[serde(default)]
    pub sender: Option<String>,

    #[serde(default)]
    #[validate(length(max = 4000))]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreMessageResponse {
    pub status: String,
    pub message: String,
}

impl StoreMessageResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: "Message stored successfully".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub sender: Sender,
    pub message: String,
    pub mode: MessageMode,
}

impl From<MessageRecord> for HistoryEntry {
    fn from(record: MessageRecord) -> Self {
        Self {
            sender: record.sender,
            message: record.message,
            mode: record.mode,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}
