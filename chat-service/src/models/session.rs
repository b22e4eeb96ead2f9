//! Per-identity chat session and its conversation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MessageMode;

/// One session per client identity, reused across visits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Client network address; the partition key.
    pub ip: String,

    /// Random 16-character hex token.
    pub session_id: String,

    /// Where the conversation currently is.
    #[serde(default)]
    pub state: ConversationState,

    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Conversation branch plus the narrowing selections of the local flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Unset,
    Local {
        #[serde(default)]
        brand: Option<String>,
        #[serde(default)]
        product: Option<ProductSelection>,
    },
    Remote,
}

/// Product text entered by the user.
///
/// The selection is accepted whether or not the catalog knows it;
/// `verified` records which case applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSelection {
    pub name: String,
    pub verified: bool,
}

impl ConversationState {
    /// Fresh local flow with nothing selected yet.
    pub fn local() -> Self {
        ConversationState::Local {
            brand: None,
            product: None,
        }
    }

    /// Tag applied to messages recorded while in this state.
    pub fn message_mode(&self) -> MessageMode {
        match self {
            ConversationState::Unset => MessageMode::System,
            ConversationState::Local { .. } => MessageMode::Local,
            ConversationState::Remote => MessageMode::Remote,
        }
    }

    pub fn brand(&self) -> Option<&str> {
        match self {
            ConversationState::Local { brand, .. } => brand.as_deref(),
            _ => None,
        }
    }

    pub fn product(&self) -> Option<&ProductSelection> {
        match self {
            ConversationState::Local { product, .. } => product.as_ref(),
            _ => None,
        }
    }
}

impl Session {
    pub fn new(ip: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            ip: ip.into(),
            session_id: new_session_token(),
            state: ConversationState::Unset,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the conversation state.
    pub fn transition(&mut self, state: ConversationState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Back to mode selection. Brand and product are dropped.
    pub fn reset(&mut self) {
        self.transition(ConversationState::Unset);
    }
}

/// 8 random bytes, hex encoded.
pub fn new_session_token() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes)
}
