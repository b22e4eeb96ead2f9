//! Storage seams used by the session router.
//!
//! `ChatDb` implements these against MongoDB; `MemoryStore` keeps
//! everything in process for tests and local runs.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{ConversationState, MessageMode, MessageRecord, ProductRecord, Session};

/// Owns the one session per client identity.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_session(&self, ip: &str) -> Result<Option<Session>, AppError>;

    /// Create or overwrite the session for `session.ip`. Last write wins.
    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;

    /// Persist a new conversation state for the identity's session.
    async fn update_state(&self, ip: &str, state: &ConversationState) -> Result<(), AppError>;
}

/// Filter for history lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub ip: String,
    pub session_id: Option<String>,
    pub mode: Option<MessageMode>,
}

impl MessageQuery {
    /// Everything recorded under one session.
    pub fn session(ip: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            session_id: Some(session_id.into()),
            mode: None,
        }
    }

    /// Everything recorded for the identity under one mode tag, across sessions.
    pub fn mode(ip: impl Into<String>, mode: MessageMode) -> Self {
        Self {
            ip: ip.into(),
            session_id: None,
            mode: Some(mode),
        }
    }

    pub fn matches(&self, record: &MessageRecord) -> bool {
        record.ip == self.ip
            && self
                .session_id
                .as_deref()
                .is_none_or(|id| record.session_id == id)
            && self.mode.is_none_or(|mode| record.mode == mode)
    }
}

/// Append-only message history.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append_message(&self, record: &MessageRecord) -> Result<(), AppError>;

    /// Matching records in insertion order.
    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRecord>, AppError>;
}

/// Read-only product catalog. Brand and product lookups are
/// case-insensitive exact matches.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Distinct brands. Order is for display only.
    async fn brands(&self) -> Result<Vec<String>, AppError>;

    async fn products_for_brand(&self, brand: &str) -> Result<Vec<String>, AppError>;

    async fn product_details(
        &self,
        brand: &str,
        product: &str,
    ) -> Result<Option<ProductRecord>, AppError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;
}
