//! Shared fixtures: an in-memory store with a small catalog and mock engines.

#![allow(dead_code)]

use async_trait::async_trait;
use chat_service::models::{ConversationState, MessageRecord, ProductRecord, Sender};
use chat_service::services::providers::{MockLocalEngine, MockRemoteProvider};
use chat_service::services::{MemoryStore, MessageQuery, MessageStore, SessionRouter};
use service_core::error::AppError;
use std::sync::Arc;

pub const CLIENT_IP: &str = "203.0.113.7";

pub fn sample_catalog() -> Vec<ProductRecord> {
    vec![
        ProductRecord::new(
            "Dell",
            "XPS 13",
            [("CPU", "Intel Core i7-1360P"), ("RAM", "16GB"), ("Weight", "1.2kg")],
        ),
        ProductRecord::new("Dell", "Inspiron 15", [("CPU", "Intel Core i5"), ("RAM", "8GB")]),
        ProductRecord::new("Lenovo", "ThinkPad X1", [("CPU", "Intel Core i7"), ("RAM", "32GB")]),
    ]
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub engine: Arc<MockLocalEngine>,
    pub remote: Arc<MockRemoteProvider>,
    pub router: SessionRouter,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            MockLocalEngine::new(" The XPS 13 has 16GB of RAM. "),
            MockRemoteProvider::replying("- Update the BIOS\n- Check the charger"),
        )
    }

    pub fn with(engine: MockLocalEngine, remote: MockRemoteProvider) -> Self {
        let store = Arc::new(MemoryStore::with_products(sample_catalog()));
        let engine = Arc::new(engine);
        let remote = Arc::new(remote);
        let router = SessionRouter::new(
            store.clone(),
            store.clone(),
            store.clone(),
            engine.clone(),
            remote.clone(),
        );

        Self {
            store,
            engine,
            remote,
            router,
        }
    }

    pub async fn send(&self, text: &str) -> String {
        self.router
            .handle_message(CLIENT_IP, text)
            .await
            .expect("message should be routed")
    }

    pub async fn state(&self) -> ConversationState {
        self.router
            .open_session(CLIENT_IP)
            .await
            .expect("session should exist")
            .state
    }
}

/// Message store whose writes always fail.
pub struct BrokenMessageStore;

#[async_trait]
impl MessageStore for BrokenMessageStore {
    async fn append_message(&self, _record: &MessageRecord) -> Result<(), AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!("write concern failed")))
    }

    async fn find_messages(&self, _query: &MessageQuery) -> Result<Vec<MessageRecord>, AppError> {
        Ok(Vec::new())
    }
}

/// Keeps user messages but refuses to store replies.
pub struct ReplyRejectingStore(pub Arc<MemoryStore>);

#[async_trait]
impl MessageStore for ReplyRejectingStore {
    async fn append_message(&self, record: &MessageRecord) -> Result<(), AppError> {
        if record.sender == Sender::Assistance {
            return Err(AppError::DatabaseError(anyhow::anyhow!("write concern failed")));
        }
        self.0.append_message(record).await
    }

    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRecord>, AppError> {
        self.0.find_messages(query).await
    }
}
