//! In-process store for tests and local runs without MongoDB.

use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::{ConversationState, MessageRecord, ProductRecord, Session};
use crate::services::store::{Catalog, HealthCheck, MessageQuery, MessageStore, SessionStore};

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    messages: Vec<MessageRecord>,
}

/// Sessions, messages and a fixed catalog held in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    products: Vec<ProductRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<ProductRecord>) -> Self {
        Self {
            inner: Mutex::default(),
            products,
        }
    }

    /// Every recorded message, in insertion order.
    pub async fn all_messages(&self) -> Vec<MessageRecord> {
        self.inner.lock().await.messages.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, ip: &str) -> Result<Option<Session>, AppError> {
        Ok(self.inner.lock().await.sessions.get(ip).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .sessions
            .insert(session.ip.clone(), session.clone());
        Ok(())
    }

    async fn update_state(&self, ip: &str, state: &ConversationState) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(ip).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No session for identity {}", ip))
        })?;
        session.transition(state.clone());
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append_message(&self, record: &MessageRecord) -> Result<(), AppError> {
        self.inner.lock().await.messages.push(record.clone());
        Ok(())
    }

    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRecord>, AppError> {
        Ok(self
            .inner
            .lock()
            .await
            .messages
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn brands(&self) -> Result<Vec<String>, AppError> {
        let mut brands: Vec<String> = Vec::new();
        for record in &self.products {
            if !brands.contains(&record.brand) {
                brands.push(record.brand.clone());
            }
        }
        Ok(brands)
    }

    async fn products_for_brand(&self, brand: &str) -> Result<Vec<String>, AppError> {
        let brand = brand.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|record| record.brand.to_lowercase() == brand)
            .map(|record| record.product.clone())
            .collect())
    }

    async fn product_details(
        &self,
        brand: &str,
        product: &str,
    ) -> Result<Option<ProductRecord>, AppError> {
        let brand = brand.to_lowercase();
        let product = product.to_lowercase();
        Ok(self
            .products
            .iter()
            .find(|record| {
                record.brand.to_lowercase() == brand && record.product.to_lowercase() == product
            })
            .cloned())
    }
}
