//! MongoDB persistence for sessions, message history and the product catalog.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::product::{BRAND_FIELD, PRODUCT_FIELD};
use crate::models::{ConversationState, MessageRecord, ProductRecord, Session};
use crate::services::store::{Catalog, HealthCheck, MessageQuery, MessageStore, SessionStore};

#[derive(Clone)]
pub struct ChatDb {
    client: MongoClient,
    chat_db: Database,
    product_db: Database,
}

fn db_error(context: &str, e: impl std::fmt::Display) -> AppError {
    tracing::error!("{}: {}", context, e);
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

/// Case-insensitive whole-value match; user input is escaped.
pub fn exact_match_ci(value: &str) -> Document {
    doc! {
        "$regex": format!("^{}$", regex::escape(value)),
        "$options": "i",
    }
}

/// Lookup index on `sessions.ip`.
///
/// Not unique: collections written before this service may hold duplicate
/// rows for one identity, and creation is already last-write-wins.
pub fn session_ip_index() -> IndexModel {
    IndexModel::builder()
        .keys(doc! { "ip": 1 })
        .options(IndexOptions::builder().name("ip_idx".to_string()).build())
        .build()
}

impl ChatDb {
    pub async fn connect(
        uri: &str,
        chat_database: &str,
        product_database: &str,
    ) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("Failed to connect to MongoDB", e))?;
        let chat_db = client.database(chat_database);
        let product_db = client.database(product_database);
        tracing::info!(
            chat_database = %chat_database,
            product_database = %product_database,
            "Successfully connected to MongoDB"
        );
        Ok(Self {
            client,
            chat_db,
            product_db,
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for chat-service");

        self.sessions()
            .create_index(session_ip_index(), None)
            .await
            .map_err(|e| db_error("Failed to create sessions ip index", e))?;

        // Remote-flow context: all of an identity's messages in one mode
        let ip_mode_index = IndexModel::builder()
            .keys(doc! { "ip": 1, "mode": 1 })
            .options(
                IndexOptions::builder()
                    .name("ip_mode_idx".to_string())
                    .build(),
            )
            .build();

        // Page history: one identity's current session
        let ip_session_index = IndexModel::builder()
            .keys(doc! { "ip": 1, "session_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("ip_session_idx".to_string())
                    .build(),
            )
            .build();

        self.messages()
            .create_indexes(vec![ip_mode_index, ip_session_index], None)
            .await
            .map_err(|e| db_error("Failed to create messages indexes", e))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    // Collection accessors

    pub fn sessions(&self) -> Collection<Session> {
        self.chat_db.collection("sessions")
    }

    pub fn messages(&self) -> Collection<MessageRecord> {
        self.chat_db.collection("messages")
    }

    pub fn products(&self) -> Collection<Document> {
        self.product_db.collection("products")
    }
}

#[async_trait]
impl HealthCheck for ChatDb {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("MongoDB health check failed", e))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for ChatDb {
    async fn find_session(&self, ip: &str) -> Result<Option<Session>, AppError> {
        self.sessions()
            .find_one(doc! { "ip": ip }, None)
            .await
            .map_err(|e| db_error("Failed to find session", e))
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.sessions()
            .replace_one(doc! { "ip": &session.ip }, session, options)
            .await
            .map_err(|e| db_error("Failed to insert session", e))?;
        Ok(())
    }

    async fn update_state(&self, ip: &str, state: &ConversationState) -> Result<(), AppError> {
        let state_doc = mongodb::bson::to_bson(state)
            .map_err(|e| db_error("Failed to serialize conversation state", e))?;

        let result = self
            .sessions()
            .update_one(
                doc! { "ip": ip },
                doc! {
                    "$set": {
                        "state": state_doc,
                        "updated_at": BsonDateTime::now().timestamp_millis(),
                    }
                },
                None,
            )
            .await
            .map_err(|e| db_error("Failed to update session state", e))?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "No session for identity {}",
                ip
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for ChatDb {
    async fn append_message(&self, record: &MessageRecord) -> Result<(), AppError> {
        self.messages()
            .insert_one(record, None)
            .await
            .map_err(|e| db_error("Failed to record message", e))?;
        Ok(())
    }

    async fn find_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRecord>, AppError> {
        let mut filter = doc! { "ip": &query.ip };
        if let Some(session_id) = &query.session_id {
            filter.insert("session_id", session_id);
        }
        if let Some(mode) = query.mode {
            filter.insert("mode", mode.as_str());
        }

        // ObjectIds are assigned at insert time, so `_id` order is insertion order
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();

        let cursor = self
            .messages()
            .find(filter, options)
            .await
            .map_err(|e| db_error("Failed to query messages", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to collect messages", e))
    }
}

#[async_trait]
impl Catalog for ChatDb {
    async fn brands(&self) -> Result<Vec<String>, AppError> {
        let values = self
            .products()
            .distinct(BRAND_FIELD, None, None)
            .await
            .map_err(|e| db_error("Failed to list brands", e))?;

        Ok(values
            .into_iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect())
    }

    async fn products_for_brand(&self, brand: &str) -> Result<Vec<String>, AppError> {
        let cursor = self
            .products()
            .find(doc! { BRAND_FIELD: exact_match_ci(brand) }, None)
            .await
            .map_err(|e| db_error("Failed to query products", e))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to collect products", e))?;

        Ok(documents
            .iter()
            .filter_map(|d| d.get_str(PRODUCT_FIELD).ok().map(str::to_string))
            .collect())
    }

    async fn product_details(
        &self,
        brand: &str,
        product: &str,
    ) -> Result<Option<ProductRecord>, AppError> {
        let document = self
            .products()
            .find_one(
                doc! {
                    BRAND_FIELD: exact_match_ci(brand),
                    PRODUCT_FIELD: exact_match_ci(product),
                },
                None,
            )
            .await
            .map_err(|e| db_error("Failed to load product details", e))?;

        Ok(document.as_ref().and_then(ProductRecord::from_document))
    }
}
