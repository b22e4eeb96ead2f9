//! Per-message conversation routing.
//!
//! Every turn follows the same shape: resolve the identity's session, record
//! the user's message under the current mode tag, pick a reply from the
//! session's [`ConversationState`], record the reply and hand it back.
//! Nothing is sent to an answer generator before the user's message is
//! stored.

use service_core::error::AppError;
use std::sync::Arc;

use crate::models::{
    new_session_token, ConversationState, MessageMode, MessageRecord, ProductSelection, Sender,
    Session,
};
use crate::services::answer::LocalAnswerGenerator;
use crate::services::metrics;
use crate::services::providers::{LocalEngine, RemoteChatProvider};
use crate::services::remote::RemoteAnswerGenerator;
use crate::services::store::{Catalog, MessageQuery, MessageStore, SessionStore};

pub const RESET_KEYWORD: &str = "back";
pub const LOCAL_INTENT: &str = "look for specific laptop";
pub const REMOTE_INTENT: &str = "normal issue";

pub const RESET_REPLY: &str =
    "Session reset. Please choose 'look for specific laptop' or 'normal issue'.";
pub const CLARIFY_REPLY: &str = "Please choose 'look for specific laptop' or 'normal issue'.";
pub const REMOTE_SELECTED_REPLY: &str =
    "You selected 'normal issue'. Please describe your problem.";
pub const INVALID_BRAND_REPLY: &str = "Please choose a valid brand from the list.";

/// A reply, the label it is counted under and the state it moves to.
struct Turn {
    reply: String,
    outcome: &'static str,
    next: Option<ConversationState>,
}

impl Turn {
    fn new(reply: impl Into<String>, outcome: &'static str) -> Self {
        Self {
            reply: reply.into(),
            outcome,
            next: None,
        }
    }

    fn moving_to(mut self, state: ConversationState) -> Self {
        self.next = Some(state);
        self
    }
}

pub struct SessionRouter {
    sessions: Arc<dyn SessionStore>,
    messages: Arc<dyn MessageStore>,
    catalog: Arc<dyn Catalog>,
    local: LocalAnswerGenerator,
    remote: RemoteAnswerGenerator,
}

impl SessionRouter {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        messages: Arc<dyn MessageStore>,
        catalog: Arc<dyn Catalog>,
        engine: Arc<dyn LocalEngine>,
        remote: Arc<dyn RemoteChatProvider>,
    ) -> Self {
        Self {
            sessions,
            messages,
            local: LocalAnswerGenerator::new(catalog.clone(), engine),
            remote: RemoteAnswerGenerator::new(remote),
            catalog,
        }
    }

    /// Return the identity's session, creating it on first contact.
    pub async fn open_session(&self, ip: &str) -> Result<Session, AppError> {
        if let Some(session) = self.sessions.find_session(ip).await? {
            return Ok(session);
        }

        let session = Session::new(ip);
        self.sessions.insert_session(&session).await?;
        tracing::info!(ip = %ip, session_id = %session.session_id, "Created chat session");
        Ok(session)
    }

    /// Route one user message and return the reply.
    #[tracing::instrument(skip(self, text), fields(session_id = tracing::field::Empty))]
    pub async fn handle_message(&self, ip: &str, text: &str) -> Result<String, AppError> {
        let text = text.trim();
        let mut session = self.open_session(ip).await?;
        tracing::Span::current().record("session_id", session.session_id.as_str());

        let mode = session.state.message_mode();
        self.record(&session, mode, Sender::User, text).await?;

        if text.to_lowercase() == RESET_KEYWORD {
            self.record(&session, MessageMode::System, Sender::Assistance, RESET_REPLY)
                .await?;
            session.reset();
            self.sessions.update_state(ip, &session.state).await?;
            metrics::record_turn(mode.as_str(), "reset");
            tracing::info!(previous_mode = %mode, "Session reset");
            return Ok(RESET_REPLY.to_string());
        }

        let turn = match session.state.clone() {
            ConversationState::Unset => self.select_mode(text).await?,
            ConversationState::Local { brand: None, .. } => self.select_brand(text).await?,
            ConversationState::Local {
                brand: Some(brand),
                product: None,
            } => self.select_product(&brand, text).await?,
            ConversationState::Local {
                brand: Some(brand),
                product: Some(product),
            } => {
                let reply = self.local.answer(&brand, &product.name, text).await?;
                Turn::new(reply, "local_answer")
            }
            ConversationState::Remote => {
                let history = self
                    .messages
                    .find_messages(&MessageQuery::mode(ip, MessageMode::Remote))
                    .await?;
                Turn::new(self.remote.reply(&history).await, "remote_answer")
            }
        };

        // The reply is stored before the state moves, so a failed write
        // leaves the conversation where it was.
        self.record(&session, mode, Sender::Assistance, &turn.reply)
            .await?;
        if let Some(next) = turn.next {
            session.transition(next);
            self.sessions.update_state(ip, &session.state).await?;
        }
        metrics::record_turn(mode.as_str(), turn.outcome);
        tracing::debug!(mode = %mode, outcome = turn.outcome, "Reply recorded");

        Ok(turn.reply)
    }

    /// Messages of the identity's current session, oldest first.
    pub async fn history(&self, ip: &str) -> Result<Vec<MessageRecord>, AppError> {
        match self.sessions.find_session(ip).await? {
            Some(session) => {
                self.messages
                    .find_messages(&MessageQuery::session(ip, session.session_id))
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Record a message on behalf of the page without routing it.
    ///
    /// Without a session the record gets a throwaway token; no session is
    /// created.
    pub async fn store_message(
        &self,
        ip: &str,
        sender: Sender,
        text: &str,
    ) -> Result<(), AppError> {
        let session_id = match self.sessions.find_session(ip).await? {
            Some(session) => session.session_id,
            None => new_session_token(),
        };

        let record = MessageRecord::new(ip, session_id, MessageMode::System, sender, text);
        self.messages.append_message(&record).await
    }

    async fn select_mode(&self, text: &str) -> Result<Turn, AppError> {
        let lowered = text.to_lowercase();

        if lowered.contains(LOCAL_INTENT) {
            let brands = self.catalog.brands().await?;
            return Ok(Turn::new(
                format!(
                    "You selected 'specific laptop'. Please choose a brand: {}",
                    brands.join(", ")
                ),
                "local_selected",
            )
            .moving_to(ConversationState::local()));
        }

        if lowered.contains(REMOTE_INTENT) {
            return Ok(Turn::new(REMOTE_SELECTED_REPLY, "remote_selected")
                .moving_to(ConversationState::Remote));
        }

        Ok(Turn::new(CLARIFY_REPLY, "clarify"))
    }

    /// Brand names must match the catalog exactly, including case.
    async fn select_brand(&self, text: &str) -> Result<Turn, AppError> {
        let brands = self.catalog.brands().await?;
        if !brands.iter().any(|brand| brand == text) {
            return Ok(Turn::new(INVALID_BRAND_REPLY, "invalid_brand"));
        }

        let products = self.catalog.products_for_brand(text).await?;

        Ok(Turn::new(
            format!("Available products for {}: {}", text, products.join(", ")),
            "brand_selected",
        )
        .moving_to(ConversationState::Local {
            brand: Some(text.to_string()),
            product: None,
        }))
    }

    /// Any product text is accepted; `verified` notes whether the catalog knows it.
    async fn select_product(&self, brand: &str, text: &str) -> Result<Turn, AppError> {
        let verified = self.catalog.product_details(brand, text).await?.is_some();
        if !verified {
            tracing::info!(
                brand = %brand,
                product = %text,
                "Product not in catalog, accepting anyway"
            );
        }

        Ok(
            Turn::new(format!("Ask a question about {}.", text), "product_selected").moving_to(
                ConversationState::Local {
                    brand: Some(brand.to_string()),
                    product: Some(ProductSelection {
                        name: text.to_string(),
                        verified,
                    }),
                },
            ),
        )
    }

    async fn record(
        &self,
        session: &Session,
        mode: MessageMode,
        sender: Sender,
        text: &str,
    ) -> Result<(), AppError> {
        let record = MessageRecord::new(
            session.ip.as_str(),
            session.session_id.as_str(),
            mode,
            sender,
            text,
        );
        self.messages.append_message(&record).await
    }
}
