//! Conversation routing against the in-memory store and mock engines.

mod common;

use chat_service::models::{ConversationState, MessageMode, ProductSelection, Sender};
use chat_service::services::answer::NO_DETAILS_REPLY;
use chat_service::services::providers::{
    ChatMessage, MockLocalEngine, MockRemoteBehavior, MockRemoteProvider,
};
use chat_service::services::remote::{API_ERROR_REPLY, ASSISTANT_INSTRUCTION};
use chat_service::services::router::{
    CLARIFY_REPLY, INVALID_BRAND_REPLY, REMOTE_SELECTED_REPLY, RESET_REPLY,
};
use chat_service::services::{MemoryStore, SessionRouter};
use common::{BrokenMessageStore, Harness, ReplyRejectingStore, CLIENT_IP};
use service_core::error::AppError;
use std::sync::Arc;

#[tokio::test]
async fn first_contact_creates_exactly_one_session() {
    let harness = Harness::new();

    let first = harness.router.open_session(CLIENT_IP).await.unwrap();
    let second = harness.router.open_session(CLIENT_IP).await.unwrap();

    assert_eq!(first.session_id, second.session_id);
    assert_eq!(harness.store.session_count().await, 1);
    assert_eq!(first.state, ConversationState::Unset);
}

#[tokio::test]
async fn sending_a_message_creates_the_session() {
    let harness = Harness::new();

    harness.send("hello").await;
    harness.send("hello again").await;

    assert_eq!(harness.store.session_count().await, 1);
    let messages = harness.store.all_messages().await;
    let ids: Vec<_> = messages.iter().map(|m| m.session_id.as_str()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn unrecognized_first_message_asks_for_a_mode() {
    let harness = Harness::new();

    let reply = harness.send("hi there").await;

    assert_eq!(reply, CLARIFY_REPLY);
    assert_eq!(harness.state().await, ConversationState::Unset);
}

#[tokio::test]
async fn local_intent_lists_brands() {
    let harness = Harness::new();

    let reply = harness.send("I want to Look For Specific Laptop").await;

    assert_eq!(
        reply,
        "You selected 'specific laptop'. Please choose a brand: Dell, Lenovo"
    );
    assert_eq!(harness.state().await, ConversationState::local());
}

#[tokio::test]
async fn remote_intent_asks_for_the_problem() {
    let harness = Harness::new();

    let reply = harness.send("just a NORMAL ISSUE").await;

    assert_eq!(reply, REMOTE_SELECTED_REPLY);
    assert_eq!(harness.state().await, ConversationState::Remote);
}

#[tokio::test]
async fn mode_selection_exchange_is_tagged_system() {
    let harness = Harness::new();

    harness.send("look for specific laptop").await;

    let messages = harness.store.all_messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].message, "look for specific laptop");
    assert_eq!(messages[1].sender, Sender::Assistance);
    assert!(messages.iter().all(|m| m.mode == MessageMode::System));
}

#[tokio::test]
async fn valid_brand_lists_its_products() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;

    let reply = harness.send("Dell").await;

    assert_eq!(reply, "Available products for Dell: XPS 13, Inspiron 15");
    assert_eq!(
        harness.state().await,
        ConversationState::Local {
            brand: Some("Dell".to_string()),
            product: None,
        }
    );
}

#[tokio::test]
async fn unknown_brand_reprompts_without_state_change() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;

    assert_eq!(harness.send("Acer").await, INVALID_BRAND_REPLY);
    // Brand matching is case-sensitive.
    assert_eq!(harness.send("dell").await, INVALID_BRAND_REPLY);

    assert_eq!(harness.state().await, ConversationState::local());
}

#[tokio::test]
async fn any_product_text_is_accepted() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;

    let reply = harness.send("XPS 99").await;

    assert_eq!(reply, "Ask a question about XPS 99.");
    assert_eq!(
        harness.state().await.product(),
        Some(&ProductSelection {
            name: "XPS 99".to_string(),
            verified: false,
        })
    );
}

#[tokio::test]
async fn known_product_is_marked_verified() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;

    harness.send("xps 13").await;

    let state = harness.state().await;
    let product = state.product().unwrap();
    assert_eq!(product.name, "xps 13");
    assert!(product.verified);
}

#[tokio::test]
async fn questions_reach_the_local_generator_with_selected_product() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;
    harness.send("XPS 13").await;

    let reply = harness.send("How much RAM does it have").await;

    assert_eq!(reply, "The XPS 13 has 16GB of RAM.");
    let prompts = harness.engine.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(
        "Product Details: Brand: Dell, Product: XPS 13, CPU: Intel Core i7-1360P, RAM: 16GB, Weight: 1.2kg"
    ));
    assert!(prompts[0].contains("Question: How much RAM does it have\nAnswer:"));

    let messages = harness.store.all_messages().await;
    let last = messages.last().unwrap();
    assert_eq!(last.sender, Sender::Assistance);
    assert_eq!(last.mode, MessageMode::Local);
    assert_eq!(last.message, "The XPS 13 has 16GB of RAM.");
}

#[tokio::test]
async fn question_about_unknown_product_skips_the_engine() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;
    harness.send("Lenovo").await;
    harness.send("Yoga 9").await;

    let reply = harness.send("Battery life?").await;

    assert_eq!(reply, NO_DETAILS_REPLY);
    assert!(harness.engine.prompts().await.is_empty());
}

#[tokio::test]
async fn back_resets_from_any_state() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;
    harness.send("XPS 13").await;

    let reply = harness.send("  BACK ").await;

    assert_eq!(reply, RESET_REPLY);
    let state = harness.state().await;
    assert_eq!(state, ConversationState::Unset);
    assert!(state.brand().is_none());
    assert!(state.product().is_none());

    // Fresh mode selection afterwards
    assert_eq!(harness.send("normal issue").await, REMOTE_SELECTED_REPLY);
    assert_eq!(harness.send("back").await, RESET_REPLY);
    assert_eq!(harness.state().await, ConversationState::Unset);
}

#[tokio::test]
async fn back_is_recorded_under_the_prior_mode() {
    let harness = Harness::new();
    harness.send("look for specific laptop").await;

    harness.send("back").await;

    let messages = harness.store.all_messages().await;
    let back = &messages[messages.len() - 2];
    let ack = &messages[messages.len() - 1];
    assert_eq!(back.message, "back");
    assert_eq!(back.mode, MessageMode::Local);
    assert_eq!(ack.message, RESET_REPLY);
    assert_eq!(ack.mode, MessageMode::System);
    assert_eq!(ack.sender, Sender::Assistance);
}

#[tokio::test]
async fn back_takes_priority_over_brand_matching() {
    let store = Arc::new(MemoryStore::with_products(vec![
        chat_service::models::ProductRecord::new("back", "Oddity", [("RAM", "4GB")]),
    ]));
    let router = SessionRouter::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(MockLocalEngine::new("unused")),
        Arc::new(MockRemoteProvider::replying("unused")),
    );
    router
        .handle_message(CLIENT_IP, "look for specific laptop")
        .await
        .unwrap();

    let reply = router.handle_message(CLIENT_IP, "back").await.unwrap();

    assert_eq!(reply, RESET_REPLY);
}

#[tokio::test]
async fn remote_history_holds_only_remote_messages_with_instruction_last() {
    let harness = Harness::new();
    // Local traffic first; none of it may reach the remote provider.
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;
    harness.send("back").await;
    harness.send("normal issue").await;

    harness.send("My fan is loud").await;
    harness.send("It is still loud").await;

    let requests = harness.remote.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0],
        vec![
            ChatMessage::user("My fan is loud"),
            ChatMessage::user(ASSISTANT_INSTRUCTION),
        ]
    );
    assert_eq!(
        requests[1],
        vec![
            ChatMessage::user("My fan is loud"),
            ChatMessage::assistant("- Update the BIOS\n- Check the charger"),
            ChatMessage::user("It is still loud"),
            ChatMessage::user(ASSISTANT_INSTRUCTION),
        ]
    );
}

#[tokio::test]
async fn remote_history_excludes_other_identities() {
    let harness = Harness::new();
    let other = "198.51.100.2";
    harness
        .router
        .handle_message(other, "normal issue")
        .await
        .unwrap();
    harness
        .router
        .handle_message(other, "keyboard broken")
        .await
        .unwrap();

    harness.send("normal issue").await;
    harness.send("screen dim").await;

    let requests = harness.remote.requests().await;
    let mine = requests.last().unwrap();
    assert_eq!(
        mine,
        &vec![
            ChatMessage::user("screen dim"),
            ChatMessage::user(ASSISTANT_INSTRUCTION),
        ]
    );
}

#[tokio::test]
async fn remote_reply_is_recorded_as_assistance() {
    let harness = Harness::new();
    harness.send("normal issue").await;

    let reply = harness.send("Battery drains fast").await;

    assert_eq!(reply, "- Update the BIOS\n- Check the charger");
    let messages = harness.store.all_messages().await;
    let tail: Vec<_> = messages
        .iter()
        .rev()
        .take(2)
        .map(|m| (m.sender, m.mode))
        .collect();
    assert_eq!(
        tail,
        vec![
            (Sender::Assistance, MessageMode::Remote),
            (Sender::User, MessageMode::Remote),
        ]
    );
}

#[tokio::test]
async fn remote_transport_error_records_fallback() {
    let harness = Harness::with(
        MockLocalEngine::new("unused"),
        MockRemoteProvider::new(MockRemoteBehavior::TransportError),
    );
    harness.send("normal issue").await;

    let reply = harness.send("Wifi keeps dropping").await;

    assert_eq!(reply, API_ERROR_REPLY);
    let last = harness.store.all_messages().await.pop().unwrap();
    assert_eq!(last.sender, Sender::Assistance);
    assert_eq!(last.mode, MessageMode::Remote);
    assert_eq!(last.message, API_ERROR_REPLY);
}

#[tokio::test]
async fn each_remote_turn_fetches_a_new_token() {
    let harness = Harness::new();
    harness.send("normal issue").await;

    harness.send("one").await;
    harness.send("two").await;
    harness.send("three").await;

    assert_eq!(harness.remote.token_requests(), 3);
}

#[tokio::test]
async fn local_engine_failure_is_a_bad_gateway_and_keeps_the_question() {
    let harness = Harness::with(
        MockLocalEngine::failing(),
        MockRemoteProvider::replying("unused"),
    );
    harness.send("look for specific laptop").await;
    harness.send("Dell").await;
    harness.send("XPS 13").await;

    let err = harness
        .router
        .handle_message(CLIENT_IP, "Weight?")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadGateway(_)));
    let last = harness.store.all_messages().await.pop().unwrap();
    assert_eq!(last.sender, Sender::User);
    assert_eq!(last.message, "Weight?");
}

#[tokio::test]
async fn persistence_failure_fails_the_turn() {
    let store = Arc::new(MemoryStore::with_products(common::sample_catalog()));
    let router = SessionRouter::new(
        store.clone(),
        Arc::new(BrokenMessageStore),
        store.clone(),
        Arc::new(MockLocalEngine::new("unused")),
        Arc::new(MockRemoteProvider::replying("unused")),
    );

    let err = router
        .handle_message(CLIENT_IP, "normal issue")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DatabaseError(_)));
    // Routing stopped before the state could move.
    let session = router.open_session(CLIENT_IP).await.unwrap();
    assert_eq!(session.state, ConversationState::Unset);
}

#[tokio::test]
async fn unrecorded_reply_leaves_state_unchanged() {
    let store = Arc::new(MemoryStore::with_products(common::sample_catalog()));
    let router = SessionRouter::new(
        store.clone(),
        Arc::new(ReplyRejectingStore(store.clone())),
        store.clone(),
        Arc::new(MockLocalEngine::new("unused")),
        Arc::new(MockRemoteProvider::replying("unused")),
    );

    for text in ["look for specific laptop", "normal issue"] {
        let err = router.handle_message(CLIENT_IP, text).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        let session = router.open_session(CLIENT_IP).await.unwrap();
        assert_eq!(session.state, ConversationState::Unset);
    }
    // The user messages made it in, the replies did not.
    let messages = store.all_messages().await;
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.sender == Sender::User));
}

#[tokio::test]
async fn history_is_scoped_to_the_current_session_in_order() {
    let harness = Harness::new();
    assert!(harness.router.history(CLIENT_IP).await.unwrap().is_empty());

    harness.send("look for specific laptop").await;
    harness.send("Dell").await;

    let history = harness.router.history(CLIENT_IP).await.unwrap();
    let texts: Vec<_> = history.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "look for specific laptop",
            "You selected 'specific laptop'. Please choose a brand: Dell, Lenovo",
            "Dell",
            "Available products for Dell: XPS 13, Inspiron 15",
        ]
    );
}

#[tokio::test]
async fn store_message_uses_session_token_when_present() {
    let harness = Harness::new();
    let session = harness.router.open_session(CLIENT_IP).await.unwrap();

    harness
        .router
        .store_message(CLIENT_IP, Sender::Assistance, "Welcome")
        .await
        .unwrap();

    let messages = harness.store.all_messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].session_id, session.session_id);
    assert_eq!(messages[0].mode, MessageMode::System);
    assert_eq!(messages[0].sender, Sender::Assistance);
}

#[tokio::test]
async fn store_message_without_session_does_not_create_one() {
    let harness = Harness::new();

    harness
        .router
        .store_message(CLIENT_IP, Sender::User, "orphan")
        .await
        .unwrap();

    assert_eq!(harness.store.session_count().await, 0);
    let messages = harness.store.all_messages().await;
    assert_eq!(messages[0].session_id.len(), 16);
    // The throwaway token is not the session's, so history stays empty.
    assert!(harness.router.history(CLIENT_IP).await.unwrap().is_empty());
}
