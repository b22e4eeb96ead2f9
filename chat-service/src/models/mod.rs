//! Domain models for the chat service.

pub mod message;
pub mod product;
pub mod session;

pub use message::{MessageMode, MessageRecord, Sender};
pub use product::ProductRecord;
pub use session::{new_session_token, ConversationState, ProductSelection, Session};
