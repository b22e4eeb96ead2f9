pub mod chat;

pub use chat::{
    HistoryEntry, HistoryResponse, ReplyResponse, SendMessageRequest, StoreMessageRequest,
    StoreMessageResponse,
};
