pub mod chat;
pub mod health;
pub mod page;

pub use chat::{get_history, send_message, store_message};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use page::index;
