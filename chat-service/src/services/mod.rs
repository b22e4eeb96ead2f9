pub mod answer;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod providers;
pub mod remote;
pub mod router;
pub mod store;

pub use answer::LocalAnswerGenerator;
pub use database::ChatDb;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use remote::RemoteAnswerGenerator;
pub use router::SessionRouter;
pub use store::{Catalog, HealthCheck, MessageQuery, MessageStore, SessionStore};
