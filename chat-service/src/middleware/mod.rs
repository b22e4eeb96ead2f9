pub mod identity;
pub mod metrics;

pub use identity::ClientIdentity;
pub use metrics::http_metrics_middleware;
