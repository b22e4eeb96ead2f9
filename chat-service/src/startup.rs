//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, security_headers_middleware, RequestId,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ChatConfig;
use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::providers::{
    BaiduChatProvider, LlamaServerEngine, LocalEngine, RemoteChatProvider,
};
use crate::services::{ChatDb, HealthCheck, SessionRouter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SessionRouter>,
    pub health: Arc<dyn HealthCheck>,
    pub static_dir: PathBuf,
}

/// Routes plus the middleware stack, ready to serve.
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/send_message", post(handlers::send_message))
        .route("/get_history", get(handlers::get_history))
        .route("/store_message", post(handlers::store_message))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest_service("/static", static_files)
        .route_layer(from_fn(http_metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(|id| id.0.as_str())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    client_ip = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Connect to MongoDB, construct the answer engines and bind the listener.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let db = ChatDb::connect(
            &config.mongodb.uri,
            &config.mongodb.chat_database,
            &config.mongodb.product_database,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            e
        })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let engine: Arc<dyn LocalEngine> = Arc::new(
            LlamaServerEngine::new(&config.llama.server_url)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );
        tracing::info!(endpoint = %config.llama.server_url, "Initialized local answer engine");

        let remote: Arc<dyn RemoteChatProvider> = Arc::new(
            BaiduChatProvider::new(config.baidu.clone())
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );
        tracing::info!(endpoint = %config.baidu.chat_url, "Initialized remote chat provider");

        let db = Arc::new(db);
        let router = SessionRouter::new(db.clone(), db.clone(), db.clone(), engine, remote);

        let state = AppState {
            router: Arc::new(router),
            health: db,
            static_dir: config.web.static_dir.clone(),
        };

        // Port 0 picks a random port for tests
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!("Chat service listening on port {}", http_port);

        Ok(Self {
            http_port,
            listener,
            state,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Serve until SIGINT/SIGTERM. Peer addresses are attached to every
    /// request so handlers can resolve the client identity.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let app = build_router(self.state);

        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
