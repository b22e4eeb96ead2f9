use askama::Template;
use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;

use crate::middleware::ClientIdentity;
use crate::startup::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to Laptop Online Assistant. Please state the product name you would like to learn about to obtain the support resources you need or chat with our technicians.<br>Pick One: <br>1. look for specific laptop<br>2. normal issue";

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub welcome: &'static str,
}

/// Chat page. Visiting it opens the identity's session.
pub async fn index(
    State(state): State<AppState>,
    ClientIdentity(ip): ClientIdentity,
) -> Result<impl IntoResponse, AppError> {
    let session = state.router.open_session(&ip).await?;
    tracing::debug!(session_id = %session.session_id, "Serving chat page");

    Ok(IndexTemplate {
        welcome: WELCOME_MESSAGE,
    })
}
