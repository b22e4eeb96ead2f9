use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use validator::{ValidationError, ValidationErrors};

use crate::dtos::{
    HistoryEntry, HistoryResponse, ReplyResponse, SendMessageRequest, StoreMessageRequest,
    StoreMessageResponse,
};
use crate::middleware::ClientIdentity;
use crate::models::Sender;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

pub async fn send_message(
    State(state): State<AppState>,
    ClientIdentity(ip): ClientIdentity,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Message must not be empty"
        )));
    }

    let reply = state.router.handle_message(&ip, &req.message).await?;

    Ok(Json(ReplyResponse { reply }))
}

pub async fn get_history(
    State(state): State<AppState>,
    ClientIdentity(ip): ClientIdentity,
) -> Result<impl IntoResponse, AppError> {
    let history = state
        .router
        .history(&ip)
        .await?
        .into_iter()
        .map(HistoryEntry::from)
        .collect();

    Ok(Json(HistoryResponse { history }))
}

pub async fn store_message(
    State(state): State<AppState>,
    ClientIdentity(ip): ClientIdentity,
    ValidatedJson(req): ValidatedJson<StoreMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let sender = match req.sender.as_deref() {
        None => Sender::User,
        Some(raw) => raw.parse::<Sender>().map_err(|_| {
            let mut errors = ValidationErrors::new();
            errors.add("sender", ValidationError::new("unknown_sender"));
            AppError::ValidationError(errors)
        })?,
    };

    state
        .router
        .store_message(&ip, sender, &req.message)
        .await?;

    Ok(Json(StoreMessageResponse::success()))
}
