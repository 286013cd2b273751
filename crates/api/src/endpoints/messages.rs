//! Direct message endpoints. Every route requires a token.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use flock_common::AppResult;
use flock_core::{CreateMessageInput, UpdateMessageInput};
use flock_db::entities::message;

use crate::{
    extractors::AuthUser,
    middleware::MessageState,
    response::{MessageResponse, created},
};

async fn send_message(
    auth: AuthUser,
    State(state): State<MessageState>,
    Json(req): Json<CreateMessageInput>,
) -> AppResult<(StatusCode, Json<message::Model>)> {
    Ok(created(state.message_service.send(&auth.id, req).await?))
}

/// Messages the caller sent or received, newest first.
async fn list_messages(
    auth: AuthUser,
    State(state): State<MessageState>,
) -> AppResult<Json<Vec<message::Model>>> {
    Ok(Json(state.message_service.list_for(&auth.id).await?))
}

async fn get_message(
    auth: AuthUser,
    State(state): State<MessageState>,
    Path(id): Path<String>,
) -> AppResult<Json<message::Model>> {
    Ok(Json(state.message_service.get(&auth.id, &id).await?))
}

async fn update_message(
    auth: AuthUser,
    State(state): State<MessageState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMessageInput>,
) -> AppResult<Json<message::Model>> {
    Ok(Json(state.message_service.update(&auth.id, &id, req).await?))
}

async fn delete_message(
    auth: AuthUser,
    State(state): State<MessageState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.message_service.delete(&auth.id, &id).await?;
    Ok(MessageResponse::new("Message deleted successfully"))
}

pub fn router() -> Router<MessageState> {
    Router::new()
        .route("/", get(list_messages).post(send_message))
        .route(
            "/{id}",
            get(get_message).put(update_message).delete(delete_message),
        )
}
