//! Notification endpoints. Every route requires a token.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use flock_common::AppResult;
use flock_core::{BulkDeleteInput, CreateNotificationInput};
use flock_db::entities::notification;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::NotificationState,
    response::{MessageResponse, created},
};

/// Result of a bulk delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}

async fn list_notifications(
    auth: AuthUser,
    State(state): State<NotificationState>,
) -> AppResult<Json<Vec<notification::Model>>> {
    Ok(Json(state.notification_service.list_for(&auth.id).await?))
}

/// Create a notification for any user.
async fn create_notification(
    auth: AuthUser,
    State(state): State<NotificationState>,
    Json(req): Json<CreateNotificationInput>,
) -> AppResult<(StatusCode, Json<notification::Model>)> {
    tracing::debug!(caller = %auth.id, recipient = %req.user_id, "Creating notification");
    Ok(created(state.notification_service.create(req).await?))
}

async fn delete_notification(
    auth: AuthUser,
    State(state): State<NotificationState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.notification_service.delete(&auth.id, &id).await?;
    Ok(MessageResponse::new("Notification deleted successfully"))
}

async fn delete_notifications(
    auth: AuthUser,
    State(state): State<NotificationState>,
    Json(req): Json<BulkDeleteInput>,
) -> AppResult<Json<BulkDeleteResponse>> {
    let deleted_count = state
        .notification_service
        .delete_bulk(&auth.id, req)
        .await?;

    Ok(Json(BulkDeleteResponse {
        message: format!("{deleted_count} notifications deleted successfully"),
        deleted_count,
    }))
}

pub fn router() -> Router<NotificationState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/bulk", delete(delete_notifications))
        .route("/{id}", delete(delete_notification))
}
