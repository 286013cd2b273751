//! Hashtag endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use flock_common::AppResult;
use flock_core::{CreateHashtagInput, UpdateHashtagInput};
use flock_db::entities::hashtag;

use crate::{
    middleware::TweetState,
    response::{MessageResponse, created},
};

/// All hashtags, most used first.
async fn list_hashtags(State(state): State<TweetState>) -> AppResult<Json<Vec<hashtag::Model>>> {
    Ok(Json(state.hashtag_service.list().await?))
}

async fn create_hashtag(
    State(state): State<TweetState>,
    Json(req): Json<CreateHashtagInput>,
) -> AppResult<(StatusCode, Json<hashtag::Model>)> {
    Ok(created(state.hashtag_service.create(req).await?))
}

async fn get_hashtag(
    State(state): State<TweetState>,
    Path(id): Path<String>,
) -> AppResult<Json<hashtag::Model>> {
    Ok(Json(state.hashtag_service.get(&id).await?))
}

async fn update_hashtag(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateHashtagInput>,
) -> AppResult<Json<hashtag::Model>> {
    Ok(Json(state.hashtag_service.update(&id, req).await?))
}

async fn delete_hashtag(
    State(state): State<TweetState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.hashtag_service.delete(&id).await?;
    Ok(MessageResponse::new("Hashtag deleted successfully"))
}

async fn increment_hashtag(
    State(state): State<TweetState>,
    Path(id): Path<String>,
) -> AppResult<Json<hashtag::Model>> {
    Ok(Json(state.hashtag_service.increment(&id).await?))
}

pub fn router() -> Router<TweetState> {
    Router::new()
        .route("/", get(list_hashtags).post(create_hashtag))
        .route(
            "/{id}",
            get(get_hashtag).put(update_hashtag).delete(delete_hashtag),
        )
        .route("/{id}/increment", patch(increment_hashtag))
}
