//! Follow endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
};
use flock_common::AppResult;
use flock_db::entities::user;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::{AuthState, auth_middleware},
    response::MessageResponse,
};

/// Public view of a user in follow lists.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Followers of a user with their count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowersResponse {
    pub followers: Vec<UserSummary>,
    pub followers_count: usize,
}

/// Users a user follows with their count.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingResponse {
    pub following: Vec<UserSummary>,
    pub following_count: usize,
}

async fn follow(
    auth: AuthUser,
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> AppResult<MessageResponse> {
    let followee = state.following_service.follow(&auth.id, &user_id).await?;
    Ok(MessageResponse::new(format!(
        "You are now following {}",
        followee.username
    )))
}

async fn unfollow(
    auth: AuthUser,
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> AppResult<MessageResponse> {
    let followee = state.following_service.unfollow(&auth.id, &user_id).await?;
    Ok(MessageResponse::new(format!(
        "You have unfollowed {}",
        followee.username
    )))
}

async fn followers(
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<FollowersResponse>> {
    let followers: Vec<UserSummary> = state
        .following_service
        .followers(&user_id)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(FollowersResponse {
        followers_count: followers.len(),
        followers,
    }))
}

async fn following(
    State(state): State<AuthState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<FollowingResponse>> {
    let following: Vec<UserSummary> = state
        .following_service
        .following(&user_id)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    Ok(Json(FollowingResponse {
        following_count: following.len(),
        following,
    }))
}

pub fn router(state: &AuthState) -> Router<AuthState> {
    let private = Router::new()
        .route("/{user_id}", post(follow).delete(unfollow))
        .route_layer(from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .route("/{user_id}/followers", get(followers))
        .route("/{user_id}/following", get(following))
        .merge(private)
}
