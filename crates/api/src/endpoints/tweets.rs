//! Tweet endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use flock_common::AppResult;
use flock_core::{CreateTweetInput, ReactionInput, TweetView, UpdateTweetInput};

use crate::{
    middleware::TweetState,
    response::{MessageResponse, created},
};

async fn list_tweets(State(state): State<TweetState>) -> AppResult<Json<Vec<TweetView>>> {
    Ok(Json(state.tweet_service.list().await?))
}

async fn create_tweet(
    State(state): State<TweetState>,
    Json(req): Json<CreateTweetInput>,
) -> AppResult<(StatusCode, Json<TweetView>)> {
    Ok(created(state.tweet_service.create(req).await?))
}

async fn get_tweet(
    State(state): State<TweetState>,
    Path(id): Path<String>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.get(&id).await?))
}

async fn update_tweet(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTweetInput>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.update(&id, req).await?))
}

async fn delete_tweet(
    State(state): State<TweetState>,
    Path(id): Path<String>,
) -> AppResult<MessageResponse> {
    state.tweet_service.delete(&id).await?;
    Ok(MessageResponse::new("Tweet deleted successfully"))
}

async fn tweets_by_user(
    State(state): State<TweetState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<TweetView>>> {
    Ok(Json(state.tweet_service.list_by_user(&user_id).await?))
}

async fn tweets_by_hashtag(
    State(state): State<TweetState>,
    Path(hashtag): Path<String>,
) -> AppResult<Json<Vec<TweetView>>> {
    Ok(Json(state.tweet_service.list_by_hashtag(&hashtag).await?))
}

async fn like(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionInput>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.like(&id, req).await?))
}

async fn unlike(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionInput>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.unlike(&id, req).await?))
}

async fn retweet(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionInput>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.retweet(&id, req).await?))
}

async fn unretweet(
    State(state): State<TweetState>,
    Path(id): Path<String>,
    Json(req): Json<ReactionInput>,
) -> AppResult<Json<TweetView>> {
    Ok(Json(state.tweet_service.unretweet(&id, req).await?))
}

pub fn router() -> Router<TweetState> {
    Router::new()
        .route("/", get(list_tweets).post(create_tweet))
        .route("/user/{user_id}", get(tweets_by_user))
        .route("/hashtag/{hashtag}", get(tweets_by_hashtag))
        .route(
            "/{id}",
            get(get_tweet).put(update_tweet).delete(delete_tweet),
        )
        // Reactions accept PATCH as well
        .route("/{id}/like", post(like).patch(like))
        .route("/{id}/unlike", post(unlike).patch(unlike))
        .route("/{id}/retweet", post(retweet).patch(retweet))
        .route("/{id}/unretweet", post(unretweet).patch(unretweet))
}
