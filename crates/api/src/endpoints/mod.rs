//! API endpoints, grouped into one router per service.

mod following;
mod hashtags;
mod health;
mod messages;
mod notifications;
mod tweets;
mod users;

use axum::{Router, middleware::from_fn_with_state};

pub use following::{FollowersResponse, FollowingResponse, UserSummary};
pub use health::{banner, not_found};
pub use notifications::BulkDeleteResponse;
pub use users::AuthResponse;

use crate::middleware::{
    AuthState, MessageState, NotificationState, TweetState, auth_middleware,
};

/// Users, sessions and follow edges.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .nest("/api/users", users::router(&state))
        .nest("/api/follow", following::router(&state))
        .merge(health::router::<AuthState>())
        .with_state(state)
}

/// Tweets, reactions and hashtags. These routes are public.
pub fn tweets_router(state: TweetState) -> Router {
    Router::new()
        .nest("/api/tweets", tweets::router())
        .nest("/api/hashtags", hashtags::router())
        .merge(health::router::<TweetState>())
        .with_state(state)
}

/// Direct messages.
pub fn messages_router(state: MessageState) -> Router {
    let api = messages::router()
        .route_layer(from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .nest("/api/messages", api)
        .merge(health::router::<MessageState>())
        .with_state(state)
}

/// Notifications.
pub fn notifications_router(state: NotificationState) -> Router {
    let api = notifications::router()
        .route_layer(from_fn_with_state(state.jwt.clone(), auth_middleware));

    Router::new()
        .nest("/api/notifications", api)
        .merge(health::router::<NotificationState>())
        .with_state(state)
}
