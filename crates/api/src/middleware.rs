//! Service state and authentication middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use flock_common::{AppError, Config, JwtKeys};
use flock_core::{
    FollowingService, HashtagService, MessageService, NotificationService, TweetService,
    UserService,
};
use flock_db::repositories::{
    FollowRepository, HashtagRepository, MessageRepository, NotificationRepository,
    TweetRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

use crate::rate_limit::RateLimiterState;

/// Name of the cookie carrying the session token.
pub const JWT_COOKIE: &str = "jwt";

/// State of the auth service.
#[derive(Clone)]
pub struct AuthState {
    pub user_service: UserService,
    pub following_service: FollowingService,
    pub jwt: JwtKeys,
    pub secure_cookie: bool,
    pub rate_limiter: RateLimiterState,
}

impl AuthState {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(db);

        Self {
            user_service: UserService::new(user_repo.clone()),
            following_service: FollowingService::new(follow_repo, user_repo),
            jwt: JwtKeys::from_config(&config.auth),
            secure_cookie: config.auth.secure_cookie,
            rate_limiter: RateLimiterState::new(config.server.trust_proxy_headers),
        }
    }
}

/// State of the tweet service.
#[derive(Clone)]
pub struct TweetState {
    pub tweet_service: TweetService,
    pub hashtag_service: HashtagService,
}

impl TweetState {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let hashtag_service = HashtagService::new(HashtagRepository::new(Arc::clone(&db)));

        Self {
            tweet_service: TweetService::new(TweetRepository::new(db), hashtag_service.clone()),
            hashtag_service,
        }
    }
}

/// State of the message service.
#[derive(Clone)]
pub struct MessageState {
    pub message_service: MessageService,
    pub jwt: JwtKeys,
}

impl MessageState {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        Self {
            message_service: MessageService::new(MessageRepository::new(db)),
            jwt: JwtKeys::from_config(&config.auth),
        }
    }
}

/// State of the notification service.
#[derive(Clone)]
pub struct NotificationState {
    pub notification_service: NotificationService,
    pub jwt: JwtKeys,
}

impl NotificationState {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        Self {
            notification_service: NotificationService::new(NotificationRepository::new(db)),
            jwt: JwtKeys::from_config(&config.auth),
        }
    }
}

/// Require a valid token from the `Authorization: Bearer` header or the
/// `jwt` cookie, and expose its claims to handlers.
pub async fn auth_middleware(
    State(jwt): State<JwtKeys>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .or_else(|| jar.get(JWT_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let claims = jwt.verify(&token)?;
    tracing::trace!(user_id = %claims.sub, "Authenticated request");
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string())
}
