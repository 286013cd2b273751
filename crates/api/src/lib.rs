//! HTTP API layer for flock.
//!
//! Each service gets its own router over a dedicated state:
//!
//! - **Auth**: registration, sessions, profiles, admin user management, follows
//! - **Tweets**: tweets, likes, retweets and hashtags
//! - **Messages**: direct messages between users
//! - **Notifications**: per-user notifications
//!
//! Private routes are guarded by [`middleware::auth_middleware`], which
//! accepts a bearer token or the `jwt` cookie.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::{
    auth_router, banner, messages_router, not_found, notifications_router, tweets_router,
};
pub use middleware::{AuthState, MessageState, NotificationState, TweetState};
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
