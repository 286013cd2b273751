//! Repository layer for database operations.

use flock_common::AppError;
use sea_orm::{DbErr, SqlErr};

mod follow;
mod hashtag;
mod message;
mod notification;
mod tweet;
mod user;

pub use follow::{FollowChange, FollowRepository};
pub use hashtag::HashtagRepository;
pub use message::MessageRepository;
pub use notification::NotificationRepository;
pub use tweet::{ReactionChange, TweetRepository};
pub use user::UserRepository;

/// Map a failed insert or update. A unique index violation means a
/// concurrent writer took the key first and is reported as `duplicate`.
fn write_error(err: DbErr, duplicate: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::BadRequest(duplicate.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}
