//! Business logic services.

#![allow(missing_docs)]

pub mod following;
pub mod hashtag;
pub mod message;
pub mod notification;
pub mod tweet;
pub mod user;

pub use following::FollowingService;
pub use hashtag::{CreateHashtagInput, HashtagService, UpdateHashtagInput, normalize_hashtag};
pub use message::{CreateMessageInput, MessageService, UpdateMessageInput};
pub use notification::{BulkDeleteInput, CreateNotificationInput, NotificationService};
pub use tweet::{CreateTweetInput, ReactionInput, TweetService, TweetView, UpdateTweetInput};
pub use user::{AdminUpdateUserInput, LoginInput, RegisterInput, UpdateProfileInput, UserService};
