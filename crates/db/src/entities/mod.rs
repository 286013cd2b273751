//! Database entities.
//!
//! Each entity is a self-contained document: relationships that the
//! services read together (follow lists, likes, hashtag references) are
//! stored inline as JSONB arrays.

pub mod follow;
pub mod hashtag;
pub mod id_list;
pub mod message;
pub mod notification;
pub mod tweet;
pub mod user;

pub use follow::Entity as Follow;
pub use hashtag::Entity as Hashtag;
pub use id_list::IdList;
pub use message::Entity as Message;
pub use notification::Entity as Notification;
pub use tweet::Entity as Tweet;
pub use user::Entity as User;
