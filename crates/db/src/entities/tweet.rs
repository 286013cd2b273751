//! Tweet entity.

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::IdList;

/// One like embedded in a tweet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub user_id: String,
    pub liked_at: DateTime<Utc>,
}

/// One retweet embedded in a tweet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retweet {
    pub user_id: String,
    pub retweeted_at: DateTime<Utc>,
}

/// JSONB array of likes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct LikeList(pub Vec<Like>);

/// JSONB array of retweets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct RetweetList(pub Vec<Retweet>);

impl LikeList {
    /// Whether `user_id` has liked.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.0.iter().any(|l| l.user_id == user_id)
    }
}

impl RetweetList {
    /// Whether `user_id` has retweeted.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.0.iter().any(|r| r.user_id == user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tweet")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub liked_by: LikeList,

    #[sea_orm(column_type = "JsonBinary")]
    pub retweeted_by: RetweetList,

    /// Referenced hashtag IDs
    #[sea_orm(column_type = "JsonBinary")]
    pub hashtag_ids: IdList,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
