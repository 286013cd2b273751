//! Hashtag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hashtag with a usage counter.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "hashtag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Trimmed, lowercase, without the leading `#`
    #[sea_orm(unique)]
    pub name: String,

    /// Number of tweets using this hashtag (never negative)
    #[sea_orm(default_value = 0)]
    pub count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
