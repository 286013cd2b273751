//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::IdList;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Always stored lowercase
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    /// Users this user follows
    #[sea_orm(column_type = "JsonBinary")]
    pub following: IdList,

    /// Users following this user
    #[sea_orm(column_type = "JsonBinary")]
    pub followers: IdList,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
