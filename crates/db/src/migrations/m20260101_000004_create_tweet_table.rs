//! Create tweet table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tweet::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tweet::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Tweet::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Tweet::Title).string_len(512).not_null())
                    .col(ColumnDef::new(Tweet::Content).text().not_null())
                    .col(
                        ColumnDef::new(Tweet::LikedBy)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Tweet::RetweetedBy)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Tweet::HashtagIds)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Tweet::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Tweet::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tweet_user_id")
                    .table(Tweet::Table)
                    .col(Tweet::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tweet_created_at")
                    .table(Tweet::Table)
                    .col(Tweet::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // GIN index for `hashtag_ids @> '["id"]'` lookups
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_tweet_hashtag_ids ON tweet USING GIN (hashtag_ids)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tweet::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tweet {
    Table,
    Id,
    UserId,
    Title,
    Content,
    LikedBy,
    RetweetedBy,
    HashtagIds,
    CreatedAt,
    UpdatedAt,
}
