//! Create hashtag table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hashtag::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hashtag::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Hashtag::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Hashtag::Count)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Hashtag::Count).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Hashtag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Hashtag::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hashtag_name")
                    .table(Hashtag::Table)
                    .col(Hashtag::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Listing is ordered by popularity
        manager
            .create_index(
                Index::create()
                    .name("idx_hashtag_count")
                    .table(Hashtag::Table)
                    .col(Hashtag::Count)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Hashtag::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Hashtag {
    Table,
    Id,
    Name,
    Count,
    CreatedAt,
    UpdatedAt,
}
