//! Hashtag repository.
//!
//! Names are stored normalized (trimmed, lowercase); callers pass
//! normalized names.

use std::sync::Arc;

use super::write_error;
use crate::entities::{Hashtag, hashtag};
use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::{Expr, OnConflict},
};

/// Hashtag repository for database operations.
#[derive(Clone)]
pub struct HashtagRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl HashtagRepository {
    /// Create a new hashtag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find a hashtag by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<hashtag::Model>> {
        Hashtag::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a hashtag by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<hashtag::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag not found".to_string()))
    }

    /// Find a hashtag by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<hashtag::Model>> {
        Hashtag::find()
            .filter(hashtag::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find hashtags by IDs, in no particular order.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<hashtag::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Hashtag::find()
            .filter(hashtag::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All hashtags, most used first.
    pub async fn find_all(&self) -> AppResult<Vec<hashtag::Model>> {
        Hashtag::find()
            .order_by_desc(hashtag::Column::Count)
            .order_by_asc(hashtag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new hashtag. Fails on a duplicate name.
    pub async fn create(&self, name: &str, count: i32) -> AppResult<hashtag::Model> {
        hashtag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            count: Set(count),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(|e| write_error(e, "Hashtag already exists"))
    }

    /// Get or create a hashtag with a zero count.
    ///
    /// Uses `ON CONFLICT DO NOTHING` so two tweets introducing the same tag
    /// at once both end up with the same row.
    pub async fn get_or_create(&self, name: &str) -> AppResult<hashtag::Model> {
        if let Some(tag) = self.find_by_name(name).await? {
            return Ok(tag);
        }

        let model = hashtag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        Hashtag::insert(model)
            .on_conflict(
                OnConflict::column(hashtag::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_name(name).await?.ok_or_else(|| {
            AppError::Internal(format!("Hashtag {name} vanished after insert"))
        })
    }

    /// Update a hashtag.
    pub async fn update(&self, model: hashtag::ActiveModel) -> AppResult<hashtag::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| write_error(e, "Hashtag already exists"))
    }

    /// Delete a hashtag. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Hashtag::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Increment one hashtag's count atomically and return the new row.
    pub async fn increment(&self, id: &str) -> AppResult<Option<hashtag::Model>> {
        let updated = Hashtag::update_many()
            .col_expr(
                hashtag::Column::Count,
                Expr::col(hashtag::Column::Count).add(1),
            )
            .col_expr(hashtag::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(hashtag::Column::Id.eq(id))
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(updated.into_iter().next())
    }

    /// Increment the count of every listed hashtag (single UPDATE query).
    pub async fn increment_many(&self, ids: &[String]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        Hashtag::update_many()
            .col_expr(
                hashtag::Column::Count,
                Expr::col(hashtag::Column::Count).add(1),
            )
            .filter(hashtag::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the count of every listed hashtag, never going below zero.
    pub async fn decrement_many(&self, ids: &[String]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        Hashtag::update_many()
            .col_expr(hashtag::Column::Count, Expr::cust("GREATEST(count - 1, 0)"))
            .filter(hashtag::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_hashtag(id: &str, name: &str, count: i32) -> hashtag::Model {
        hashtag::Model {
            id: id.to_string(),
            name: name.to_string(),
            count,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_existing() {
        let tag = create_test_hashtag("h1", "rust", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tag]])
                .into_connection(),
        );

        let repo = HashtagRepository::new(db);
        let result = repo.get_or_create("rust").await.unwrap();

        assert_eq!(result.id, "h1");
        assert_eq!(result.count, 3);
    }

    #[tokio::test]
    async fn test_get_or_create_new() {
        let tag = create_test_hashtag("h2", "axum", 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[tag]])
                .into_connection(),
        );

        let repo = HashtagRepository::new(db);
        let result = repo.get_or_create("axum").await.unwrap();

        assert_eq!(result.name, "axum");
        assert_eq!(result.count, 0);
    }

    #[tokio::test]
    async fn test_increment_returns_new_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_hashtag("h1", "rust", 4)]])
                .into_connection(),
        );

        let repo = HashtagRepository::new(db);
        let result = repo.increment("h1").await.unwrap().unwrap();

        assert_eq!(result.count, 4);
    }

    #[tokio::test]
    async fn test_increment_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()])
                .into_connection(),
        );

        let repo = HashtagRepository::new(db);
        assert!(repo.increment("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counter_updates_skip_empty_lists() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = HashtagRepository::new(db);
        repo.increment_many(&[]).await.unwrap();
        repo.decrement_many(&[]).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_hashtag("h1", "rust", 9),
                    create_test_hashtag("h2", "go", 2),
                ]])
                .into_connection(),
        );

        let repo = HashtagRepository::new(db);
        let tags = repo.find_all().await.unwrap();

        assert_eq!(tags[0].name, "rust");
        assert_eq!(tags.len(), 2);
    }
}
