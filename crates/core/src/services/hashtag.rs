//! Hashtag service.

use std::collections::HashSet;

use chrono::Utc;
use flock_common::{AppError, AppResult};
use flock_db::{entities::hashtag, repositories::HashtagRepository};
use sea_orm::Set;
use serde::Deserialize;

/// Hashtag service for business logic.
#[derive(Clone)]
pub struct HashtagService {
    hashtag_repo: HashtagRepository,
}

/// Input for creating a hashtag.
#[derive(Debug, Default, Deserialize)]
pub struct CreateHashtagInput {
    pub title: Option<String>,
}

/// Input for updating a hashtag.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateHashtagInput {
    pub title: Option<String>,
    pub count: Option<i32>,
}

/// Normalize a hashtag name: trimmed, without a leading `#`, lowercase.
#[must_use]
pub fn normalize_hashtag(name: &str) -> String {
    name.trim().trim_start_matches('#').trim().to_lowercase()
}

impl HashtagService {
    /// Create a new hashtag service.
    #[must_use]
    pub const fn new(hashtag_repo: HashtagRepository) -> Self {
        Self { hashtag_repo }
    }

    /// All hashtags, most used first.
    pub async fn list(&self) -> AppResult<Vec<hashtag::Model>> {
        self.hashtag_repo.find_all().await
    }

    /// Get a hashtag by ID.
    pub async fn get(&self, id: &str) -> AppResult<hashtag::Model> {
        self.hashtag_repo.get_by_id(id).await
    }

    /// Get a hashtag by name.
    pub async fn get_by_name(&self, name: &str) -> AppResult<hashtag::Model> {
        self.hashtag_repo
            .find_by_name(&normalize_hashtag(name))
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag not found".to_string()))
    }

    /// Create a hashtag with a count of one.
    pub async fn create(&self, input: CreateHashtagInput) -> AppResult<hashtag::Model> {
        let name = input
            .title
            .as_deref()
            .map(normalize_hashtag)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::BadRequest("Hashtag title is required".to_string()))?;

        if self.hashtag_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::BadRequest("Hashtag already exists".to_string()));
        }

        self.hashtag_repo.create(&name, 1).await
    }

    /// Rename a hashtag or overwrite its count.
    pub async fn update(&self, id: &str, input: UpdateHashtagInput) -> AppResult<hashtag::Model> {
        let tag = self.hashtag_repo.get_by_id(id).await?;

        let name = input
            .title
            .as_deref()
            .map(normalize_hashtag)
            .filter(|n| !n.is_empty() && *n != tag.name);

        if let Some(name) = &name
            && self.hashtag_repo.find_by_name(name).await?.is_some()
        {
            return Err(AppError::BadRequest("Hashtag already exists".to_string()));
        }

        if input.count.is_some_and(|c| c < 0) {
            return Err(AppError::Validation(
                "count must not be negative".to_string(),
            ));
        }

        let mut active: hashtag::ActiveModel = tag.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(count) = input.count {
            active.count = Set(count);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.hashtag_repo.update(active).await
    }

    /// Delete a hashtag.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.hashtag_repo.delete(id).await? {
            return Err(AppError::NotFound("Hashtag not found".to_string()));
        }
        Ok(())
    }

    /// Bump a hashtag's count by one.
    pub async fn increment(&self, id: &str) -> AppResult<hashtag::Model> {
        self.hashtag_repo
            .increment(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hashtag not found".to_string()))
    }

    /// Look up (creating as needed) the hashtags named in a tweet.
    ///
    /// Names are normalized and deduplicated; blank names are skipped. The
    /// returned rows keep the order of first appearance.
    pub async fn resolve_names(&self, names: &[String]) -> AppResult<Vec<hashtag::Model>> {
        let mut seen = HashSet::new();
        let mut tags = Vec::new();

        for name in names.iter().map(|n| normalize_hashtag(n)) {
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }
            tags.push(self.hashtag_repo.get_or_create(&name).await?);
        }

        Ok(tags)
    }

    /// Add one use to each hashtag.
    pub async fn record_usage(&self, ids: &[String]) -> AppResult<()> {
        self.hashtag_repo.increment_many(ids).await
    }

    /// Remove one use from each hashtag.
    pub async fn release_usage(&self, ids: &[String]) -> AppResult<()> {
        self.hashtag_repo.decrement_many(ids).await
    }

    /// Hashtags by ID.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<hashtag::Model>> {
        self.hashtag_repo.find_by_ids(ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_hashtag(id: &str, name: &str, count: i32) -> hashtag::Model {
        hashtag::Model {
            id: id.to_string(),
            name: name.to_string(),
            count,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> HashtagService {
        HashtagService::new(HashtagRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_normalize_hashtag() {
        assert_eq!(normalize_hashtag("  #Rust "), "rust");
        assert_eq!(normalize_hashtag("AXUM"), "axum");
        assert_eq!(normalize_hashtag(" # "), "");
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc.create(CreateHashtagInput { title: None }).await.unwrap_err();
        assert_eq!(err.to_string(), "Hashtag title is required");

        let err = svc
            .create(CreateHashtagInput {
                title: Some("   ".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Hashtag title is required");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_hashtag("h1", "rust", 3)]]),
        );

        let err = svc
            .create(CreateHashtagInput {
                title: Some("Rust".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_create_starts_at_one() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()])
                .append_query_results([[create_test_hashtag("h1", "rust", 1)]]),
        );

        let tag = svc
            .create(CreateHashtagInput {
                title: Some("#Rust".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(tag.count, 1);
        assert_eq!(tag.name, "rust");
    }

    #[tokio::test]
    async fn test_update_rejects_negative_count() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_hashtag("h1", "rust", 3)]]),
        );

        let err = svc
            .update(
                "h1",
                UpdateHashtagInput {
                    title: None,
                    count: Some(-1),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));

        let err = svc.delete("ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Hashtag not found");
    }

    #[tokio::test]
    async fn test_resolve_names_dedups() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_hashtag("h1", "rust", 3)]])
                .append_query_results([[create_test_hashtag("h2", "axum", 0)]]),
        );

        let names = vec![
            "Rust".to_string(),
            "#rust".to_string(),
            " ".to_string(),
            "axum".to_string(),
        ];
        let tags = svc.resolve_names(&names).await.unwrap();

        let ids: Vec<_> = tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["h1", "h2"]);
    }

    #[tokio::test]
    async fn test_get_by_name_missing() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()]),
        );

        let err = svc.get_by_name("nothing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
