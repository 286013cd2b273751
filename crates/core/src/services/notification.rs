//! Notification service.

use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use flock_db::{
    entities::notification::{self, NotificationType},
    repositories::NotificationRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

/// Input for creating a notification.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotificationInput {
    #[validate(length(min = 1, max = 32))]
    pub user_id: String,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    #[validate(length(min = 1, max = 512))]
    pub title: String,

    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Body of the bulk delete endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteInput {
    /// Any JSON value; `delete_bulk` accepts only an array of strings.
    pub notification_ids: Option<serde_json::Value>,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification for a user.
    pub async fn create(&self, input: CreateNotificationInput) -> AppResult<notification::Model> {
        input.validate()?;

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id),
            notification_type: Set(input.notification_type),
            title: Set(input.title),
            content: Set(input.content),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.notification_repo.create(model).await
    }

    /// A user's notifications, newest first.
    pub async fn list_for(&self, user_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_user(user_id).await
    }

    /// Delete one of the user's notifications.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this notification".to_string(),
            ));
        }

        self.notification_repo.delete(&notification.id).await?;
        Ok(())
    }

    /// Delete many of the user's notifications. IDs that belong to other
    /// users are ignored. Returns how many were deleted.
    pub async fn delete_bulk(&self, user_id: &str, input: BulkDeleteInput) -> AppResult<u64> {
        let ids = parse_ids(input.notification_ids).ok_or_else(|| {
            AppError::BadRequest("Please provide an array of notification IDs".to_string())
        })?;

        let deleted = self
            .notification_repo
            .delete_many_owned(user_id, &ids)
            .await?;
        tracing::debug!(user_id, requested = ids.len(), deleted, "Bulk deleted notifications");
        Ok(deleted)
    }
}

/// Accept only a JSON array of strings.
fn parse_ids(value: Option<serde_json::Value>) -> Option<Vec<String>> {
    match value? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_notification(id: &str, user_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            notification_type: NotificationType::Like,
            title: "New like".to_string(),
            content: "bob liked your tweet".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> NotificationService {
        NotificationService::new(NotificationRepository::new(Arc::new(db.into_connection())))
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(
            parse_ids(Some(json!(["a", "b"]))),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(parse_ids(Some(json!([]))), Some(vec![]));
        assert_eq!(parse_ids(Some(json!("a"))), None);
        assert_eq!(parse_ids(Some(json!([1, 2]))), None);
        assert_eq!(parse_ids(None), None);
    }

    #[test]
    fn test_type_deserializes_lowercase() {
        let input: CreateNotificationInput = serde_json::from_value(json!({
            "user_id": "alice",
            "type": "retweet",
            "title": "Retweeted",
            "content": "bob retweeted you",
        }))
        .unwrap();

        assert_eq!(input.notification_type, NotificationType::Retweet);
    }

    #[tokio::test]
    async fn test_delete_foreign_notification() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_notification("n1", "bob")]]),
        );

        let err = svc.delete("alice", "n1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.to_string(), "Not authorized to delete this notification");
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()]),
        );

        let err = svc.delete("alice", "n1").await.unwrap_err();
        assert_eq!(err.to_string(), "Notification not found");
    }

    #[tokio::test]
    async fn test_bulk_requires_array() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .delete_bulk(
                "alice",
                BulkDeleteInput {
                    notification_ids: Some(json!("n1")),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Please provide an array of notification IDs");
    }

    #[tokio::test]
    async fn test_bulk_counts_deleted() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            },
        ]));

        let deleted = svc
            .delete_bulk(
                "alice",
                BulkDeleteInput {
                    notification_ids: Some(json!(["n1", "n2", "n3"])),
                },
            )
            .await
            .unwrap();

        assert_eq!(deleted, 2);
    }
}
