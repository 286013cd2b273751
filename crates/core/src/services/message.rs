//! Direct message service.

use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use flock_db::{entities::message, repositories::MessageRepository};
use sea_orm::Set;
use serde::Deserialize;

/// Direct message service for business logic.
#[derive(Clone)]
pub struct MessageService {
    message_repo: MessageRepository,
    id_gen: IdGenerator,
}

/// Input for sending a message. The sender is the authenticated user.
#[derive(Debug, Default, Deserialize)]
pub struct CreateMessageInput {
    pub to_user_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Input for editing a message. Blank fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMessageInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl MessageService {
    /// Create a new message service.
    #[must_use]
    pub const fn new(message_repo: MessageRepository) -> Self {
        Self {
            message_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Send a message from `sender_id`.
    pub async fn send(&self, sender_id: &str, input: CreateMessageInput) -> AppResult<message::Model> {
        let (Some(to_user_id), Some(title), Some(content)) = (
            non_blank(input.to_user_id),
            non_blank(input.title),
            non_blank(input.content),
        ) else {
            return Err(AppError::BadRequest("Invalid message data".to_string()));
        };

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            from_user_id: Set(sender_id.to_string()),
            to_user_id: Set(to_user_id),
            title: Set(title),
            content: Set(content),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let message = self.message_repo.create(model).await?;
        tracing::debug!(message_id = %message.id, from = sender_id, to = %message.to_user_id, "Sent message");
        Ok(message)
    }

    /// Messages the user sent or received, newest first.
    pub async fn list_for(&self, user_id: &str) -> AppResult<Vec<message::Model>> {
        self.message_repo.find_for_participant(user_id).await
    }

    /// Get a message visible to `user_id`.
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<message::Model> {
        let message = self.find(id).await?;

        if message.from_user_id != user_id && message.to_user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to view this message".to_string(),
            ));
        }

        Ok(message)
    }

    /// Edit a message. Only the sender may do this.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateMessageInput,
    ) -> AppResult<message::Model> {
        let message = self.find(id).await?;

        if message.from_user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this message".to_string(),
            ));
        }

        let mut active: message::ActiveModel = message.into();
        if let Some(title) = non_blank(input.title) {
            active.title = Set(title);
        }
        if let Some(content) = non_blank(input.content) {
            active.content = Set(content);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.message_repo.update(active).await
    }

    /// Delete a message. Only the sender may do this.
    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let message = self.find(id).await?;

        if message.from_user_id != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this message".to_string(),
            ));
        }

        self.message_repo.delete(&message.id).await?;
        Ok(())
    }

    async fn find(&self, id: &str) -> AppResult<message::Model> {
        self.message_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Message not found".to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_message(id: &str, from: &str, to: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            from_user_id: from.to_string(),
            to_user_id: to.to_string(),
            title: "Hi".to_string(),
            content: "Lunch?".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> MessageService {
        MessageService::new(MessageRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_send_requires_all_fields() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .send(
                "alice",
                CreateMessageInput {
                    to_user_id: Some("bob".to_string()),
                    title: None,
                    content: Some("Lunch?".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid message data");
    }

    #[tokio::test]
    async fn test_send_sets_sender() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m1", "alice", "bob")]]),
        );

        let message = svc
            .send(
                "alice",
                CreateMessageInput {
                    to_user_id: Some("bob".to_string()),
                    title: Some("Hi".to_string()),
                    content: Some("Lunch?".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(message.from_user_id, "alice");
    }

    #[tokio::test]
    async fn test_recipient_can_view() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m1", "alice", "bob")]]),
        );

        assert!(svc.get("bob", "m1").await.is_ok());
    }

    #[tokio::test]
    async fn test_outsider_cannot_view() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m1", "alice", "bob")]]),
        );

        let err = svc.get("carol", "m1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(err.to_string(), "Not authorized to view this message");
    }

    #[tokio::test]
    async fn test_recipient_cannot_update() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m1", "alice", "bob")]]),
        );

        let err = svc
            .update("bob", "m1", UpdateMessageInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not authorized to update this message");
    }

    #[tokio::test]
    async fn test_sender_deletes() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_message("m1", "alice", "bob")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        svc.delete("alice", "m1").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_message() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<message::Model>::new()]),
        );

        let err = svc.get("alice", "ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Message not found");
    }
}
