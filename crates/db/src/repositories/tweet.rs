//! Tweet repository.

use std::sync::Arc;

use crate::entities::{Tweet, tweet};
use chrono::Utc;
use flock_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use serde_json::json;

/// Outcome of a like/retweet toggle on a locked tweet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionChange {
    /// The reaction list changed.
    Applied(tweet::Model),
    /// Nothing to do: the list was already in the requested state.
    Unchanged(tweet::Model),
    /// No such tweet.
    NotFound,
}

/// Tweet repository for database operations.
#[derive(Clone)]
pub struct TweetRepository {
    db: Arc<DatabaseConnection>,
}

impl TweetRepository {
    /// Create a new tweet repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tweet by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<tweet::Model>> {
        Tweet::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tweet by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<tweet::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))
    }

    /// All tweets, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<tweet::Model>> {
        Tweet::find()
            .order_by_desc(tweet::Column::CreatedAt)
            .order_by_desc(tweet::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tweets written by a user, newest first.
    pub async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<tweet::Model>> {
        Tweet::find()
            .filter(tweet::Column::UserId.eq(user_id))
            .order_by_desc(tweet::Column::CreatedAt)
            .order_by_desc(tweet::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tweets referencing a hashtag, newest first.
    pub async fn find_by_hashtag(&self, hashtag_id: &str) -> AppResult<Vec<tweet::Model>> {
        // jsonb containment, served by the GIN index on hashtag_ids
        Tweet::find()
            .filter(Expr::cust_with_values(
                "hashtag_ids @> $1::jsonb",
                [json!([hashtag_id])],
            ))
            .order_by_desc(tweet::Column::CreatedAt)
            .order_by_desc(tweet::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new tweet.
    pub async fn create(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a tweet.
    pub async fn update(&self, model: tweet::ActiveModel) -> AppResult<tweet::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a tweet. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Tweet::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Record a like by `user_id`.
    pub async fn like(&self, id: &str, user_id: &str) -> AppResult<ReactionChange> {
        self.modify_reactions(id, |t| {
            if t.liked_by.contains(user_id) {
                return false;
            }
            t.liked_by.0.push(tweet::Like {
                user_id: user_id.to_string(),
                liked_at: Utc::now(),
            });
            true
        })
        .await
    }

    /// Remove the like of `user_id`, if any.
    pub async fn unlike(&self, id: &str, user_id: &str) -> AppResult<ReactionChange> {
        self.modify_reactions(id, |t| {
            let before = t.liked_by.0.len();
            t.liked_by.0.retain(|l| l.user_id != user_id);
            t.liked_by.0.len() != before
        })
        .await
    }

    /// Record a retweet by `user_id`.
    pub async fn retweet(&self, id: &str, user_id: &str) -> AppResult<ReactionChange> {
        self.modify_reactions(id, |t| {
            if t.retweeted_by.contains(user_id) {
                return false;
            }
            t.retweeted_by.0.push(tweet::Retweet {
                user_id: user_id.to_string(),
                retweeted_at: Utc::now(),
            });
            true
        })
        .await
    }

    /// Remove the retweet of `user_id`, if any.
    pub async fn unretweet(&self, id: &str, user_id: &str) -> AppResult<ReactionChange> {
        self.modify_reactions(id, |t| {
            let before = t.retweeted_by.0.len();
            t.retweeted_by.0.retain(|r| r.user_id != user_id);
            t.retweeted_by.0.len() != before
        })
        .await
    }

    /// Read-modify-write of the reaction lists under `SELECT ... FOR UPDATE`.
    ///
    /// `apply` mutates a copy of the row and reports whether it changed
    /// anything; unchanged rows are not written back.
    async fn modify_reactions<F>(&self, id: &str, apply: F) -> AppResult<ReactionChange>
    where
        F: FnOnce(&mut tweet::Model) -> bool + Send,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(current) = Tweet::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        else {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(ReactionChange::NotFound);
        };

        let mut modified = current.clone();
        if !apply(&mut modified) {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(ReactionChange::Unchanged(current));
        }

        let mut active: tweet::ActiveModel = current.into();
        active.liked_by = Set(modified.liked_by);
        active.retweeted_by = Set(modified.retweeted_by);
        active.updated_at = Set(Some(Utc::now().into()));
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ReactionChange::Applied(updated))
    }
}
