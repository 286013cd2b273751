//! Follow repository.
//!
//! A follow relationship lives in three places: the follower's `following`
//! array, the followee's `followers` array and a [`follow`] edge row. The
//! mutating methods here rewrite all three inside one transaction while both
//! user rows are locked.

use std::sync::Arc;

use crate::entities::{Follow, User, follow, user};
use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// Result of a follow or unfollow attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowChange {
    /// The relationship was changed. Carries the updated followee.
    Applied(user::Model),
    /// The relationship was already in the requested state.
    Unchanged(user::Model),
    /// One of the two users does not exist.
    MissingUser,
}

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find the edge from `follower_id` to `followee_id`.
    pub async fn find_edge(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<follow::Model>> {
        Follow::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Make `follower_id` follow `followee_id`.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowChange> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some((follower, followee)) = lock_pair(&txn, follower_id, followee_id).await? else {
            rollback(txn).await?;
            return Ok(FollowChange::MissingUser);
        };

        if follower.following.contains(followee_id) {
            rollback(txn).await?;
            return Ok(FollowChange::Unchanged(followee));
        }

        let now = Utc::now();

        let mut following = follower.following.clone();
        following.insert(followee_id);
        let mut follower_active: user::ActiveModel = follower.into();
        follower_active.following = Set(following);
        follower_active.updated_at = Set(Some(now.into()));
        follower_active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut followers = followee.followers.clone();
        followers.insert(follower_id);
        let mut followee_active: user::ActiveModel = followee.into();
        followee_active.followers = Set(followers);
        followee_active.updated_at = Set(Some(now.into()));
        let followee = followee_active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            started_following_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(FollowChange::Applied(followee))
    }

    /// Make `follower_id` stop following `followee_id`.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<FollowChange> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some((follower, followee)) = lock_pair(&txn, follower_id, followee_id).await? else {
            rollback(txn).await?;
            return Ok(FollowChange::MissingUser);
        };

        if !follower.following.contains(followee_id) {
            rollback(txn).await?;
            return Ok(FollowChange::Unchanged(followee));
        }

        let now = Utc::now();

        let mut following = follower.following.clone();
        following.remove(followee_id);
        let mut follower_active: user::ActiveModel = follower.into();
        follower_active.following = Set(following);
        follower_active.updated_at = Set(Some(now.into()));
        follower_active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut followers = followee.followers.clone();
        followers.remove(follower_id);
        let mut followee_active: user::ActiveModel = followee.into();
        followee_active.followers = Set(followers);
        followee_active.updated_at = Set(Some(now.into()));
        let followee = followee_active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FolloweeId.eq(followee_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(FollowChange::Applied(followee))
    }
}

/// Load and lock both users. Rows are locked in id order so two concurrent
/// requests touching the same pair cannot deadlock.
async fn lock_pair(
    txn: &DatabaseTransaction,
    follower_id: &str,
    followee_id: &str,
) -> AppResult<Option<(user::Model, user::Model)>> {
    let users = User::find()
        .filter(user::Column::Id.is_in([follower_id, followee_id]))
        .order_by_asc(user::Column::Id)
        .lock_exclusive()
        .all(txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let follower = users.iter().find(|u| u.id == follower_id).cloned();
    let followee = users.into_iter().find(|u| u.id == followee_id);

    Ok(follower.zip(followee))
}

async fn rollback(txn: DatabaseTransaction) -> AppResult<()> {
    txn.rollback()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
