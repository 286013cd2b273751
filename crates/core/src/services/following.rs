//! Following service.

use std::collections::HashMap;

use flock_common::{AppError, AppResult};
use flock_db::{
    entities::user,
    repositories::{FollowChange, FollowRepository, UserRepository},
};

/// Following service for business logic.
#[derive(Clone)]
pub struct FollowingService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
}

impl FollowingService {
    /// Create a new following service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
        }
    }

    /// Follow a user. Returns the followed user.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<user::Model> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest("You cannot follow yourself".to_string()));
        }

        match self.follow_repo.follow(follower_id, followee_id).await? {
            FollowChange::Applied(followee) => {
                tracing::info!(follower_id, followee_id, "Followed user");
                Ok(followee)
            }
            FollowChange::Unchanged(_) => Err(AppError::BadRequest(
                "You are already following this user".to_string(),
            )),
            FollowChange::MissingUser => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    /// Unfollow a user. Returns the unfollowed user.
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> AppResult<user::Model> {
        if follower_id == followee_id {
            return Err(AppError::BadRequest(
                "You cannot unfollow yourself".to_string(),
            ));
        }

        match self.follow_repo.unfollow(follower_id, followee_id).await? {
            FollowChange::Applied(followee) => {
                tracing::info!(follower_id, followee_id, "Unfollowed user");
                Ok(followee)
            }
            FollowChange::Unchanged(_) => Err(AppError::BadRequest(
                "You are not following this user".to_string(),
            )),
            FollowChange::MissingUser => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    /// Users following `user_id`, in the order they followed.
    pub async fn followers(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.resolve(user.followers.as_slice()).await
    }

    /// Users that `user_id` follows, in the order they were followed.
    pub async fn following(&self, user_id: &str) -> AppResult<Vec<user::Model>> {
        let user = self.user_repo.get_by_id(user_id).await?;
        self.resolve(user.following.as_slice()).await
    }

    /// Load users and keep the order of `ids`. Unknown IDs are dropped.
    async fn resolve(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        let mut by_id: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
