//! Tweet service.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use flock_db::{
    entities::{
        IdList, hashtag,
        tweet::{self, LikeList, RetweetList},
    },
    repositories::{ReactionChange, TweetRepository},
};
use sea_orm::{Set, prelude::DateTimeWithTimeZone};
use serde::{Deserialize, Serialize};

use super::hashtag::HashtagService;

/// Tweet service for business logic.
#[derive(Clone)]
pub struct TweetService {
    tweet_repo: TweetRepository,
    hashtags: HashtagService,
    id_gen: IdGenerator,
}

/// A tweet with its hashtags resolved to full records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TweetView {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub liked_by: LikeList,
    pub retweeted_by: RetweetList,
    pub hashtags: Vec<hashtag::Model>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl TweetView {
    fn new(tweet: tweet::Model, hashtags: Vec<hashtag::Model>) -> Self {
        Self {
            id: tweet.id,
            user_id: tweet.user_id,
            title: tweet.title,
            content: tweet.content,
            liked_by: tweet.liked_by,
            retweeted_by: tweet.retweeted_by,
            hashtags,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
        }
    }
}

/// Input for creating a tweet.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTweetInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

/// Input for updating a tweet.
///
/// Blank `title`/`content` keep the current value. `hashtags`, when present,
/// replaces the whole set.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTweetInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub hashtags: Option<Vec<String>>,
}

/// Body of the like/retweet endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReactionInput {
    pub user_id: Option<String>,
}

impl TweetService {
    /// Create a new tweet service.
    #[must_use]
    pub const fn new(tweet_repo: TweetRepository, hashtags: HashtagService) -> Self {
        Self {
            tweet_repo,
            hashtags,
            id_gen: IdGenerator::new(),
        }
    }

    /// All tweets, newest first.
    pub async fn list(&self) -> AppResult<Vec<TweetView>> {
        let tweets = self.tweet_repo.find_all().await?;
        self.populate(tweets).await
    }

    /// Get one tweet.
    pub async fn get(&self, id: &str) -> AppResult<TweetView> {
        let tweet = self.tweet_repo.get_by_id(id).await?;
        self.populate_one(tweet).await
    }

    /// Tweets by one author, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<TweetView>> {
        let tweets = self.tweet_repo.find_by_user(user_id).await?;
        self.populate(tweets).await
    }

    /// Tweets tagged with a hashtag name, newest first.
    pub async fn list_by_hashtag(&self, name: &str) -> AppResult<Vec<TweetView>> {
        let tag = self.hashtags.get_by_name(name).await?;
        let tweets = self.tweet_repo.find_by_hashtag(&tag.id).await?;
        self.populate(tweets).await
    }

    /// Create a tweet and count its hashtags.
    pub async fn create(&self, input: CreateTweetInput) -> AppResult<TweetView> {
        let (Some(title), Some(content), Some(user_id)) = (
            required(input.title),
            required(input.content),
            required(input.user_id),
        ) else {
            return Err(AppError::BadRequest(
                "Title, content and user_id are required".to_string(),
            ));
        };

        let tags = self
            .hashtags
            .resolve_names(input.hashtags.as_deref().unwrap_or_default())
            .await?;
        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();

        let model = tweet::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id),
            title: Set(title),
            content: Set(content),
            liked_by: Set(LikeList::default()),
            retweeted_by: Set(RetweetList::default()),
            hashtag_ids: Set(IdList::from(tag_ids.clone())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let tweet = self.tweet_repo.create(model).await?;
        self.hashtags.record_usage(&tag_ids).await?;

        tracing::debug!(tweet_id = %tweet.id, hashtags = tag_ids.len(), "Created tweet");
        // Re-read so the counts include this tweet
        self.populate_one(tweet).await
    }

    /// Update a tweet, adjusting hashtag counts for added and removed tags.
    pub async fn update(&self, id: &str, input: UpdateTweetInput) -> AppResult<TweetView> {
        let tweet = self.tweet_repo.get_by_id(id).await?;
        let old_ids = tweet.hashtag_ids.clone();

        let new_tags = match input.hashtags.as_deref() {
            Some(names) => Some(self.hashtags.resolve_names(names).await?),
            None => None,
        };

        let mut active: tweet::ActiveModel = tweet.into();
        if let Some(title) = required(input.title) {
            active.title = Set(title);
        }
        if let Some(content) = required(input.content) {
            active.content = Set(content);
        }

        let mut added = Vec::new();
        let mut removed = Vec::new();
        if let Some(tags) = &new_tags {
            let new_ids = IdList::from(tags.iter().map(|t| t.id.clone()).collect::<Vec<_>>());
            added = new_ids
                .as_slice()
                .iter()
                .filter(|id| !old_ids.contains(id))
                .cloned()
                .collect();
            removed = old_ids
                .as_slice()
                .iter()
                .filter(|id| !new_ids.contains(id))
                .cloned()
                .collect();
            active.hashtag_ids = Set(new_ids);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let tweet = self.tweet_repo.update(active).await?;
        self.hashtags.record_usage(&added).await?;
        self.hashtags.release_usage(&removed).await?;

        self.populate_one(tweet).await
    }

    /// Delete a tweet and release its hashtags.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let tweet = self.tweet_repo.get_by_id(id).await?;

        if !self.tweet_repo.delete(&tweet.id).await? {
            return Err(AppError::NotFound("Tweet not found".to_string()));
        }
        self.hashtags
            .release_usage(tweet.hashtag_ids.as_slice())
            .await?;

        tracing::debug!(tweet_id = %tweet.id, "Deleted tweet");
        Ok(())
    }

    /// Like a tweet.
    pub async fn like(&self, id: &str, input: ReactionInput) -> AppResult<TweetView> {
        let user_id = require_user(input)?;
        let change = self.tweet_repo.like(id, &user_id).await?;
        self.finish_reaction(change, Some("Tweet already liked by this user"))
            .await
    }

    /// Remove a like. A missing like is not an error.
    pub async fn unlike(&self, id: &str, input: ReactionInput) -> AppResult<TweetView> {
        let user_id = require_user(input)?;
        let change = self.tweet_repo.unlike(id, &user_id).await?;
        self.finish_reaction(change, None).await
    }

    /// Retweet a tweet.
    pub async fn retweet(&self, id: &str, input: ReactionInput) -> AppResult<TweetView> {
        let user_id = require_user(input)?;
        let change = self.tweet_repo.retweet(id, &user_id).await?;
        self.finish_reaction(change, Some("Tweet already retweeted by this user"))
            .await
    }

    /// Remove a retweet. A missing retweet is not an error.
    pub async fn unretweet(&self, id: &str, input: ReactionInput) -> AppResult<TweetView> {
        let user_id = require_user(input)?;
        let change = self.tweet_repo.unretweet(id, &user_id).await?;
        self.finish_reaction(change, None).await
    }

    async fn finish_reaction(
        &self,
        change: ReactionChange,
        duplicate_error: Option<&str>,
    ) -> AppResult<TweetView> {
        match change {
            ReactionChange::Applied(tweet) => self.populate_one(tweet).await,
            ReactionChange::Unchanged(tweet) => match duplicate_error {
                Some(msg) => Err(AppError::BadRequest(msg.to_string())),
                None => self.populate_one(tweet).await,
            },
            ReactionChange::NotFound => Err(AppError::NotFound("Tweet not found".to_string())),
        }
    }

    async fn populate_one(&self, tweet: tweet::Model) -> AppResult<TweetView> {
        let tags = self
            .hashtags
            .find_by_ids(tweet.hashtag_ids.as_slice())
            .await?;
        Ok(attach(tweet, &tags.into_iter().map(|t| (t.id.clone(), t)).collect()))
    }

    /// Resolve hashtags for many tweets with a single query.
    async fn populate(&self, tweets: Vec<tweet::Model>) -> AppResult<Vec<TweetView>> {
        let ids: Vec<String> = tweets
            .iter()
            .flat_map(|t| t.hashtag_ids.as_slice().iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let by_id: HashMap<String, hashtag::Model> = self
            .hashtags
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        Ok(tweets.into_iter().map(|t| attach(t, &by_id)).collect())
    }
}

/// Pair a tweet with its hashtags in stored order. Deleted hashtags are skipped.
fn attach(tweet: tweet::Model, by_id: &HashMap<String, hashtag::Model>) -> TweetView {
    let tags = tweet
        .hashtag_ids
        .as_slice()
        .iter()
        .filter_map(|id| by_id.get(id).cloned())
        .collect();
    TweetView::new(tweet, tags)
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require_user(input: ReactionInput) -> AppResult<String> {
    required(input.user_id).ok_or_else(|| AppError::BadRequest("User ID is required".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flock_db::repositories::HashtagRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_tweet(id: &str, hashtag_ids: &[&str]) -> tweet::Model {
        tweet::Model {
            id: id.to_string(),
            user_id: "author".to_string(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            liked_by: LikeList::default(),
            retweeted_by: RetweetList::default(),
            hashtag_ids: IdList::from(hashtag_ids.iter().map(ToString::to_string).collect::<Vec<_>>()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_hashtag(id: &str, name: &str) -> hashtag::Model {
        hashtag::Model {
            id: id.to_string(),
            name: name.to_string(),
            count: 1,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec_ok(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn service(db: MockDatabase) -> TweetService {
        let conn = Arc::new(db.into_connection());
        TweetService::new(
            TweetRepository::new(Arc::clone(&conn)),
            HashtagService::new(HashtagRepository::new(conn)),
        )
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .create(CreateTweetInput {
                title: Some("Hello".to_string()),
                content: Some(String::new()),
                user_id: Some("u1".to_string()),
                hashtags: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Title, content and user_id are required");
    }

    #[tokio::test]
    async fn test_create_with_hashtags() {
        let mut fresh = create_test_hashtag("h1", "rust");
        fresh.count = 0;

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fresh]])
                .append_query_results([[create_test_tweet("t1", &["h1"])]])
                .append_query_results([[create_test_hashtag("h1", "rust")]])
                .append_exec_results([exec_ok(1)]),
        );

        let view = svc
            .create(CreateTweetInput {
                title: Some("Hello".to_string()),
                content: Some("World".to_string()),
                user_id: Some("author".to_string()),
                hashtags: Some(vec!["#Rust".to_string()]),
            })
            .await
            .unwrap();

        assert_eq!(view.id, "t1");
        assert_eq!(view.hashtags.len(), 1);
        assert_eq!(view.hashtags[0].name, "rust");
        // Count as stored after the increment, not as first looked up
        assert_eq!(view.hashtags[0].count, 1);
    }

    #[tokio::test]
    async fn test_get_populates_hashtags() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tweet("t1", &["h2", "h1"])]])
                .append_query_results([vec![
                    create_test_hashtag("h1", "rust"),
                    create_test_hashtag("h2", "axum"),
                ]]),
        );

        let view = svc.get("t1").await.unwrap();
        let names: Vec<_> = view.hashtags.iter().map(|h| h.name.as_str()).collect();

        assert_eq!(names, ["axum", "rust"]);
    }

    #[tokio::test]
    async fn test_like_requires_user_id() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .like("t1", ReactionInput { user_id: None })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User ID is required");
    }

    #[tokio::test]
    async fn test_like_twice_rejected() {
        let mut tweet = create_test_tweet("t1", &[]);
        tweet.liked_by.0.push(tweet::Like {
            user_id: "alice".to_string(),
            liked_at: Utc::now(),
        });
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[tweet]]));

        let err = svc
            .like(
                "t1",
                ReactionInput {
                    user_id: Some("alice".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Tweet already liked by this user");
    }

    #[tokio::test]
    async fn test_unretweet_absent_is_ok() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tweet("t1", &[])]]),
        );

        let view = svc
            .unretweet(
                "t1",
                ReactionInput {
                    user_id: Some("alice".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(view.retweeted_by.0.is_empty());
    }

    #[tokio::test]
    async fn test_retweet_missing_tweet() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tweet::Model>::new()]),
        );

        let err = svc
            .retweet(
                "ghost",
                ReactionInput {
                    user_id: Some("alice".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Tweet not found");
    }

    #[tokio::test]
    async fn test_delete_releases_hashtags() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tweet("t1", &["h1"])]])
                .append_exec_results([exec_ok(1), exec_ok(1)]),
        );

        svc.delete("t1").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_by_unknown_hashtag() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<hashtag::Model>::new()]),
        );

        let err = svc.list_by_hashtag("nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Hashtag not found");
    }

    #[tokio::test]
    async fn test_update_swaps_hashtags() {
        let mut updated = create_test_tweet("t1", &["h2"]);
        updated.title = "Edited".to_string();

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_tweet("t1", &["h1"])]])
                .append_query_results([[create_test_hashtag("h2", "axum")]])
                .append_query_results([[updated]])
                .append_query_results([[create_test_hashtag("h2", "axum")]])
                .append_exec_results([exec_ok(1), exec_ok(1)]),
        );

        let view = svc
            .update(
                "t1",
                UpdateTweetInput {
                    title: Some("Edited".to_string()),
                    content: None,
                    hashtags: Some(vec!["axum".to_string()]),
                },
            )
            .await
            .unwrap();

        assert_eq!(view.title, "Edited");
        assert_eq!(view.hashtags[0].id, "h2");
        assert_eq!(view.hashtags[0].count, 1);
    }
}
