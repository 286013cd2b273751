//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use flock_common::{AppError, AppResult, IdGenerator};
use flock_db::{
    entities::{IdList, user},
    repositories::UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
///
/// Rules apply to the trimmed username and the normalized email.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Input for login.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Input for a user editing their own profile.
///
/// Missing or empty fields keep their current value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 128))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(max = 128))]
    pub password: Option<String>,
}

/// Input for an admin editing any user.
///
/// Field names match the serialized user, so `is_admin` round-trips.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdminUpdateUserInput {
    #[validate(length(max = 128))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[serde(alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

impl RegisterInput {
    fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

impl UpdateProfileInput {
    /// Blank fields become `None` so they keep the current value.
    fn normalized(self) -> Self {
        Self {
            username: non_empty(self.username),
            email: non_empty(self.email).map(|e| normalize_email(&e)),
            password: non_empty(self.password),
        }
    }
}

impl AdminUpdateUserInput {
    fn normalized(self) -> Self {
        Self {
            username: non_empty(self.username),
            email: non_empty(self.email).map(|e| normalize_email(&e)),
            is_admin: self.is_admin,
        }
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        let input = input.normalized();
        input.validate()?;

        let RegisterInput {
            username,
            email,
            password,
        } = input;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest("User already exists".to_string()));
        }
        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }

        let password_hash = hash_password(&password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username),
            email: Set(email),
            password: Set(password_hash),
            is_admin: Set(false),
            following: Set(IdList::new()),
            followers: Set(IdList::new()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Authenticate a user by email and password.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password)? {
            return Err(invalid());
        }

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List every user.
    pub async fn list(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all().await
    }

    /// Load a user and require the admin flag.
    pub async fn require_admin(&self, id: &str) -> AppResult<user::Model> {
        match self.user_repo.find_by_id(id).await? {
            Some(user) if user.is_admin => Ok(user),
            _ => Err(AppError::Unauthorized(
                "Not authorized as an admin".to_string(),
            )),
        }
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        let input = input.normalized();
        input.validate()?;
        let user = self.user_repo.get_by_id(id).await?;

        let UpdateProfileInput {
            username,
            email,
            password,
        } = input;
        self.ensure_available(&user, username.as_deref(), email.as_deref())
            .await?;

        let mut active: user::ActiveModel = user.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(password) = password {
            if password.len() < 6 {
                return Err(AppError::Validation(
                    "password must be at least 6 characters".to_string(),
                ));
            }
            active.password = Set(hash_password(&password)?);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Update any user (admin).
    pub async fn admin_update(
        &self,
        id: &str,
        input: AdminUpdateUserInput,
    ) -> AppResult<user::Model> {
        let input = input.normalized();
        input.validate()?;
        let user = self.user_repo.get_by_id(id).await?;

        let AdminUpdateUserInput {
            username,
            email,
            is_admin,
        } = input;
        self.ensure_available(&user, username.as_deref(), email.as_deref())
            .await?;

        let mut active: user::ActiveModel = user.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(is_admin) = is_admin {
            active.is_admin = Set(is_admin);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete a user (admin). Admin accounts cannot be deleted.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(id).await?;

        if user.is_admin {
            return Err(AppError::BadRequest("Can not delete admin user".to_string()));
        }

        self.user_repo.delete(&user.id).await?;
        tracing::info!(user_id = %user.id, "Deleted user");
        Ok(())
    }

    /// Reject a username/email change that collides with another account.
    async fn ensure_available(
        &self,
        user: &user::Model,
        username: Option<&str>,
        email: Option<&str>,
    ) -> AppResult<()> {
        if let Some(username) = username.filter(|u| *u != user.username)
            && self.user_repo.find_by_username(username).await?.is_some()
        {
            return Err(AppError::BadRequest("Username already taken".to_string()));
        }
        if let Some(email) = email.filter(|e| *e != user.email)
            && self.user_repo.find_by_email(email).await?.is_some()
        {
            return Err(AppError::BadRequest("Email already in use".to_string()));
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
