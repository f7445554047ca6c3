//! User accounts: registration, login, profile, password reset.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use wastewatch_common::{AppError, AppResult, IdGenerator};
use wastewatch_db::entities::user::{self, UserRole};
use wastewatch_db::repositories::UserRepository;

/// Password-reset tokens stay valid for one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Input for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Profile patch; absent fields are left untouched.
///
/// The avatar URL points at an already-stored upload; the request layer
/// stores the raw file and passes the resulting URL here.
#[derive(Debug, Default, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// User account service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, id_gen: IdGenerator) -> Self {
        Self { user_repo, id_gen }
    }

    /// Register a new account with a fresh API token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(Some(hash_password(&input.password)?)),
            token: Set(Some(self.id_gen.generate_token())),
            role: Set(UserRole::User),
            points: Set(0),
            avatar_url: Set(None),
            reset_token: Set(None),
            reset_token_expires_at: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Authenticate by email and password, issuing an API token if the
    /// account has none.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let hash = user.password_hash.as_deref().ok_or(AppError::Unauthorized)?;
        if !verify_password(password, hash)? {
            return Err(AppError::Unauthorized);
        }

        if user.token.is_some() {
            return Ok(user);
        }

        let mut model: user::ActiveModel = user.into();
        model.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(model).await
    }

    /// Resolve the account behind an API token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate the current API token by rotating it.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let mut model: user::ActiveModel = user.into();
        model.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(model).await?;

        Ok(())
    }

    /// Fetch an account by ID.
    pub async fn get(&self, user_id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(user_id).await
    }

    /// Apply a profile patch.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut model: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(avatar_url) = input.avatar_url {
            model.avatar_url = Set(Some(avatar_url));
        }
        model.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(model).await
    }

    /// Create a password-reset token for the account behind an email.
    ///
    /// Returns the updated user and the plain token to embed in the mail.
    pub async fn create_reset_token(&self, email: &str) -> AppResult<(user::Model, String)> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(email.to_string()))?;

        let token = self.id_gen.generate_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        let mut model: user::ActiveModel = user.into();
        model.reset_token = Set(Some(token.clone()));
        model.reset_token_expires_at = Set(Some(expires_at.into()));
        let user = self.user_repo.update(model).await?;

        Ok((user, token))
    }

    /// Redeem a reset token: store the new password, clear the reset state
    /// and rotate the API token so existing sessions die.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<user::Model> {
        if new_password.len() < 6 {
            return Err(AppError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let expired = user
            .reset_token_expires_at
            .is_none_or(|expires_at| expires_at < Utc::now());
        if expired {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }

        let mut model: user::ActiveModel = user.into();
        model.password_hash = Set(Some(hash_password(new_password)?));
        model.reset_token = Set(None);
        model.reset_token_expires_at = Set(None);
        model.token = Set(Some(self.id_gen.generate_token()));
        model.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(model).await
    }
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
