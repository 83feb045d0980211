//! User service: sign-in, sessions and admin-managed accounts.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use govboard_common::{AppError, AppResult, IdGenerator, config::BootstrapConfig};
use govboard_db::{
    entities::user::{self, UserRole},
    repositories::{UserFilter, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::scope::AccessScope;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for creating a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    /// Caller-chosen id; generated when absent.
    #[validate(length(min = 1, max = 32))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[serde(default)]
    pub role: UserRole,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(length(max = 256))]
    pub job_title: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub institution: String,

    /// Defaults to the home institution alone.
    pub accessible_institutions: Option<Vec<String>>,
}

/// Input for updating a user. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    /// Empty or absent keeps the stored credential.
    #[validate(length(max = 128))]
    pub password: Option<String>,

    pub role: Option<UserRole>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(length(max = 256))]
    pub job_title: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub institution: Option<String>,

    pub accessible_institutions: Option<Vec<String>>,
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

    /// Check an email/password pair.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Sign in, returning the user and its bearer token.
    ///
    /// An existing token is reused so other sessions stay valid.
    pub async fn signin(&self, email: &str, password: &str) -> AppResult<(user::Model, String)> {
        let user = self.authenticate(email, password).await?;

        if let Some(token) = user.token.clone() {
            return Ok((user, token));
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Issued session token");
        Ok((user, token))
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Invalidate every session of a user by rotating its token.
    pub async fn signout(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(self.id_gen.generate_token()));
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %user_id, "Rotated session token");
        Ok(())
    }

    /// Users visible to the caller.
    pub async fn list(&self, scope: &AccessScope, filter: &UserFilter) -> AppResult<Vec<user::Model>> {
        self.user_repo
            .find_visible(&scope.institutions(), &scope.user_id, filter)
            .await
    }

    /// Create a user (admin only).
    pub async fn create(
        &self,
        scope: &AccessScope,
        input: CreateUserInput,
    ) -> AppResult<user::Model> {
        scope.require_admin()?;
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("Email already registered: {email}")));
        }

        let id = input.id.unwrap_or_else(|| self.id_gen.generate());
        if self.user_repo.find_by_id(&id).await?.is_some() {
            return Err(AppError::Conflict(format!("User id already exists: {id}")));
        }

        let accessible = input
            .accessible_institutions
            .unwrap_or_else(|| vec![input.institution.clone()]);

        let model = user::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(input.role),
            avatar_url: Set(input.avatar_url),
            job_title: Set(input.job_title),
            institution: Set(input.institution),
            accessible_institutions: Set(serde_json::json!(dedup(accessible))),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, by = %scope.user_id, "Created user");
        Ok(user)
    }

    /// Update a user (admin only).
    pub async fn update(
        &self,
        scope: &AccessScope,
        id: &str,
        input: UpdateUserInput,
    ) -> AppResult<user::Model> {
        scope.require_admin()?;
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        let email = match input.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if email != user.email {
                    if let Some(other) = self.user_repo.find_by_email(&email).await? {
                        if other.id != user.id {
                            return Err(AppError::Conflict(format!(
                                "Email already registered: {email}"
                            )));
                        }
                    }
                }
                Some(email)
            }
            None => None,
        };

        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(password) = input.password.filter(|p| !p.trim().is_empty()) {
            if password.chars().count() < 6 {
                return Err(AppError::Validation(
                    "password: must be at least 6 characters".to_string(),
                ));
            }
            active.password_hash = Set(hash_password(&password)?);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(job_title) = input.job_title {
            active.job_title = Set(Some(job_title));
        }
        if let Some(institution) = input.institution {
            active.institution = Set(institution);
        }
        if let Some(accessible) = input.accessible_institutions {
            active.accessible_institutions = Set(serde_json::json!(dedup(accessible)));
        }

        active.updated_at = Set(Some(Utc::now().into()));

        let user = self.user_repo.update(active).await?;
        tracing::info!(user_id = %user.id, by = %scope.user_id, "Updated user");
        Ok(user)
    }

    /// Delete a user (admin only). Nothing else is removed.
    pub async fn delete(&self, scope: &AccessScope, id: &str) -> AppResult<()> {
        scope.require_admin()?;

        if id == scope.user_id {
            return Err(AppError::BadRequest(
                "Administrators cannot delete their own account".to_string(),
            ));
        }

        self.user_repo.delete(id).await?;
        tracing::info!(user_id = %id, by = %scope.user_id, "Deleted user");
        Ok(())
    }

    /// Create the configured admin when the store has no users yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        bootstrap: &BootstrapConfig,
        headquarters: &str,
    ) -> AppResult<Option<user::Model>> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }

        let institution = bootstrap
            .institution
            .clone()
            .unwrap_or_else(|| headquarters.to_string());

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(bootstrap.admin_name.clone()),
            email: Set(bootstrap.admin_email.trim().to_lowercase()),
            password_hash: Set(hash_password(&bootstrap.admin_password)?),
            role: Set(UserRole::Admin),
            avatar_url: Set(None),
            job_title: Set(None),
            institution: Set(institution.clone()),
            accessible_institutions: Set(serde_json::json!([institution])),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Created bootstrap admin");
        Ok(Some(user))
    }
}

/// Order-preserving de-duplication.
fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(values.len());
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
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
