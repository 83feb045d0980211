//! User repository.

use std::sync::Arc;

use super::{InstitutionScope, contains_ci, search_term};
use crate::entities::{User, user};
use crate::map_db_err;
use govboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

/// Optional narrowing of a user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of the name or job title.
    pub search: Option<String>,
    /// Exact home institution.
    pub institution: Option<String>,
}

impl UserFilter {
    fn condition(&self, scope: &InstitutionScope, self_id: &str) -> Condition {
        let mut condition = Condition::all();
        if let InstitutionScope::Only(names) = scope {
            // Callers always see their own account
            condition = condition.add(
                Condition::any()
                    .add(user::Column::Institution.is_in(names.clone()))
                    .add(user::Column::Id.eq(self_id)),
            );
        }
        if let Some(term) = search_term(self.search.as_deref()) {
            condition = condition.add(
                Condition::any()
                    .add(contains_ci(user::Column::Name, term))
                    .add(contains_ci(user::Column::JobTitle, term)),
            );
        }
        if let Some(institution) = &self.institution {
            condition = condition.add(user::Column::Institution.eq(institution.as_str()));
        }
        condition
    }
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a user by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Users visible under `scope` to the user `self_id`, by name.
    pub async fn find_visible(
        &self,
        scope: &InstitutionScope,
        self_id: &str,
        filter: &UserFilter,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(filter.condition(scope, self_id))
            .order_by_asc(user::Column::Name)
            .order_by_asc(user::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count users visible under `scope` to the user `self_id`.
    pub async fn count_visible(
        &self,
        scope: &InstitutionScope,
        self_id: &str,
        filter: &UserFilter,
    ) -> AppResult<u64> {
        User::find()
            .filter(filter.condition(scope, self_id))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a user. Group memberships and cast votes are left dangling.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = User::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }
}
