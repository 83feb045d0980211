//! User group repository.

use std::sync::Arc;

use super::{contains_ci, search_term};
use crate::entities::{UserGroup, user_group};
use crate::map_db_err;
use govboard_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Optional narrowing of a group listing.
#[derive(Debug, Clone, Default)]
pub struct UserGroupFilter {
    /// Case-insensitive substring of the group name.
    pub search: Option<String>,
}

/// User group repository for database operations.
#[derive(Clone)]
pub struct UserGroupRepository {
    db: Arc<DatabaseConnection>,
}

impl UserGroupRepository {
    /// Create a new user group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user_group::Model>> {
        UserGroup::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a group by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user_group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User group: {id}")))
    }

    /// All groups, by name.
    pub async fn find_all(&self, filter: &UserGroupFilter) -> AppResult<Vec<user_group::Model>> {
        let mut query = UserGroup::find();
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(contains_ci(user_group::Column::Name, term));
        }

        query
            .order_by_asc(user_group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new group.
    pub async fn create(&self, model: user_group::ActiveModel) -> AppResult<user_group::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a group.
    pub async fn update(&self, model: user_group::ActiveModel) -> AppResult<user_group::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a group. Members are not touched.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = UserGroup::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User group: {id}")));
        }
        Ok(())
    }
}
