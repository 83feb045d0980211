//! Institution repository.

use std::sync::Arc;

use super::{contains_ci, search_term};
use crate::entities::{
    Institution,
    institution::{self, InstitutionStatus},
};
use crate::map_db_err;
use govboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// Optional narrowing of an institution listing.
#[derive(Debug, Clone, Default)]
pub struct InstitutionFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Exact status.
    pub status: Option<InstitutionStatus>,
}

/// Institution repository for database operations.
#[derive(Clone)]
pub struct InstitutionRepository {
    db: Arc<DatabaseConnection>,
}

impl InstitutionRepository {
    /// Create a new institution repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an institution by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<institution::Model>> {
        Institution::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find an institution by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<institution::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Institution: {id}")))
    }

    /// Find an institution by its exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<institution::Model>> {
        Institution::find()
            .filter(institution::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// All institutions matching `filter`, by name.
    pub async fn find_all(
        &self,
        filter: &InstitutionFilter,
    ) -> AppResult<Vec<institution::Model>> {
        let mut query = Institution::find();
        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(contains_ci(institution::Column::Name, term));
        }
        if let Some(status) = filter.status {
            query = query.filter(institution::Column::Status.eq(status));
        }

        query
            .order_by_asc(institution::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count active institutions.
    pub async fn count_active(&self) -> AppResult<u64> {
        Institution::find()
            .filter(institution::Column::Status.eq(InstitutionStatus::Active))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new institution.
    pub async fn create(
        &self,
        model: institution::ActiveModel,
    ) -> AppResult<institution::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update an institution.
    pub async fn update(
        &self,
        model: institution::ActiveModel,
    ) -> AppResult<institution::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Hard-delete an institution. Projects and users naming it are untouched.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Institution::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Institution: {id}")));
        }
        Ok(())
    }
}
