//! Project repository.

use std::sync::Arc;

use super::{InstitutionScope, contains_ci, search_term};
use crate::entities::{
    Project,
    project::{self, ProjectStatus},
};
use crate::map_db_err;
use govboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Optional narrowing of a project listing.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive substring of the project name.
    pub search: Option<String>,
    /// Exact status.
    pub status: Option<ProjectStatus>,
    /// Exact owning institution.
    pub institution: Option<String>,
}

impl ProjectFilter {
    fn condition(&self, scope: &InstitutionScope) -> Condition {
        let mut condition = Condition::all();
        if let Some(pred) = scope.predicate(project::Column::Institution) {
            condition = condition.add(pred);
        }
        if let Some(term) = search_term(self.search.as_deref()) {
            condition = condition.add(contains_ci(project::Column::Name, term));
        }
        if let Some(status) = self.status {
            condition = condition.add(project::Column::Status.eq(status));
        }
        if let Some(institution) = &self.institution {
            condition = condition.add(project::Column::Institution.eq(institution.as_str()));
        }
        condition
    }
}

/// Project repository for database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Underlying connection, for callers that open a transaction.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find a project by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a project by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<project::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ProjectNotFound(id.to_string()))
    }

    /// Find a project by ID on `conn`, locking the row until the transaction ends.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Projects inside `scope`, newest first.
    pub async fn find_visible(
        &self,
        scope: &InstitutionScope,
        filter: &ProjectFilter,
    ) -> AppResult<Vec<project::Model>> {
        if scope.is_empty() {
            return Ok(vec![]);
        }

        Project::find()
            .filter(filter.condition(scope))
            .order_by_desc(project::Column::CreatedAt)
            .order_by_desc(project::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count projects inside `scope`.
    pub async fn count_visible(
        &self,
        scope: &InstitutionScope,
        filter: &ProjectFilter,
    ) -> AppResult<u64> {
        if scope.is_empty() {
            return Ok(0);
        }

        Project::find()
            .filter(filter.condition(scope))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Create a new project.
    pub async fn create(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a project.
    pub async fn update(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model.update(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Delete a project. Its vote records are left in place.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Project::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Overwrite the vote aggregate of a project on `conn`.
    ///
    /// Touches only the three aggregate columns.
    pub async fn write_votes<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        votes_up: i32,
        votes_down: i32,
        user_votes: serde_json::Value,
    ) -> AppResult<()> {
        let result = Project::update_many()
            .col_expr(project::Column::VotesUp, Expr::value(votes_up))
            .col_expr(project::Column::VotesDown, Expr::value(votes_down))
            .col_expr(project::Column::UserVotes, Expr::value(user_votes))
            .filter(project::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_project(id: &str, name: &str, institution: &str) -> project::Model {
        project::Model {
            id: id.to_string(),
            user_id: "admin1".to_string(),
            institution: institution.to_string(),
            name: name.to_string(),
            status: ProjectStatus::Planned,
            progress: 0,
            description: None,
            responsible_name: None,
            config_name: None,
            start_date: None,
            end_date: None,
            votes_up: 0,
            votes_down: 0,
            user_votes: json!({}),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()])
                .into_connection(),
        );

        let repo = ProjectRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_visible_empty_scope_skips_query() {
        // No query results appended: any query would fail
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ProjectRepository::new(db);
        let result = repo
            .find_visible(&InstitutionScope::Only(vec![]), &ProjectFilter::default())
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_find_visible_restricts_by_institution() {
        let p1 = create_test_project("p1", "Road repair", "North");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[p1]])
            .into_connection();
        let db = Arc::new(db);

        let repo = ProjectRepository::new(Arc::clone(&db));
        let scope = InstitutionScope::Only(vec!["North".to_string()]);
        let result = repo
            .find_visible(&scope, &ProjectFilter::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 1);

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let logged = format!("{log:?}");
        assert!(logged.contains("IN ($1)"), "{logged}");
        assert!(logged.contains("North"));
    }

    #[tokio::test]
    async fn test_find_visible_search_is_case_insensitive() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()])
                .into_connection(),
        );

        let repo = ProjectRepository::new(Arc::clone(&db));
        let filter = ProjectFilter {
            search: Some("ROAD".to_string()),
            ..Default::default()
        };
        repo.find_visible(&InstitutionScope::All, &filter)
            .await
            .unwrap();

        drop(repo);
        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let logged = format!("{log:?}");
        assert!(logged.contains("LOWER"), "{logged}");
        assert!(logged.contains("%road%"));
    }

    #[tokio::test]
    async fn test_count_visible() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = ProjectRepository::new(db);
        let count = repo
            .count_visible(&InstitutionScope::All, &ProjectFilter::default())
            .await
            .unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_delete_missing_project() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ProjectRepository::new(db);
        let result = repo.delete("p1").await;

        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_write_votes_updates_aggregate_columns() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        ProjectRepository::write_votes(&db, "p1", 1, 0, json!({"u1": {"type": "up"}}))
            .await
            .unwrap();

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);
        let logged = format!("{log:?}");
        assert!(logged.contains("UPDATE"), "{logged}");
        assert!(logged.contains("votes_up"));
        assert!(!logged.contains("progress"));
    }
}
