//! Vote ledger service.
//!
//! A cast appends a ledger row and rewrites the project's aggregate inside
//! one transaction, with the project row locked for the duration. The ledger
//! is authoritative: [`VoteService::reconcile`] rebuilds an aggregate from it.

use chrono::Utc;
use govboard_common::{AppError, AppResult, Config, IdGenerator};
use govboard_db::{
    entities::{
        project,
        vote_record::{self, VoteItemType, VoteType},
    },
    map_db_err,
    repositories::{ProjectRepository, VoteHistoryFilter, VoteRecordRepository},
};
use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use crate::{aggregate::VoteAggregate, scope::AccessScope};

/// Hard ceiling on history page size.
const MAX_HISTORY_LIMIT: u64 = 100;

/// Vote service for business logic.
#[derive(Clone)]
pub struct VoteService {
    project_repo: ProjectRepository,
    vote_repo: VoteRecordRepository,
    id_gen: IdGenerator,
    history_limit: u64,
}

/// A vote to cast. Voter fields come from the authenticated identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteInput {
    pub item_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub vote_type: VoteType,
}

/// Result of a cast: the appended row and the project's new tally.
#[derive(Debug, Clone)]
pub struct CastVoteOutcome {
    pub record: vote_record::Model,
    pub aggregate: VoteAggregate,
}

/// Result of an aggregate repair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOutcome {
    pub project_id: String,
    pub up: i32,
    pub down: i32,
    /// Whether the stored aggregate disagreed with the ledger.
    pub repaired: bool,
}

impl VoteService {
    /// Create a new vote service.
    #[must_use]
    pub fn new(
        project_repo: ProjectRepository,
        vote_repo: VoteRecordRepository,
        config: &Config,
    ) -> Self {
        Self {
            project_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
            history_limit: config.governance.vote_history_limit.min(MAX_HISTORY_LIMIT),
        }
    }

    /// Cast a vote on a project.
    ///
    /// A project the caller cannot see is reported as missing and nothing is
    /// written. A repeated vote by the same user replaces the earlier one in
    /// the aggregate; the ledger keeps both rows.
    pub async fn cast_vote(
        &self,
        scope: &AccessScope,
        input: CastVoteInput,
    ) -> AppResult<CastVoteOutcome> {
        let txn = self.project_repo.db().begin().await.map_err(map_db_err)?;

        let project = ProjectRepository::find_for_update(&txn, &input.item_id)
            .await?
            .filter(|p| scope.can_see_institution(&p.institution))
            .ok_or_else(|| AppError::ProjectNotFound(input.item_id.clone()))?;

        let record = VoteRecordRepository::append(&txn, self.new_record(&project, &input)).await?;

        let aggregate = match VoteAggregate::from_project(&project) {
            Ok(mut aggregate) => {
                aggregate.apply(&input.user_id, &input.user_name, input.vote_type);
                aggregate
            }
            Err(e) => {
                tracing::warn!(project_id = %project.id, error = %e, "Rebuilding vote aggregate from ledger");
                rebuild(&txn, &project.id).await?
            }
        };

        ProjectRepository::write_votes(
            &txn,
            &project.id,
            aggregate.up,
            aggregate.down,
            aggregate.user_votes_json()?,
        )
        .await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            project_id = %project.id,
            user_id = %input.user_id,
            vote = ?input.vote_type,
            up = aggregate.up,
            down = aggregate.down,
            "Vote cast"
        );

        Ok(CastVoteOutcome { record, aggregate })
    }

    fn new_record(
        &self,
        project: &project::Model,
        input: &CastVoteInput,
    ) -> vote_record::ActiveModel {
        vote_record::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id.clone()),
            user_name: Set(input.user_name.clone()),
            user_avatar: Set(input.user_avatar.clone()),
            item_id: Set(project.id.clone()),
            item_name: Set(project.name.clone()),
            item_type: Set(VoteItemType::Project),
            vote_type: Set(input.vote_type),
            institution: Set(project.institution.clone()),
            created_at: Set(Utc::now().into()),
        }
    }

    /// Vote history, newest first. Members only see their own votes.
    pub async fn list_history(
        &self,
        scope: &AccessScope,
        filter: &VoteHistoryFilter,
    ) -> AppResult<Vec<vote_record::Model>> {
        self.vote_repo
            .find_history(scope.history_voter(), filter, self.history_limit)
            .await
    }

    /// Rebuild a project's aggregate from the ledger (admin only).
    pub async fn reconcile(
        &self,
        scope: &AccessScope,
        project_id: &str,
    ) -> AppResult<ReconcileOutcome> {
        scope.require_admin()?;

        let txn = self.project_repo.db().begin().await.map_err(map_db_err)?;

        let project = ProjectRepository::find_for_update(&txn, project_id)
            .await?
            .ok_or_else(|| AppError::ProjectNotFound(project_id.to_string()))?;

        let aggregate = rebuild(&txn, project_id).await?;
        let repaired = aggregate.differs_from(&project);

        if repaired {
            ProjectRepository::write_votes(
                &txn,
                project_id,
                aggregate.up,
                aggregate.down,
                aggregate.user_votes_json()?,
            )
            .await?;
            tracing::warn!(
                project_id = %project_id,
                stored_up = project.votes_up,
                stored_down = project.votes_down,
                up = aggregate.up,
                down = aggregate.down,
                "Repaired vote aggregate from ledger"
            );
        }

        txn.commit().await.map_err(map_db_err)?;

        Ok(ReconcileOutcome {
            project_id: project_id.to_string(),
            up: aggregate.up,
            down: aggregate.down,
            repaired,
        })
    }
}

async fn rebuild<C: ConnectionTrait>(conn: &C, project_id: &str) -> AppResult<VoteAggregate> {
    let records = VoteRecordRepository::find_by_item(conn, project_id).await?;
    Ok(VoteAggregate::from_ledger(&records))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use govboard_common::config::{
        DatabaseConfig, GovernanceConfig, LoggingConfig, ServerConfig,
    };
    use govboard_db::entities::project::ProjectStatus;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_secs: 10,
                acquire_timeout_secs: 10,
            },
            governance: GovernanceConfig::default(),
            bootstrap: None,
            logging: LoggingConfig::default(),
        }
    }

    fn create_test_project(user_votes: serde_json::Value, up: i32, down: i32) -> project::Model {
        project::Model {
            id: "p1".to_string(),
            user_id: "admin1".to_string(),
            institution: "North".to_string(),
            name: "Road repair".to_string(),
            status: ProjectStatus::InProgress,
            progress: 40,
            description: None,
            responsible_name: None,
            config_name: None,
            start_date: None,
            end_date: None,
            votes_up: up,
            votes_down: down,
            user_votes,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_record(id: &str, user_id: &str, vote_type: VoteType) -> vote_record::Model {
        vote_record::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            user_name: format!("User {user_id}"),
            user_avatar: None,
            item_id: "p1".to_string(),
            item_name: "Road repair".to_string(),
            item_type: VoteItemType::Project,
            vote_type,
            institution: "North".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn scope(user_id: &str, is_admin: bool, accessible: &[&str]) -> AccessScope {
        AccessScope {
            user_id: user_id.to_string(),
            is_admin,
            accessible: accessible.iter().map(ToString::to_string).collect(),
        }
    }

    fn cast_input(user_id: &str, vote_type: VoteType) -> CastVoteInput {
        CastVoteInput {
            item_id: "p1".to_string(),
            user_id: user_id.to_string(),
            user_name: format!("User {user_id}"),
            user_avatar: None,
            vote_type,
        }
    }

    fn service(db: &Arc<DatabaseConnection>) -> VoteService {
        VoteService::new(
            ProjectRepository::new(Arc::clone(db)),
            VoteRecordRepository::new(Arc::clone(db)),
            &create_test_config(),
        )
    }

    fn updated() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_first_vote() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project(json!({}), 0, 0)]])
                .append_query_results([[create_test_record("v1", "u2", VoteType::Up)]])
                .append_exec_results([updated()])
                .into_connection(),
        );

        let outcome = service(&db)
            .cast_vote(&scope("u2", false, &["North"]), cast_input("u2", VoteType::Up))
            .await
            .unwrap();

        assert_eq!((outcome.aggregate.up, outcome.aggregate.down), (1, 0));
        assert_eq!(outcome.record.user_id, "u2");
    }

    #[tokio::test]
    async fn test_revote_replaces_entry() {
        // u2 voted up before; now votes down
        let project = create_test_project(json!({"u2": {"type": "up", "userName": "User u2"}}), 1, 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[project]])
                .append_query_results([[create_test_record("v2", "u2", VoteType::Down)]])
                .append_exec_results([updated()])
                .into_connection(),
        );

        let outcome = service(&db)
            .cast_vote(&scope("u2", false, &["North"]), cast_input("u2", VoteType::Down))
            .await
            .unwrap();

        assert_eq!((outcome.aggregate.up, outcome.aggregate.down), (0, 1));
        assert_eq!(outcome.aggregate.user_votes.len(), 1);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let logged = format!("{log:?}");
        assert!(logged.contains("INSERT"), "{logged}");
        assert!(logged.contains("UPDATE"));
        assert!(logged.contains("COMMIT"));
        // Ledger row goes in before the aggregate is written
        let insert_at = logged.find("INSERT").unwrap();
        let update_at = logged.find("UPDATE \\\"project\\\" SET").unwrap();
        assert!(insert_at < update_at);
    }

    #[tokio::test]
    async fn test_missing_project_writes_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project::Model>::new()])
                .into_connection(),
        );

        let result = service(&db)
            .cast_vote(&scope("u2", true, &[]), cast_input("u2", VoteType::Up))
            .await;
        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let logged = format!("{log:?}");
        assert!(!logged.contains("INSERT"), "{logged}");
        assert!(!logged.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_invisible_project_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project(json!({}), 0, 0)]])
                .into_connection(),
        );

        let result = service(&db)
            .cast_vote(&scope("u2", false, &["South"]), cast_input("u2", VoteType::Up))
            .await;
        assert!(matches!(result, Err(AppError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_history_scoped_for_member() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_record("v1", "u2", VoteType::Up)]])
                .into_connection(),
        );

        let rows = service(&db)
            .list_history(&scope("u2", false, &["North"]), &VoteHistoryFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let logged = format!("{log:?}");
        assert!(logged.contains("\"u2\""), "{logged}");
        assert!(logged.contains("100"));
    }

    #[tokio::test]
    async fn test_reconcile_repairs_divergent_aggregate() {
        // Stored aggregate missed u3's vote
        let project = create_test_project(json!({"u2": {"type": "up", "userName": "User u2"}}), 1, 0);
        let ledger = vec![
            create_test_record("v1", "u2", VoteType::Up),
            create_test_record("v2", "u3", VoteType::Down),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[project]])
                .append_query_results([ledger])
                .append_exec_results([updated()])
                .into_connection(),
        );

        let outcome = service(&db)
            .reconcile(&scope("admin1", true, &[]), "p1")
            .await
            .unwrap();

        assert!(outcome.repaired);
        assert_eq!((outcome.up, outcome.down), (1, 1));
    }

    #[tokio::test]
    async fn test_reconcile_consistent_aggregate_is_noop() {
        let project = create_test_project(json!({"u2": {"type": "up", "userName": "User u2"}}), 1, 0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[project]])
                .append_query_results([[create_test_record("v1", "u2", VoteType::Up)]])
                .into_connection(),
        );

        let outcome = service(&db)
            .reconcile(&scope("admin1", true, &[]), "p1")
            .await
            .unwrap();

        assert!(!outcome.repaired);
    }

    #[tokio::test]
    async fn test_reconcile_requires_admin() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(&db)
            .reconcile(&scope("u2", false, &["North"]), "p1")
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
