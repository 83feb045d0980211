//! Institution service.

use chrono::Utc;
use govboard_common::{AppError, AppResult, Config, IdGenerator};
use govboard_db::{
    entities::institution::{self, InstitutionStatus},
    repositories::{InstitutionFilter, InstitutionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::scope::{AccessScope, compare_institution_names};

/// Institution service for business logic.
#[derive(Clone)]
pub struct InstitutionService {
    institution_repo: InstitutionRepository,
    id_gen: IdGenerator,
    headquarters: String,
}

/// Input for creating an institution.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstitutionInput {
    #[validate(length(min = 1, max = 32))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[serde(default)]
    pub status: InstitutionStatus,
}

/// Input for updating an institution.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInstitutionInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    pub status: Option<InstitutionStatus>,
}

impl InstitutionService {
    /// Create a new institution service.
    #[must_use]
    pub fn new(institution_repo: InstitutionRepository, config: &Config) -> Self {
        Self {
            institution_repo,
            id_gen: IdGenerator::new(),
            headquarters: config.governance.headquarters_name.clone(),
        }
    }

    /// Name of the headquarters institution.
    #[must_use]
    pub fn headquarters(&self) -> &str {
        &self.headquarters
    }

    /// All institutions, headquarters first; visible to any authenticated caller.
    pub async fn list(&self, filter: &InstitutionFilter) -> AppResult<Vec<institution::Model>> {
        let mut institutions = self.institution_repo.find_all(filter).await?;
        institutions
            .sort_by(|a, b| compare_institution_names(&a.name, &b.name, &self.headquarters));
        Ok(institutions)
    }

    /// Picker names for the caller: active only, headquarters first and admin-only.
    pub async fn picker_names(&self, scope: &AccessScope) -> AppResult<Vec<String>> {
        let filter = InstitutionFilter {
            status: Some(InstitutionStatus::Active),
            ..Default::default()
        };
        let institutions = self.institution_repo.find_all(&filter).await?;
        Ok(crate::scope::picker_names(
            &institutions,
            scope,
            &self.headquarters,
        ))
    }

    /// Create an institution (admin only).
    pub async fn create(
        &self,
        scope: &AccessScope,
        input: CreateInstitutionInput,
    ) -> AppResult<institution::Model> {
        scope.require_admin()?;
        input.validate()?;

        let name = input.name.trim().to_string();
        if self.institution_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Institution already exists: {name}")));
        }

        let model = institution::ActiveModel {
            id: Set(input.id.unwrap_or_else(|| self.id_gen.generate())),
            name: Set(name),
            status: Set(input.status),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let institution = self.institution_repo.create(model).await?;
        tracing::info!(institution_id = %institution.id, name = %institution.name, "Created institution");
        Ok(institution)
    }

    /// Update an institution (admin only).
    ///
    /// Renaming does not rewrite projects or users that reference the old name.
    pub async fn update(
        &self,
        scope: &AccessScope,
        id: &str,
        input: UpdateInstitutionInput,
    ) -> AppResult<institution::Model> {
        scope.require_admin()?;
        input.validate()?;

        let institution = self.institution_repo.get_by_id(id).await?;
        let mut active: institution::ActiveModel = institution.clone().into();

        if let Some(name) = input.name.map(|n| n.trim().to_string()) {
            if name != institution.name {
                if let Some(other) = self.institution_repo.find_by_name(&name).await? {
                    if other.id != institution.id {
                        return Err(AppError::Conflict(format!(
                            "Institution already exists: {name}"
                        )));
                    }
                }
            }
            active.name = Set(name);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.institution_repo.update(active).await
    }

    /// Flip between active and inactive (admin only).
    pub async fn toggle(&self, scope: &AccessScope, id: &str) -> AppResult<institution::Model> {
        scope.require_admin()?;

        let institution = self.institution_repo.get_by_id(id).await?;
        let status = institution.status.toggled();

        let mut active: institution::ActiveModel = institution.into();
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));

        let institution = self.institution_repo.update(active).await?;
        tracing::info!(institution_id = %institution.id, status = ?institution.status, "Toggled institution");
        Ok(institution)
    }

    /// Hard-delete an institution (admin only). Nothing referencing it is touched.
    pub async fn delete(&self, scope: &AccessScope, id: &str) -> AppResult<()> {
        scope.require_admin()?;

        self.institution_repo.delete(id).await?;
        tracing::info!(institution_id = %id, by = %scope.user_id, "Deleted institution");
        Ok(())
    }

    /// Create the headquarters institution if it does not exist yet.
    pub async fn ensure_headquarters(&self) -> AppResult<()> {
        if self
            .institution_repo
            .find_by_name(&self.headquarters)
            .await?
            .is_none()
        {
            let model = institution::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(self.headquarters.clone()),
                status: Set(InstitutionStatus::Active),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            };
            self.institution_repo.create(model).await?;
            tracing::info!(name = %self.headquarters, "Created headquarters institution");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use govboard_common::config::{
        DatabaseConfig, GovernanceConfig, LoggingConfig, ServerConfig,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
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

    fn inst(id: &str, name: &str, status: InstitutionStatus) -> institution::Model {
        institution::Model {
            id: id.to_string(),
            name: name.to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn scope(is_admin: bool) -> AccessScope {
        AccessScope {
            user_id: "u1".to_string(),
            is_admin,
            accessible: vec!["Alpha".to_string()],
        }
    }

    fn service(db: MockDatabase) -> InstitutionService {
        InstitutionService::new(
            InstitutionRepository::new(Arc::new(db.into_connection())),
            &create_test_config(),
        )
    }

    #[tokio::test]
    async fn test_list_puts_headquarters_first() {
        // Store order is plain ORDER BY name
        let rows = vec![
            inst("i1", "Alpha", InstitutionStatus::Active),
            inst("i2", "Headquarters", InstitutionStatus::Inactive),
            inst("i3", "Évora", InstitutionStatus::Active),
            inst("i4", "Zeta", InstitutionStatus::Active),
        ];
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let names: Vec<String> = svc
            .list(&InstitutionFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Headquarters", "Alpha", "Évora", "Zeta"]);
    }

    #[tokio::test]
    async fn test_picker_for_member_hides_headquarters() {
        let rows = vec![
            inst("i1", "Zeta", InstitutionStatus::Active),
            inst("i2", "Headquarters", InstitutionStatus::Active),
            inst("i3", "Alpha", InstitutionStatus::Active),
        ];
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let names = svc.picker_names(&scope(false)).await.unwrap();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_picker_for_admin_puts_headquarters_first() {
        let rows = vec![
            inst("i1", "Zeta", InstitutionStatus::Active),
            inst("i2", "Headquarters", InstitutionStatus::Active),
            inst("i3", "Alpha", InstitutionStatus::Active),
        ];
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([rows]));

        let names = svc.picker_names(&scope(true)).await.unwrap();
        assert_eq!(names, vec!["Headquarters", "Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_create_forbidden_for_member() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreateInstitutionInput {
            id: None,
            name: "North".to_string(),
            status: InstitutionStatus::Active,
        };
        assert!(matches!(
            svc.create(&scope(false), input).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inst("i1", "North", InstitutionStatus::Active)]]),
        );

        let input = CreateInstitutionInput {
            id: None,
            name: " North ".to_string(),
            status: InstitutionStatus::Active,
        };
        assert!(matches!(
            svc.create(&scope(true), input).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_flips_status() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inst("i1", "North", InstitutionStatus::Active)]])
                .append_query_results([[inst("i1", "North", InstitutionStatus::Inactive)]]),
        );

        let toggled = svc.toggle(&scope(true), "i1").await.unwrap();
        assert_eq!(toggled.status, InstitutionStatus::Inactive);
    }

    #[tokio::test]
    async fn test_validation_runs_before_store() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let input = CreateInstitutionInput {
            id: None,
            name: String::new(),
            status: InstitutionStatus::Active,
        };
        assert!(matches!(
            svc.create(&scope(true), input).await,
            Err(AppError::Validation(_))
        ));
    }
}
