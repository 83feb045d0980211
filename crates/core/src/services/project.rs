//! Project service.

use chrono::{NaiveDate, Utc};
use govboard_common::{AppError, AppResult, IdGenerator};
use govboard_db::{
    entities::{
        project::{self, ProjectStatus},
        vote_record::VoteType,
    },
    repositories::{ProjectFilter, ProjectRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{aggregate::VoteAggregate, scope::AccessScope};

/// Project service for business logic.
#[derive(Clone)]
pub struct ProjectService {
    project_repo: ProjectRepository,
    id_gen: IdGenerator,
}

/// Input for creating a project. Everything but name and institution is optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 32))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 512))]
    pub name: String,

    #[validate(length(min = 1, max = 256))]
    pub institution: String,

    pub status: Option<ProjectStatus>,

    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,

    #[validate(length(max = 8192))]
    pub description: Option<String>,

    #[validate(length(max = 256))]
    pub responsible_name: Option<String>,

    #[validate(length(max = 256))]
    pub config_name: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input for updating a project. Absent fields are left unchanged; an
/// explicit `null` clears an optional field.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 512))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub institution: Option<String>,

    pub status: Option<ProjectStatus>,

    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 8192))]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 256))]
    pub responsible_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    #[validate(length(max = 256))]
    pub config_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub start_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<NaiveDate>>,
}

/// Present fields become `Some`, so `null` reads as `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A project with its voters resolved to names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub project: project::Model,
    pub approvers: Vec<String>,
    pub disapprovers: Vec<String>,
}

/// Status after a progress change.
///
/// Full progress completes the project and any progress starts a planned one.
/// Nothing else changes the status implicitly.
#[must_use]
pub const fn derive_status(status: ProjectStatus, progress: i32) -> ProjectStatus {
    if progress >= 100 {
        ProjectStatus::Completed
    } else if progress > 0 && matches!(status, ProjectStatus::Planned) {
        ProjectStatus::InProgress
    } else {
        status
    }
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation(
            "endDate: must not be before startDate".to_string(),
        )),
        _ => Ok(()),
    }
}

impl ProjectService {
    /// Create a new project service.
    #[must_use]
    pub const fn new(project_repo: ProjectRepository) -> Self {
        Self {
            project_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Projects visible to the caller, newest first.
    pub async fn list(
        &self,
        scope: &AccessScope,
        filter: &ProjectFilter,
    ) -> AppResult<Vec<project::Model>> {
        self.project_repo
            .find_visible(&scope.institutions(), filter)
            .await
    }

    /// A single project. Projects outside the caller's scope are reported as missing.
    pub async fn get(&self, scope: &AccessScope, id: &str) -> AppResult<ProjectDetail> {
        let project = self
            .project_repo
            .find_by_id(id)
            .await?
            .filter(|p| scope.can_see_institution(&p.institution))
            .ok_or_else(|| AppError::ProjectNotFound(id.to_string()))?;

        let aggregate = VoteAggregate::from_project(&project)?;
        Ok(ProjectDetail {
            approvers: aggregate.voter_names(VoteType::Up),
            disapprovers: aggregate.voter_names(VoteType::Down),
            project,
        })
    }

    /// Create a project (admin only). It starts with an empty vote aggregate.
    pub async fn create(
        &self,
        scope: &AccessScope,
        input: CreateProjectInput,
    ) -> AppResult<project::Model> {
        scope.require_admin()?;
        input.validate()?;
        check_dates(input.start_date, input.end_date)?;

        let progress = input.progress.unwrap_or(0);
        let status = derive_status(input.status.unwrap_or_default(), progress);

        let model = project::ActiveModel {
            id: Set(input.id.unwrap_or_else(|| self.id_gen.generate())),
            user_id: Set(scope.user_id.clone()),
            institution: Set(input.institution),
            name: Set(input.name),
            status: Set(status),
            progress: Set(progress),
            description: Set(input.description),
            responsible_name: Set(input.responsible_name),
            config_name: Set(input.config_name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            votes_up: Set(0),
            votes_down: Set(0),
            user_votes: Set(serde_json::json!({})),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let project = self.project_repo.create(model).await?;
        tracing::info!(project_id = %project.id, institution = %project.institution, "Created project");
        Ok(project)
    }

    /// Update a project (admin only). The vote aggregate is never touched here.
    pub async fn update(
        &self,
        scope: &AccessScope,
        id: &str,
        input: UpdateProjectInput,
    ) -> AppResult<project::Model> {
        scope.require_admin()?;
        input.validate()?;

        let project = self.project_repo.get_by_id(id).await?;
        check_dates(
            input.start_date.unwrap_or(project.start_date),
            input.end_date.unwrap_or(project.end_date),
        )?;

        let progress = input.progress.unwrap_or(project.progress);
        let status = derive_status(input.status.unwrap_or(project.status), progress);

        let mut active: project::ActiveModel = project.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(institution) = input.institution {
            active.institution = Set(institution);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(responsible_name) = input.responsible_name {
            active.responsible_name = Set(responsible_name);
        }
        if let Some(config_name) = input.config_name {
            active.config_name = Set(config_name);
        }
        if let Some(start_date) = input.start_date {
            active.start_date = Set(start_date);
        }
        if let Some(end_date) = input.end_date {
            active.end_date = Set(end_date);
        }
        active.progress = Set(progress);
        active.status = Set(status);
        active.updated_at = Set(Some(Utc::now().into()));

        let project = self.project_repo.update(active).await?;
        tracing::info!(project_id = %project.id, status = ?project.status, progress = project.progress, "Updated project");
        Ok(project)
    }

    /// Delete a project (admin only). Its vote records stay in the ledger.
    pub async fn delete(&self, scope: &AccessScope, id: &str) -> AppResult<()> {
        scope.require_admin()?;

        self.project_repo.delete(id).await?;
        tracing::info!(project_id = %id, by = %scope.user_id, "Deleted project");
        Ok(())
    }
}
