//! Dashboard summary.

use std::collections::BTreeMap;

use govboard_common::AppResult;
use govboard_db::{
    entities::project::ProjectStatus,
    repositories::{
        InstitutionRepository, ProjectFilter, ProjectRepository, UserFilter, UserRepository,
        VoteRecordRepository,
    },
};
use serde::Serialize;

use crate::scope::AccessScope;

/// Headline numbers for the caller's view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: u64,
    /// Only statuses with at least one project.
    pub projects_by_status: BTreeMap<ProjectStatus, u64>,
    pub active_institutions: u64,
    pub visible_users: u64,
    pub visible_votes: u64,
}

#[derive(Clone)]
pub struct DashboardService {
    project_repo: ProjectRepository,
    institution_repo: InstitutionRepository,
    user_repo: UserRepository,
    vote_repo: VoteRecordRepository,
}

impl DashboardService {
    #[must_use]
    pub const fn new(
        project_repo: ProjectRepository,
        institution_repo: InstitutionRepository,
        user_repo: UserRepository,
        vote_repo: VoteRecordRepository,
    ) -> Self {
        Self {
            project_repo,
            institution_repo,
            user_repo,
            vote_repo,
        }
    }

    /// Summary of what the caller can see, optionally narrowed to one institution.
    pub async fn summary(
        &self,
        scope: &AccessScope,
        institution: Option<&str>,
    ) -> AppResult<DashboardSummary> {
        let institutions = scope.institutions();

        let projects = self
            .project_repo
            .find_visible(
                &institutions,
                &ProjectFilter {
                    institution: institution.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;

        let mut projects_by_status = BTreeMap::new();
        for project in &projects {
            *projects_by_status.entry(project.status).or_insert(0) += 1;
        }

        let visible_users = self
            .user_repo
            .count_visible(
                &institutions,
                &scope.user_id,
                &UserFilter {
                    institution: institution.map(str::to_string),
                    ..Default::default()
                },
            )
            .await?;

        Ok(DashboardSummary {
            total_projects: projects.len() as u64,
            projects_by_status,
            active_institutions: self.institution_repo.count_active().await?,
            visible_users,
            visible_votes: self
                .vote_repo
                .count(scope.history_voter(), institution)
                .await?,
        })
    }
}
