//! User group service.

use chrono::Utc;
use govboard_common::{AppResult, IdGenerator};
use govboard_db::{
    entities::user_group,
    repositories::{UserGroupFilter, UserGroupRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::scope::AccessScope;

/// User group service for business logic.
#[derive(Clone)]
pub struct UserGroupService {
    group_repo: UserGroupRepository,
    id_gen: IdGenerator,
}

/// Input for creating a group.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 32))]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    #[serde(default)]
    pub user_ids: Vec<String>,
}

/// Input for updating a group. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,

    #[validate(length(max = 2048))]
    pub description: Option<String>,

    /// Replaces the whole member set.
    pub user_ids: Option<Vec<String>>,
}

fn member_set(mut ids: Vec<String>) -> serde_json::Value {
    ids.sort();
    ids.dedup();
    serde_json::json!(ids)
}

impl UserGroupService {
    /// Create a new user group service.
    #[must_use]
    pub const fn new(group_repo: UserGroupRepository) -> Self {
        Self {
            group_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// All groups; visible to any authenticated caller.
    pub async fn list(&self, filter: &UserGroupFilter) -> AppResult<Vec<user_group::Model>> {
        self.group_repo.find_all(filter).await
    }

    /// Create a group (admin only).
    pub async fn create(
        &self,
        scope: &AccessScope,
        input: CreateGroupInput,
    ) -> AppResult<user_group::Model> {
        scope.require_admin()?;
        input.validate()?;

        let model = user_group::ActiveModel {
            id: Set(input.id.unwrap_or_else(|| self.id_gen.generate())),
            name: Set(input.name),
            description: Set(input.description),
            user_ids: Set(member_set(input.user_ids)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let group = self.group_repo.create(model).await?;
        tracing::info!(group_id = %group.id, members = group.member_ids().len(), "Created user group");
        Ok(group)
    }

    /// Update a group (admin only).
    pub async fn update(
        &self,
        scope: &AccessScope,
        id: &str,
        input: UpdateGroupInput,
    ) -> AppResult<user_group::Model> {
        scope.require_admin()?;
        input.validate()?;

        let group = self.group_repo.get_by_id(id).await?;
        let mut active: user_group::ActiveModel = group.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(user_ids) = input.user_ids {
            active.user_ids = Set(member_set(user_ids));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        self.group_repo.update(active).await
    }

    /// Delete a group (admin only). Member accounts are untouched.
    pub async fn delete(&self, scope: &AccessScope, id: &str) -> AppResult<()> {
        scope.require_admin()?;

        self.group_repo.delete(id).await?;
        tracing::info!(group_id = %id, by = %scope.user_id, "Deleted user group");
        Ok(())
    }
}
