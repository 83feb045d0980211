//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[default]
    #[sea_orm(string_value = "MEMBER")]
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name
    pub name: String,

    /// Login email, stored lowercased
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    /// Avatar URL
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    #[sea_orm(nullable)]
    pub job_title: Option<String>,

    /// Home institution name
    #[sea_orm(indexed)]
    pub institution: String,

    /// Institution names this user may view (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub accessible_institutions: Json,

    /// Bearer token, rotated on sign-out
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Accessible institution names; a malformed column reads as empty.
    #[must_use]
    pub fn accessible_institution_names(&self) -> Vec<String> {
        serde_json::from_value(self.accessible_institutions.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
