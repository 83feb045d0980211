//! Project entity, carrying its embedded vote aggregate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    #[sea_orm(string_value = "PLANNED")]
    Planned,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "ON_HOLD")]
    OnHold,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Creator
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Owning institution name
    #[sea_orm(indexed)]
    pub institution: String,

    pub name: String,

    pub status: ProjectStatus,

    /// Completion percentage, 0..=100
    pub progress: i32,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(nullable)]
    pub responsible_name: Option<String>,

    #[sea_orm(nullable)]
    pub config_name: Option<String>,

    #[sea_orm(nullable)]
    pub start_date: Option<Date>,

    #[sea_orm(nullable)]
    pub end_date: Option<Date>,

    /// Number of `up` entries in `user_votes`
    pub votes_up: i32,

    /// Number of `down` entries in `user_votes`
    pub votes_down: i32,

    /// Membership map: voter id -> `{ "type": "up" | "down", "userName": ... }`
    #[sea_orm(column_type = "JsonBinary")]
    pub user_votes: Json,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
