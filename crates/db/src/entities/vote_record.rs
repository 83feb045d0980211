//! Vote ledger entity. Rows are appended and never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a vote.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    #[sea_orm(string_value = "up")]
    Up,
    #[sea_orm(string_value = "down")]
    Down,
}

/// Kind of item a vote was cast on.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum VoteItemType {
    #[default]
    #[sea_orm(string_value = "project")]
    Project,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote_record")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Voter
    #[sea_orm(indexed)]
    pub user_id: String,

    pub user_name: String,

    #[sea_orm(nullable)]
    pub user_avatar: Option<String>,

    /// Voted item (project id); not a foreign key so rows survive project deletion
    #[sea_orm(indexed)]
    pub item_id: String,

    pub item_name: String,

    pub item_type: VoteItemType,

    pub vote_type: VoteType,

    /// Institution of the item at cast time
    #[sea_orm(indexed)]
    pub institution: String,

    #[serde(rename = "timestamp")]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
