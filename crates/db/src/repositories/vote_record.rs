//! Vote ledger repository. Append-only: there is no update or delete.

use std::sync::Arc;

use super::{contains_ci, search_term};
use crate::entities::{
    VoteRecord,
    vote_record::{self, VoteType},
};
use crate::map_db_err;
use govboard_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Optional narrowing of a vote history listing.
#[derive(Debug, Clone, Default)]
pub struct VoteHistoryFilter {
    /// Case-insensitive substring of the voter name.
    pub user_name: Option<String>,
    /// Exact institution recorded on the row.
    pub institution: Option<String>,
    /// Case-insensitive substring of the item name.
    pub item_name: Option<String>,
    /// Exact vote direction.
    pub vote_type: Option<VoteType>,
}

impl VoteHistoryFilter {
    fn condition(&self, voter: Option<&str>) -> Condition {
        let mut condition = Condition::all();
        if let Some(user_id) = voter {
            condition = condition.add(vote_record::Column::UserId.eq(user_id));
        }
        if let Some(term) = search_term(self.user_name.as_deref()) {
            condition = condition.add(contains_ci(vote_record::Column::UserName, term));
        }
        if let Some(institution) = &self.institution {
            condition = condition.add(vote_record::Column::Institution.eq(institution.as_str()));
        }
        if let Some(term) = search_term(self.item_name.as_deref()) {
            condition = condition.add(contains_ci(vote_record::Column::ItemName, term));
        }
        if let Some(vote_type) = self.vote_type {
            condition = condition.add(vote_record::Column::VoteType.eq(vote_type));
        }
        condition
    }
}

/// Vote record repository for database operations.
#[derive(Clone)]
pub struct VoteRecordRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRecordRepository {
    /// Create a new vote record repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a record on `conn`.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        model: vote_record::ActiveModel,
    ) -> AppResult<vote_record::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// History rows, newest first.
    ///
    /// `voter` restricts the listing to one user's own rows.
    pub async fn find_history(
        &self,
        voter: Option<&str>,
        filter: &VoteHistoryFilter,
        limit: u64,
    ) -> AppResult<Vec<vote_record::Model>> {
        VoteRecord::find()
            .filter(filter.condition(voter))
            .order_by_desc(vote_record::Column::CreatedAt)
            .order_by_desc(vote_record::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Every record for an item on `conn`, oldest first.
    pub async fn find_by_item<C: ConnectionTrait>(
        conn: &C,
        item_id: &str,
    ) -> AppResult<Vec<vote_record::Model>> {
        VoteRecord::find()
            .filter(vote_record::Column::ItemId.eq(item_id))
            .order_by_asc(vote_record::Column::CreatedAt)
            .order_by_asc(vote_record::Column::Id)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Count records, optionally for one voter and one institution.
    pub async fn count(&self, voter: Option<&str>, institution: Option<&str>) -> AppResult<u64> {
        let filter = VoteHistoryFilter {
            institution: institution.map(str::to_string),
            ..Default::default()
        };

        VoteRecord::find()
            .filter(filter.condition(voter))
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
