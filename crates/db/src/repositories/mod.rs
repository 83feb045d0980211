//! Repositories over the entity store.
//!
//! Every listing that is subject to access scoping takes an
//! [`InstitutionScope`], which is turned into a query predicate here rather
//! than filtered in memory afterwards.

mod institution;
mod project;
mod user;
mod user_group;
mod vote_record;

pub use institution::{InstitutionFilter, InstitutionRepository};
pub use project::{ProjectFilter, ProjectRepository};
pub use user::{UserFilter, UserRepository};
pub use user_group::{UserGroupFilter, UserGroupRepository};
pub use vote_record::{VoteHistoryFilter, VoteRecordRepository};

use sea_orm::{
    ColumnTrait,
    sea_query::{Expr, Func, SimpleExpr},
};

/// The set of institutions a listing may return rows for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstitutionScope {
    /// No restriction (administrators).
    All,
    /// Only rows whose institution is one of these names. Empty matches nothing.
    Only(Vec<String>),
}

impl InstitutionScope {
    /// Whether this scope can never match a row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Only(names) if names.is_empty())
    }

    /// Whether rows of `institution` fall inside this scope.
    #[must_use]
    pub fn allows(&self, institution: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(names) => names.iter().any(|n| n == institution),
        }
    }

    /// Predicate on `column`, or `None` when unrestricted.
    pub(crate) fn predicate<C: ColumnTrait>(&self, column: C) -> Option<SimpleExpr> {
        match self {
            Self::All => None,
            Self::Only(names) => Some(column.is_in(names.clone())),
        }
    }
}

/// Case-insensitive substring match on `column`.
pub(crate) fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!(
        "%{}%",
        needle
            .to_lowercase()
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    );
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// Trimmed, non-empty search text.
pub(crate) fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}
