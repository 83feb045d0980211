//! Façade services.
//!
//! Every mutation checks the caller's [`AccessScope`](crate::AccessScope)
//! before touching the store.

#![allow(missing_docs)]

pub mod dashboard;
pub mod institution;
pub mod project;
pub mod user;
pub mod user_group;
pub mod vote;

pub use dashboard::{DashboardService, DashboardSummary};
pub use institution::{CreateInstitutionInput, InstitutionService, UpdateInstitutionInput};
pub use project::{
    CreateProjectInput, ProjectDetail, ProjectService, UpdateProjectInput, derive_status,
};
pub use user::{CreateUserInput, UpdateUserInput, UserService};
pub use user_group::{CreateGroupInput, UpdateGroupInput, UserGroupService};
pub use vote::{CastVoteInput, CastVoteOutcome, ReconcileOutcome, VoteService};
