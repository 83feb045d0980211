//! Database entities.

#![allow(missing_docs)]

pub mod institution;
pub mod project;
pub mod user;
pub mod user_group;
pub mod vote_record;

pub use institution::Entity as Institution;
pub use project::Entity as Project;
pub use user::Entity as User;
pub use user_group::Entity as UserGroup;
pub use vote_record::Entity as VoteRecord;
