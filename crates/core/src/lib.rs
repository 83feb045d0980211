//! Core business logic for govboard.
//!
//! [`AccessScope`] decides what a caller may see, [`VoteAggregate`] keeps the
//! per-project tally, and the services in [`services`] are the façade the
//! HTTP layer talks to.

pub mod aggregate;
pub mod scope;
pub mod services;

pub use aggregate::{UserVote, VoteAggregate};
pub use scope::AccessScope;
pub use services::*;
