//! Policy evaluation
//!
//! Two declarative policies drive every watcher decision:
//!
//! - **Resource limit**: a user may not hold more than `max_resources`
//!   approved resources.
//! - **Role conflict**: roles matching two or more configured environment
//!   patterns (e.g. `prod` and `research`) may not coexist in one scope.
//!
//! Evaluators here are pure; they never call the platform and never consult
//! watcher state. The adjudicator and reconciler decide what to do with a
//! reported [`Violation`].

pub mod evaluators;
pub mod patterns;

pub use evaluators::{Violation, check_resource_limit, check_role_conflict};
pub use patterns::{ConflictMatcher, PatternRoles, conflict_summary};
