//! Pure policy evaluators
//!
//! Each evaluator inspects a single request snapshot and reports a
//! [`Violation`] with enough detail to render any of the diagnostic strings
//! the watcher emits. Whether a violation turns into a denial (pending
//! requests) or a lock (approved requests) is the caller's business.

use crate::model::AccessRequest;
use crate::policy::patterns::{ConflictMatcher, PatternRoles, conflict_summary};

/// A policy violation reported by an evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The request names more resources than the configured limit
    ResourceLimit { count: usize, limit: usize },
    /// The request's roles span two or more conflict patterns
    RoleConflict { matches: Vec<PatternRoles> },
}

impl Violation {
    /// Reason string surfaced when denying a pending request
    pub fn deny_reason(&self) -> String {
        match self {
            Violation::ResourceLimit { count, limit } => {
                format!(
                    "Request contains {} resources, exceeds limit of {}",
                    count, limit
                )
            }
            Violation::RoleConflict { matches } => {
                format!(
                    "Request contains conflicting environments - {}",
                    conflict_summary(matches)
                )
            }
        }
    }
}

/// Violated iff the request names more than `limit` resources
pub fn check_resource_limit(request: &AccessRequest, limit: usize) -> Option<Violation> {
    let count = request.resource_count();
    if count > limit {
        Some(Violation::ResourceLimit { count, limit })
    } else {
        None
    }
}

/// Violated iff the request's own roles span two or more conflict patterns
pub fn check_role_conflict(
    request: &AccessRequest,
    matcher: &ConflictMatcher,
) -> Option<Violation> {
    let matches = matcher.classify(&request.roles);
    if matches.len() >= 2 {
        Some(Violation::RoleConflict { matches })
    } else {
        None
    }
}
