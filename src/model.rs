//! Access-request snapshot model
//!
//! Typed, in-memory view of the platform's access requests. A snapshot is
//! taken once per tick and discarded at tick end; only `state` is ever
//! updated locally, and only to mirror a transition the platform has
//! already accepted.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an access request.
///
/// The platform knows more states than the watcher cares about; anything
/// outside the three below is `Other` and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestState {
    Pending,
    Approved,
    Denied,
    #[serde(other)]
    Other,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "PENDING",
            RequestState::Approved => "APPROVED",
            RequestState::Denied => "DENIED",
            RequestState::Other => "OTHER",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A specific resource named by an access request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_resource: Option<String>,
}

impl ResourceRef {
    /// Short `kind:name` label used in log lines
    pub fn label(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }
}

/// Snapshot of a single access request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub id: String,
    pub user: String,
    pub roles: Vec<String>,
    pub resources: Vec<ResourceRef>,
    pub created_at: DateTime<Utc>,
    pub state: RequestState,
}

impl AccessRequest {
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Comma-joined `kind:name` labels for log lines
    pub fn resource_summary(&self) -> String {
        self.resources
            .iter()
            .map(ResourceRef::label)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Total order over requests: creation time, ties broken by id.
    ///
    /// Wall-clock timestamps alone are not total (two requests can share a
    /// timestamp), so every sort in the watcher goes through this.
    pub fn cmp_created(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort newest first: greatest `(created_at, id)` leads.
pub fn sort_newest_first(requests: &mut [AccessRequest]) {
    requests.sort_by(|a, b| b.cmp_created(a));
}

/// Sort oldest first: least `(created_at, id)` leads.
pub fn sort_oldest_first(requests: &mut [AccessRequest]) {
    requests.sort_by(|a, b| a.cmp_created(b));
}

/// Group APPROVED requests by user, each group sorted newest first.
///
/// `BTreeMap` keeps the per-user iteration order deterministic; users are
/// independent, so any stable order is acceptable.
pub fn group_approved_by_user(
    requests: Vec<AccessRequest>,
) -> BTreeMap<String, Vec<AccessRequest>> {
    let mut grouped: BTreeMap<String, Vec<AccessRequest>> = BTreeMap::new();

    for request in requests {
        if request.state == RequestState::Approved {
            grouped.entry(request.user.clone()).or_default().push(request);
        }
    }

    for group in grouped.values_mut() {
        sort_newest_first(group);
    }

    grouped
}
