//! Wire types for the platform API
//!
//! DTOs for the platform's JSON endpoints plus the adaptation into the
//! watcher's snapshot model. Keeping the wire shape separate means the rest
//! of the watcher never sees platform JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AccessRequest, RequestState, ResourceRef};
use crate::platform::LockSpec;

/// Access request as returned by `GET /v1/access-requests`
#[derive(Debug, Clone, Deserialize)]
pub struct AccessRequestRecord {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceRef>,
    pub created_at: DateTime<Utc>,
    pub state: RequestState,
}

impl AccessRequestRecord {
    /// Adapt the wire record into the in-memory snapshot
    pub fn into_snapshot(self) -> AccessRequest {
        AccessRequest {
            id: self.id,
            user: self.user,
            roles: self.roles,
            resources: self.resources,
            created_at: self.created_at,
            state: self.state,
        }
    }
}

/// Body for `PUT /v1/access-requests/{id}/state`
#[derive(Debug, Serialize)]
pub struct StateUpdateBody<'a> {
    pub state: &'a str,
    pub reason: &'a str,
}

/// Body for `PUT /v1/locks/{name}`
#[derive(Debug, Serialize)]
pub struct LockBody<'a> {
    pub target: &'a str,
    pub message: &'a str,
    pub expires_at: DateTime<Utc>,
}

impl<'a> LockBody<'a> {
    pub fn from_spec(spec: &'a LockSpec) -> Self {
        Self {
            target: &spec.target,
            message: &spec.message,
            expires_at: spec.expires_at,
        }
    }
}
