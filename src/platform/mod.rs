//! Access-platform client facade
//!
//! Thin abstraction over the zero-trust access platform. The watcher only
//! needs four operations: ping, list access requests, set a request's state,
//! and upsert a lock. [`AccessPlatform`] captures exactly those;
//! [`PlatformClient`] implements them over the platform's HTTP API and owns
//! the credentials and transport.

pub mod client;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::PlatformResult;
use crate::model::AccessRequest;

pub use client::PlatformClient;

/// Prefix for lock names created by this watcher
pub const LOCK_NAME_PREFIX: &str = "jit-watcher-";

/// State transition requested for a pending access request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    Approved,
    Denied,
}

impl RequestDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestDecision::Approved => "APPROVED",
            RequestDecision::Denied => "DENIED",
        }
    }
}

/// A lock targeting one approved access request.
///
/// The lock's existence is what revokes the approval; the one-hour expiry
/// only bounds accidental denial of service from a stale watcher. Upserting
/// with the same name refreshes the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSpec {
    pub name: String,
    pub target: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl LockSpec {
    /// Build the lock for a request: name `jit-watcher-<request-id>`,
    /// expiry exactly one hour from now.
    pub fn for_request(request_id: &str, message: impl Into<String>) -> Self {
        Self {
            name: format!("{}{}", LOCK_NAME_PREFIX, request_id),
            target: request_id.to_string(),
            message: message.into(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }
}

/// Operations the watcher needs from the access platform.
///
/// The production implementation is [`PlatformClient`]; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait AccessPlatform: Send + Sync {
    /// Connectivity probe. Called once at startup; failure is fatal.
    async fn ping(&self) -> PlatformResult<()>;

    /// List all access requests (empty filter) as snapshots.
    async fn list_access_requests(&self) -> PlatformResult<Vec<AccessRequest>>;

    /// Transition a pending request to APPROVED or DENIED with a reason.
    async fn set_request_state(
        &self,
        request_id: &str,
        decision: RequestDecision,
        reason: &str,
    ) -> PlatformResult<()>;

    /// Create or refresh a lock. Idempotent by lock name.
    async fn upsert_lock(&self, lock: &LockSpec) -> PlatformResult<()>;
}
