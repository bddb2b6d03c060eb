//! Pending-request adjudication
//!
//! First half of a tick: every PENDING request is evaluated against the
//! enabled policies and either approved or denied through the platform.
//! Decisions are independent; iteration order is as received. Approvals
//! that the platform accepts are reflected in the snapshot so the request
//! flows straight into reconciliation; denied requests drop out entirely.

use tracing::{error, info};

use crate::model::{AccessRequest, RequestState};
use crate::platform::{AccessPlatform, RequestDecision};
use crate::policy::{Violation, check_resource_limit, check_role_conflict};
use crate::watcher::Watcher;

/// Reason attached to every auto-approval
pub const APPROVE_REASON: &str = "Auto-approved: complies with access policies";

/// Outcome of evaluating one pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Deny(String),
}

impl<P: AccessPlatform> Watcher<P> {
    /// Evaluate one request against the enabled policies.
    ///
    /// When both policies fire, the resource-limit reason comes first and
    /// the role-conflict reason second; operators rely on the combined
    /// string being stable.
    pub(crate) fn verdict(&self, request: &AccessRequest) -> Verdict {
        let mut violations = Vec::new();

        if self.config.check_resources {
            violations.extend(check_resource_limit(request, self.config.max_resources));
        }
        if self.config.check_conflicts {
            violations.extend(check_role_conflict(request, &self.matcher));
        }

        if violations.is_empty() {
            Verdict::Approve
        } else {
            let reason = violations
                .iter()
                .map(Violation::deny_reason)
                .collect::<Vec<_>>()
                .join("; ");
            Verdict::Deny(reason)
        }
    }

    /// Adjudicate all pending requests in the snapshot.
    ///
    /// Returns the snapshot for reconciliation: non-pending requests pass
    /// through untouched, freshly approved ones carry their new state, and
    /// requests whose state update failed are dropped for this tick.
    pub(crate) async fn adjudicate_pending(
        &self,
        requests: Vec<AccessRequest>,
    ) -> Vec<AccessRequest> {
        let (pending, mut processed): (Vec<_>, Vec<_>) = requests
            .into_iter()
            .partition(|r| r.state == RequestState::Pending);

        if pending.is_empty() {
            info!("No pending requests found");
            return processed;
        }

        info!("Found {} pending requests", pending.len());

        for mut request in pending {
            info!(
                request = %request.id,
                user = %request.user,
                "Evaluating pending request"
            );

            match self.verdict(&request) {
                Verdict::Approve => {
                    info!(
                        request = %request.id,
                        resources = request.resource_count(),
                        "Auto-approving request"
                    );

                    match self
                        .platform
                        .set_request_state(&request.id, RequestDecision::Approved, APPROVE_REASON)
                        .await
                    {
                        Ok(()) => {
                            info!(request = %request.id, "Successfully approved request");
                            request.state = RequestState::Approved;
                            processed.push(request);
                        }
                        Err(e) => {
                            error!(
                                request = %request.id,
                                error = %e,
                                "Failed to approve request"
                            );
                        }
                    }
                }
                Verdict::Deny(reason) => {
                    info!(
                        request = %request.id,
                        reason = %reason,
                        "Auto-denying request"
                    );

                    match self
                        .platform
                        .set_request_state(&request.id, RequestDecision::Denied, &reason)
                        .await
                    {
                        Ok(()) => {
                            info!(request = %request.id, "Successfully denied request");
                        }
                        Err(e) => {
                            error!(
                                request = %request.id,
                                error = %e,
                                "Failed to deny request"
                            );
                        }
                    }
                }
            }
        }

        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Overrides, resolve};
    use crate::model::ResourceRef;
    use crate::platform::LockSpec;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    struct NullPlatform;

    #[async_trait]
    impl AccessPlatform for NullPlatform {
        async fn ping(&self) -> crate::error::PlatformResult<()> {
            Ok(())
        }

        async fn list_access_requests(
            &self,
        ) -> crate::error::PlatformResult<Vec<AccessRequest>> {
            Ok(Vec::new())
        }

        async fn set_request_state(
            &self,
            _request_id: &str,
            _decision: RequestDecision,
            _reason: &str,
        ) -> crate::error::PlatformResult<()> {
            Ok(())
        }

        async fn upsert_lock(&self, _lock: &LockSpec) -> crate::error::PlatformResult<()> {
            Ok(())
        }
    }

    fn watcher(check_resources: bool, check_conflicts: bool) -> Watcher<NullPlatform> {
        let mut identity = tempfile::NamedTempFile::new().unwrap();
        identity.write_all(b"credential\n").unwrap();

        let config = resolve(
            Default::default(),
            Overrides {
                proxy: Some("proxy:443".to_string()),
                identity_file: Some(identity.path().to_path_buf()),
                check_resources: Some(check_resources),
                check_conflicts: Some(check_conflicts),
                ..Default::default()
            },
        )
        .unwrap();

        Watcher::new(config, NullPlatform).unwrap()
    }

    fn request(roles: &[&str], resource_count: usize) -> AccessRequest {
        AccessRequest {
            id: "r1".to_string(),
            user: "alice".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            resources: (0..resource_count)
                .map(|i| ResourceRef {
                    kind: "node".to_string(),
                    name: format!("node-{i}"),
                    cluster: None,
                    sub_resource: None,
                })
                .collect(),
            created_at: Utc.timestamp_opt(100, 0).unwrap(),
            state: RequestState::Pending,
        }
    }

    #[test]
    fn test_compliant_request_approved() {
        let w = watcher(true, true);
        assert_eq!(w.verdict(&request(&["db-readonly"], 2)), Verdict::Approve);
    }

    #[test]
    fn test_over_budget_denied() {
        let w = watcher(true, true);
        match w.verdict(&request(&["safe"], 4)) {
            Verdict::Deny(reason) => {
                assert_eq!(reason, "Request contains 4 resources, exceeds limit of 3");
            }
            Verdict::Approve => panic!("expected denial"),
        }
    }

    #[test]
    fn test_conflicting_roles_denied() {
        let w = watcher(true, true);
        match w.verdict(&request(&["prod-admin", "research-lab"], 1)) {
            Verdict::Deny(reason) => {
                assert!(reason.contains("prod: [prod-admin]"));
                assert!(reason.contains("research: [research-lab]"));
            }
            Verdict::Approve => panic!("expected denial"),
        }
    }

    #[test]
    fn test_both_violations_resource_reason_first() {
        let w = watcher(true, true);
        match w.verdict(&request(&["prod-admin", "research-lab"], 4)) {
            Verdict::Deny(reason) => {
                let resource_pos = reason.find("exceeds limit").unwrap();
                let conflict_pos = reason.find("conflicting environments").unwrap();
                assert!(resource_pos < conflict_pos);
                assert!(reason.contains("; "));
            }
            Verdict::Approve => panic!("expected denial"),
        }
    }

    #[test]
    fn test_disabled_policies_are_silent() {
        let w = watcher(false, false);
        assert_eq!(
            w.verdict(&request(&["prod-admin", "research-lab"], 10)),
            Verdict::Approve
        );

        let w = watcher(true, false);
        assert_eq!(
            w.verdict(&request(&["prod-admin", "research-lab"], 1)),
            Verdict::Approve
        );

        let w = watcher(false, true);
        assert_eq!(w.verdict(&request(&["safe"], 10)), Verdict::Approve);
    }
}
