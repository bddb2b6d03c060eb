//! Approved-request reconciliation
//!
//! Second half of a tick. For each user's approved requests (newest first),
//! two passes run in a fixed order:
//!
//! 1. **Environment conflicts**: requests whose own roles conflict are
//!    locked outright; then, if the surviving requests' combined roles
//!    still conflict, every conflict participant except the newest is
//!    locked. Conflicts go first because locking a request also frees its
//!    resources from the budget.
//! 2. **Resource limit**: over the still-unlocked requests, keep newest
//!    first while the cumulative resource count fits the limit; lock the
//!    rest. Newer requests reflect the user's current need; older ones are
//!    more likely stale carry-over.
//!
//! Locks revoke rather than deny: an approved request may already back a
//! live session, and only a lock takes effect immediately.

use tracing::{debug, error, info};

use crate::model::AccessRequest;
use crate::platform::{AccessPlatform, LockSpec};
use crate::policy::conflict_summary;
use crate::watcher::Watcher;

impl<P: AccessPlatform> Watcher<P> {
    /// Pass 1: lock conflicted requests; return the unlocked survivors.
    pub(crate) async fn enforce_environment_conflicts(
        &mut self,
        user: &str,
        group: Vec<AccessRequest>,
    ) -> Vec<AccessRequest> {
        if !self.config.check_conflicts || group.is_empty() {
            return group;
        }

        let total = group.len();
        info!(user = %user, "Checking environment conflicts");

        // Intra-request conflicts first. These requests are wrong on their
        // own and have no salvageable subset; they also must not feed the
        // cross-request role union below.
        let mut working = Vec::with_capacity(total);
        for request in group {
            let matches = self.matcher.classify(&request.roles);
            if matches.len() >= 2 {
                let reason = format!(
                    "Single request contains conflicting roles: {}",
                    conflict_summary(&matches)
                );
                info!(
                    request = %request.id,
                    reason = %reason,
                    "Locking request with conflicting roles"
                );
                self.lock_request(&request, reason).await;
            } else {
                working.push(request);
            }
        }

        if working.len() > 1 {
            let all_roles: Vec<String> = working
                .iter()
                .flat_map(|r| r.roles.iter().cloned())
                .collect();
            let matches = self.matcher.classify(&all_roles);

            if matches.len() >= 2 {
                info!(
                    user = %user,
                    conflict = %conflict_summary(&matches),
                    "User has multi-request environment conflict"
                );

                let mut participants: Vec<&AccessRequest> = working
                    .iter()
                    .filter(|r| self.matcher.matches_any(&r.roles))
                    .collect();

                if participants.len() > 1 {
                    // Oldest first; the newest participant survives.
                    participants.sort_by(|a, b| a.cmp_created(b));
                    let to_lock: Vec<AccessRequest> = participants
                        [..participants.len() - 1]
                        .iter()
                        .map(|r| (*r).clone())
                        .collect();

                    info!(
                        user = %user,
                        count = to_lock.len(),
                        "Locking older requests due to multi-request environment conflict"
                    );

                    let pattern_list = self.matcher.sources().join(" vs ");
                    for request in &to_lock {
                        let reason = format!(
                            "Multi-request environment conflict: user has conflicting \
                             access across requests ({})",
                            pattern_list
                        );
                        info!(
                            request = %request.id,
                            created = %request.created_at.to_rfc3339(),
                            roles = ?request.roles,
                            "Locking request for environment conflict"
                        );
                        self.lock_request(request, reason).await;
                    }
                }
            } else {
                debug!(user = %user, "No multi-request environment conflicts found");
            }
        }

        let unlocked: Vec<AccessRequest> = working
            .into_iter()
            .filter(|r| !self.locked.contains(&r.id))
            .collect();

        info!(
            user = %user,
            unlocked = unlocked.len(),
            total = total,
            "After environment conflict check"
        );
        unlocked
    }

    /// Pass 2: lock requests that fall outside the cumulative resource
    /// budget, keeping newest first.
    pub(crate) async fn enforce_resource_limits(
        &mut self,
        user: &str,
        requests: Vec<AccessRequest>,
    ) {
        if !self.config.check_resources || requests.is_empty() {
            return;
        }

        info!(user = %user, "Checking resource limits");

        let total: usize = requests.iter().map(AccessRequest::resource_count).sum();
        info!(
            user = %user,
            requests = requests.len(),
            resources = total,
            "Unlocked request totals"
        );

        if total <= self.config.max_resources {
            debug!(
                user = %user,
                resources = total,
                limit = self.config.max_resources,
                "User within resource limit"
            );
            return;
        }

        info!(
            user = %user,
            resources = total,
            limit = self.config.max_resources,
            "User over resource limit, reducing"
        );

        let mut budget = self.config.max_resources;
        let mut to_lock = Vec::new();

        for request in &requests {
            let count = request.resource_count();
            if budget >= count {
                budget -= count;
                debug!(
                    request = %request.id,
                    resources = count,
                    remaining = budget,
                    "Keeping request"
                );
            } else {
                debug!(
                    request = %request.id,
                    resources = count,
                    "Marking request for locking"
                );
                to_lock.push(request);
            }
        }

        if to_lock.is_empty() {
            return;
        }

        info!(
            user = %user,
            count = to_lock.len(),
            "Locking requests to enforce resource limit"
        );

        for request in to_lock {
            let reason = format!(
                "Exceeded maximum approved resources limit ({})",
                self.config.max_resources
            );
            info!(
                request = %request.id,
                created = %request.created_at.to_rfc3339(),
                resources = %request.resource_summary(),
                "Locking request over resource limit"
            );
            self.lock_request(request, reason).await;
        }
    }

    /// Upsert a lock for a request unless this process already did.
    ///
    /// The session set is only updated on success, so a failed upsert is
    /// retried naturally next tick.
    async fn lock_request(&mut self, request: &AccessRequest, reason: String) {
        if self.locked.contains(&request.id) {
            info!(request = %request.id, "Request already locked this session");
            return;
        }

        let lock = LockSpec::for_request(&request.id, reason);

        match self.platform.upsert_lock(&lock).await {
            Ok(()) => {
                info!(
                    request = %request.id,
                    lock = %lock.name,
                    "Successfully locked request"
                );
                self.locked.insert(request.id.clone());
            }
            Err(e) => {
                error!(
                    request = %request.id,
                    error = %e,
                    "Failed to lock request"
                );
            }
        }
    }
}
