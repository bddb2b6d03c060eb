//! The watcher control loop
//!
//! One [`Watcher`] owns a platform facade, the compiled conflict matcher,
//! and the advisory locked-this-session set. [`Watcher::run`] drives one
//! policy check immediately and then one per poll interval, serially, until
//! the cancellation token fires. Each check is a *tick*: list every access
//! request, adjudicate the pending ones, then reconcile each user's
//! approved ones.
//!
//! A tick that fails internally is logged and absorbed; the platform is the
//! source of truth, so the next tick converges. Only the initial
//! connectivity probe is fatal.

pub mod adjudicator;
pub mod reconciler;

use std::collections::HashSet;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::WatcherConfig;
use crate::error::{ConfigError, PlatformResult, Result};
use crate::model::group_approved_by_user;
use crate::platform::AccessPlatform;
use crate::policy::ConflictMatcher;

pub use adjudicator::Verdict;

/// Access-request watcher
pub struct Watcher<P> {
    config: WatcherConfig,
    platform: P,
    matcher: ConflictMatcher,
    /// Request ids locked by this process. Advisory: it only suppresses
    /// redundant upserts; correctness never depends on it.
    locked: HashSet<String>,
}

impl<P: AccessPlatform> Watcher<P> {
    /// Build a watcher, compiling the configured conflict patterns.
    pub fn new(config: WatcherConfig, platform: P) -> std::result::Result<Self, ConfigError> {
        let matcher = ConflictMatcher::new(&config.conflict_patterns)?;
        Ok(Self {
            config,
            platform,
            matcher,
            locked: HashSet::new(),
        })
    }

    /// Run the control loop until `shutdown` is cancelled.
    ///
    /// Pings the platform first; a failed probe is fatal. Afterwards every
    /// failure is logged and the loop keeps going. An in-flight tick is
    /// raced against the token, so cancellation preempts pending platform
    /// calls.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        self.platform.ping().await?;
        info!("Successfully connected to the access platform");
        self.log_startup();

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first = true;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, stopping watcher");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if first {
                        info!("Running initial policy check");
                        first = false;
                    } else {
                        debug!("Running scheduled policy check");
                    }

                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Shutdown requested, aborting in-flight policy check");
                            return Ok(());
                        }
                        result = self.run_once() => {
                            if let Err(e) = result {
                                error!(error = %e, "Policy check failed");
                            }
                        }
                    }
                }
            }
        }
    }

    /// One tick: list, adjudicate pending, reconcile approved per user.
    pub async fn run_once(&mut self) -> PlatformResult<()> {
        let requests = self.platform.list_access_requests().await?;
        debug!("Fetched {} access requests", requests.len());

        if requests.is_empty() {
            info!("No access requests found");
            return Ok(());
        }

        let processed = self.adjudicate_pending(requests).await;

        let approved = group_approved_by_user(processed);
        if approved.is_empty() {
            info!("No approved requests found");
            return Ok(());
        }

        for (user, group) in approved {
            debug!(user = %user, requests = group.len(), "Reconciling approved requests");
            let unlocked = self.enforce_environment_conflicts(&user, group).await;
            self.enforce_resource_limits(&user, unlocked).await;
        }

        Ok(())
    }

    fn log_startup(&self) {
        info!(
            proxy = %self.config.proxy_addr,
            identity_file = %self.config.identity_file.display(),
            poll_interval = ?self.config.poll_interval,
            "Starting JIT access request watcher"
        );

        let mut policies = Vec::new();
        if self.config.check_conflicts {
            policies.push(format!(
                "environment conflicts (patterns: {})",
                self.config.conflict_patterns.join(", ")
            ));
        }
        if self.config.check_resources {
            policies.push(format!("resource limit ({})", self.config.max_resources));
        }
        info!("Enabled policies: {}", policies.join(", "));
    }
}
