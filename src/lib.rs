//! JIT access request watcher
//!
//! A policy-enforcement control loop for Just-in-Time privileged-access
//! requests. The watcher polls the access platform's request store and:
//!
//! - **Adjudicates pending requests**: approves requests that comply with
//!   the enabled policies, denies the rest with a diagnostic reason.
//! - **Reconciles approved requests**: per user, revokes approvals that
//!   violate post-hoc invariants by upserting targeted locks, without
//!   disturbing unrelated approvals.
//!
//! ## Policies
//!
//! - **Resource limit**: a user's approved requests may cover at most
//!   `max-resources` resources in total.
//! - **Environment conflicts**: roles matching two or more configured
//!   patterns (e.g. `prod` and `research`) may not be held together,
//!   neither inside one request nor across a user's approved requests.
//!
//! The watcher keeps no durable state. The platform is the source of
//! truth, so the loop is restart-safe and converges by retrying each tick.

pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod platform;
pub mod policy;
pub mod util;
pub mod watcher;

// Re-export main types
pub use config::WatcherConfig;
pub use error::{AppError, Result};
pub use platform::{AccessPlatform, PlatformClient};
pub use watcher::Watcher;
