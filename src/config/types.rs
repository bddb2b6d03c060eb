//! Configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default maximum approved resources per user
pub const DEFAULT_MAX_RESOURCES: usize = 3;

/// Default polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default conflict patterns
pub const DEFAULT_CONFLICT_PATTERNS: &[&str] = &["prod", "research"];

/// Frozen watcher configuration, validated at startup
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Platform proxy address (host:port)
    pub proxy_addr: String,

    /// Path to the machine identity file
    pub identity_file: PathBuf,

    /// Maximum approved resources per user
    pub max_resources: usize,

    /// Enable resource-limit checking
    pub check_resources: bool,

    /// Enable role-conflict checking
    pub check_conflicts: bool,

    /// Conflict patterns, in operator-configured order
    pub conflict_patterns: Vec<String>,

    /// Polling cadence
    pub poll_interval: Duration,

    /// Enable debug logging
    pub debug: bool,
}

/// Values supplied on the command line (or via env), all optional.
///
/// `None` means the flag was not given and the file/default layers apply.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub proxy: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub max_resources: Option<usize>,
    pub check_resources: Option<bool>,
    pub check_conflicts: Option<bool>,
    /// Raw comma-separated pattern list, as typed by the operator
    pub conflict_patterns: Option<String>,
    pub poll_interval: Option<Duration>,
    pub debug: Option<bool>,
}

/// Optional TOML configuration file contents
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub proxy: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub max_resources: Option<usize>,
    pub resource_limit: Option<bool>,
    pub role_conflicts: Option<bool>,
    pub conflict_patterns: Option<Vec<String>>,
    /// Humantime duration string, e.g. `"30s"` or `"2m"`
    pub poll_interval: Option<String>,
    pub debug: Option<bool>,
}
