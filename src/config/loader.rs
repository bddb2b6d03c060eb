//! Configuration loading, merging, and validation
//!
//! File loading uses the `config` crate. When `--config` names a file it is
//! the only file loaded and must exist; otherwise every existing file from
//! the well-known paths is merged, later paths overriding earlier ones.
//! CLI/env values always win over file values, which win over defaults.

use std::path::Path;
use std::time::Duration;

use config::{Config, File, FileFormat};

use crate::config::types::{
    DEFAULT_CONFLICT_PATTERNS, DEFAULT_MAX_RESOURCES, DEFAULT_POLL_INTERVAL, FileConfig,
    Overrides, WatcherConfig,
};
use crate::error::ConfigError;

/// Well-known config file paths, lowest priority first.
const CONFIG_PATHS_BY_PRIORITY: &[&str] = &[
    "/etc/jitwatch/config.toml",
    "~/.config/jitwatch/config.toml",
    "jitwatch.toml",
];

/// Load the optional configuration file layer.
pub fn load_file_config(config_path: Option<&str>) -> Result<FileConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        let expanded = shellexpand::tilde(path);
        if !Path::new(expanded.as_ref()).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
    } else {
        for path in CONFIG_PATHS_BY_PRIORITY {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
            }
        }
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))
}

/// Merge CLI overrides onto the file layer and defaults, then validate.
pub fn resolve(file: FileConfig, cli: Overrides) -> Result<WatcherConfig, ConfigError> {
    let poll_interval = match (cli.poll_interval, file.poll_interval) {
        (Some(interval), _) => interval,
        (None, Some(text)) => {
            humantime::parse_duration(&text).map_err(|e| ConfigError::Invalid {
                message: format!("poll_interval '{}' is not a valid duration: {}", text, e),
            })?
        }
        (None, None) => DEFAULT_POLL_INTERVAL,
    };

    let conflict_patterns = cli
        .conflict_patterns
        .as_deref()
        .map(split_patterns)
        .or_else(|| file.conflict_patterns.map(tidy_patterns))
        .filter(|patterns| !patterns.is_empty())
        .unwrap_or_else(|| {
            DEFAULT_CONFLICT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect()
        });

    let config = WatcherConfig {
        proxy_addr: cli.proxy.or(file.proxy).unwrap_or_default(),
        identity_file: cli
            .identity_file
            .or(file.identity_file)
            .unwrap_or_default(),
        max_resources: cli
            .max_resources
            .or(file.max_resources)
            .unwrap_or(DEFAULT_MAX_RESOURCES),
        check_resources: cli.check_resources.or(file.resource_limit).unwrap_or(true),
        check_conflicts: cli.check_conflicts.or(file.role_conflicts).unwrap_or(true),
        conflict_patterns,
        poll_interval,
        debug: cli.debug.or(file.debug).unwrap_or(false),
    };

    validate(&config)?;
    Ok(config)
}

/// Split a comma-separated pattern list: items trimmed, empties dropped.
pub fn split_patterns(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn tidy_patterns(patterns: Vec<String>) -> Vec<String> {
    patterns
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn validate(config: &WatcherConfig) -> Result<(), ConfigError> {
    if config.proxy_addr.is_empty() {
        return Err(ConfigError::Missing {
            field: "proxy (-p option)".to_string(),
        });
    }

    if config.identity_file.as_os_str().is_empty() {
        return Err(ConfigError::Missing {
            field: "identity-file (-i option)".to_string(),
        });
    }

    if !config.identity_file.exists() {
        return Err(ConfigError::Invalid {
            message: format!(
                "identity file does not exist: {}",
                config.identity_file.display()
            ),
        });
    }

    if config.max_resources < 1 {
        return Err(ConfigError::Invalid {
            message: format!(
                "max-resources must be a positive integer, got: {}",
                config.max_resources
            ),
        });
    }

    if config.poll_interval < Duration::from_secs(1) {
        return Err(ConfigError::Invalid {
            message: format!(
                "poll-interval must be at least 1 second, got: {:?}",
                config.poll_interval
            ),
        });
    }

    if config.check_conflicts && config.conflict_patterns.len() < 2 {
        return Err(ConfigError::Invalid {
            message: format!(
                "role conflict checking requires at least 2 patterns, got: {:?}",
                config.conflict_patterns
            ),
        });
    }

    Ok(())
}
