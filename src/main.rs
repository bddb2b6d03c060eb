//! jitwatch - JIT access request watcher
//!
//! Polling-based monitoring and policy enforcement for access requests.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use jitwatch::config::{Overrides, load_file_config, resolve};
use jitwatch::identity::Identity;
use jitwatch::platform::PlatformClient;
use jitwatch::watcher::Watcher;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// JIT access request watcher - polling-based policy enforcement
#[derive(Parser, Debug)]
#[command(name = "jitwatch")]
#[command(version, about, long_about = None)]
#[command(after_help = "\
Examples:
  # Run with default patterns (prod, research) checking every 30s
  jitwatch -p example.teleport.sh:443 -i ./identity

  # Use custom conflict patterns (dev, staging, prod)
  jitwatch -p example.teleport.sh:443 -i ./identity --conflict-patterns dev,staging,prod

  # Check every 10 seconds with debug output
  jitwatch -p example.teleport.sh:443 -i ./identity --poll-interval 10s -d

  # Run only environment conflict checking with custom patterns
  jitwatch -p example.teleport.sh:443 -i ./identity --resource-limit false --conflict-patterns test,prod
")]
struct Args {
    /// Platform proxy address (required, e.g. example.teleport.sh:443)
    #[arg(short, long, env = "JITWATCH_PROXY")]
    proxy: Option<String>,

    /// Path to the machine identity file (required)
    #[arg(short, long, env = "JITWATCH_IDENTITY_FILE")]
    identity_file: Option<PathBuf>,

    /// Maximum approved resources per user [default: 3]
    #[arg(short, long, env = "JITWATCH_MAX_RESOURCES")]
    max_resources: Option<usize>,

    /// Enable resource limit checking [default: true]
    #[arg(
        long,
        env = "JITWATCH_RESOURCE_LIMIT",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    resource_limit: Option<bool>,

    /// Enable role conflict checking [default: true]
    #[arg(
        long,
        env = "JITWATCH_ROLE_CONFLICTS",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    role_conflicts: Option<bool>,

    /// Comma-separated patterns for conflict detection [default: prod,research]
    #[arg(long, env = "JITWATCH_CONFLICT_PATTERNS")]
    conflict_patterns: Option<String>,

    /// How often to check for policy violations (minimum 1s) [default: 30s]
    #[arg(long, env = "JITWATCH_POLL_INTERVAL", value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Enable debug output
    #[arg(
        short,
        long,
        env = "JITWATCH_DEBUG",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    debug: Option<bool>,

    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "JITWATCH_CONFIG")]
    config: Option<String>,
}

impl Args {
    fn into_overrides(self) -> Overrides {
        Overrides {
            proxy: self.proxy,
            identity_file: self.identity_file,
            max_resources: self.max_resources,
            check_resources: self.resource_limit,
            check_conflicts: self.role_conflicts,
            conflict_patterns: self.conflict_patterns,
            poll_interval: self.poll_interval,
            debug: self.debug,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone();

    // Resolve configuration before logging is up; a validation failure
    // prints through anyhow and exits 1.
    let file_config = load_file_config(config_path.as_deref())?;
    let config = resolve(file_config, args.into_overrides())?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if config.debug { "debug" } else { "info" })
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting JIT access request watcher"
    );

    let identity = Identity::load(&config.identity_file)
        .inspect_err(|e| error!(error = %e, "Failed to load identity"))?;

    let client = PlatformClient::new(&config.proxy_addr, identity)
        .inspect_err(|e| error!(error = %e, "Failed to create platform client"))?;

    let mut watcher = Watcher::new(config, client)
        .inspect_err(|e| error!(error = %e, "Failed to create watcher"))?;

    let shutdown = CancellationToken::new();
    let mut watcher_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { watcher.run(shutdown).await }
    });

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = &mut watcher_handle => {
            // The watcher only returns on its own for a fatal startup error.
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
        }
        _ = sigterm.recv() => {
            info!("Received terminate signal, shutting down");
        }
    }

    shutdown.cancel();

    match tokio::time::timeout(Duration::from_secs(5), &mut watcher_handle).await {
        Ok(result) => {
            result??;
            info!("Watcher stopped gracefully");
        }
        Err(_) => {
            warn!("Timeout waiting for graceful shutdown");
        }
    }

    info!("JIT access request watcher completed");
    Ok(())
}
