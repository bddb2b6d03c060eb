//! Configuration for the watcher
//!
//! Operator input arrives from three layers, highest precedence first:
//! command-line flags (with `JITWATCH_*` env fallbacks, handled by clap),
//! an optional TOML config file, and built-in defaults. The merged result
//! is validated once at startup into a frozen [`WatcherConfig`]; nothing
//! downstream ever re-reads flags or files.

pub mod loader;
pub mod types;

pub use loader::{load_file_config, resolve, split_patterns};
pub use types::{FileConfig, Overrides, WatcherConfig};
