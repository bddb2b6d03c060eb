//! Error types for jitwatch
//!
//! `thiserror` enums per concern, folded into a top-level `AppError` at the
//! binary boundary. Only configuration/identity errors and the initial
//! connectivity probe are fatal; everything the control loop hits at runtime
//! is logged and absorbed so the next tick can retry.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid conflict pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Identity-file errors
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Identity file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read identity file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Identity file {0} contains no credential")]
    Empty(PathBuf),
}

/// Access-platform API errors
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Platform API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: invalid or expired identity credential")]
    Unauthorized,

    #[error("Forbidden: watcher identity lacks permission for {action}")]
    Forbidden { action: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid response from platform: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// Map an HTTP status code and response body into a typed error
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => PlatformError::Unauthorized,
            403 => PlatformError::Forbidden {
                action: "this operation".into(),
            },
            404 => PlatformError::NotFound {
                resource: "requested resource".into(),
            },
            _ => PlatformError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for platform API operations
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;
