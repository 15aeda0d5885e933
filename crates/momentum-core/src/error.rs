//! Core error types for momentum-core.
//!
//! Usage errors (a transition requested from the wrong state) are not errors
//! at all: the engine ignores them and returns `None`. Only external-resource
//! failures, configuration problems and the deep-focus lock are typed here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for momentum-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Distraction-blocking errors
    #[error("Blocking error: {0}")]
    Blocking(#[from] BlockingError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data directory could not be resolved
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors surfaced by the blocking coordinator.
///
/// `DeepFocusLocked` is an invariant refusal, not a failure: the caller should
/// show a persistent "locked" indicator rather than a transient error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockingError {
    /// The user has not granted the blocking permission.
    #[error("Blocking is not authorized")]
    Unauthorized,

    /// The external blocking resource rejected the request.
    #[error("Blocking provider failed: {0}")]
    Provider(String),

    /// A blocking session is already active.
    #[error("A blocking session is already active for task '{task_id}'")]
    AlreadyActive { task_id: String },

    /// Deep Focus cannot be cancelled before the session completes.
    #[error("Deep Focus active - cannot stop")]
    DeepFocusLocked,
}

impl BlockingError {
    /// Whether the error is the deep-focus lock rather than a real failure.
    pub fn is_locked(&self) -> bool {
        matches!(self, BlockingError::DeepFocusLocked)
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
