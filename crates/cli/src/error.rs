//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Session script could not be loaded
    #[error("Invalid session script {path}: {message}")]
    Script { path: String, message: String },

    /// The scheduler loop terminated on an escalated failure
    #[error("Session terminated after {ticks} ticks: {message}")]
    SessionTerminated { ticks: u64, message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn script(path: &Path, message: impl Into<String>) -> Self {
        Self::Script {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    pub fn session_terminated(ticks: u64, message: impl Into<String>) -> Self {
        Self::SessionTerminated {
            ticks,
            message: message.into(),
        }
    }
}
