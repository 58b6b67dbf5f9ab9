//! Runtime core error types

use camera_backend::BackendError;
use contracts::ContractError;
use thiserror::Error;

/// Error classes seen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or command issued in the wrong state, nothing was mutated
    Validation,
    /// A collaborator (camera, surface, sink) call failed
    Collaborator,
    /// Escalated per-tick stream failure
    Fatal,
}

/// Runtime core error
#[derive(Debug, Error)]
pub enum PanelError {
    /// Input rejected before any state was touched
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Camera Backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Control Surface or sink failure
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Per-tick stream failure raised while the stream was still running
    #[error("stream step failed: {source}")]
    StreamStep {
        #[source]
        source: Box<PanelError>,
    },
}

impl PanelError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn stream_step(source: PanelError) -> Self {
        Self::StreamStep {
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Backend(_) | Self::Contract(_) => ErrorKind::Collaborator,
            Self::StreamStep { .. } => ErrorKind::Fatal,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, PanelError>;
