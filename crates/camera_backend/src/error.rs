//! Camera Backend error types

use contracts::{AccessMode, ContractError, NodeOp};
use thiserror::Error;

/// Camera Backend specific error
#[derive(Debug, Error)]
pub enum BackendError {
    /// No camera matched the lookup reference
    #[error("could not find camera for '{config_ref}'")]
    CameraNotFound { config_ref: String },

    /// Operation issued before the camera was found/initialized
    #[error("{camera} camera is not initialized")]
    NotInitialized { camera: String },

    /// Node access mode differs from the expected one
    #[error("access mode check failed for '{node}': expected {expected}, node is {actual}")]
    AccessMode {
        node: String,
        expected: AccessMode,
        actual: AccessMode,
    },

    /// Node refused the operation
    #[error("node '{node}' rejected {op:?}: {message}")]
    NodeRejected {
        node: String,
        op: NodeOp,
        message: String,
    },

    /// Acquisition start/stop/grab failure
    #[error("acquisition error on {camera}: {message}")]
    Acquisition { camera: String, message: String },

    /// Failure injected by a mock
    #[error("injected {operation} failure on {camera}")]
    Injected {
        camera: String,
        operation: &'static str,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl BackendError {
    /// Create camera-not-found error
    pub fn not_found(config_ref: impl Into<String>) -> Self {
        Self::CameraNotFound {
            config_ref: config_ref.into(),
        }
    }

    /// Create not-initialized error
    pub fn not_initialized(camera: impl Into<String>) -> Self {
        Self::NotInitialized {
            camera: camera.into(),
        }
    }

    /// Create acquisition error
    pub fn acquisition(camera: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            camera: camera.into(),
            message: message.into(),
        }
    }

    /// Create node rejection error
    pub fn node_rejected(node: impl Into<String>, op: NodeOp, message: impl Into<String>) -> Self {
        Self::NodeRejected {
            node: node.into(),
            op,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BackendError>;
