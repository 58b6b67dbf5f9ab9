//! Layered error definitions
//!
//! Categorized by source: config / node script / surface / sink

use thiserror::Error;

/// Unified contract error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Node Script Errors =====
    /// Malformed node command entry
    #[error("node script entry {index} ('{node}'): {message}")]
    NodeScript {
        index: usize,
        node: String,
        message: String,
    },

    // ===== Surface Errors =====
    /// The control surface was closed underneath the caller
    #[error("control surface closed")]
    SurfaceClosed,

    /// A display primitive operation failed
    #[error("display surface error: {message}")]
    Surface { message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create node script error
    pub fn node_script(index: usize, node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NodeScript {
            index,
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create display surface error
    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
