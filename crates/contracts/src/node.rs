//! Camera node commands
//!
//! Cameras expose a tree of named nodes (`AcquisitionMode`,
//! `TLStream.StreamBufferHandlingMode`, ...). Every node access carries the
//! access mode the caller expects, the backend refuses the call when the
//! node's actual mode differs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Read only
    #[serde(rename = "RO")]
    ReadOnly,
    /// Write only (commands)
    #[serde(rename = "WO")]
    WriteOnly,
    /// Read / write
    #[serde(rename = "RW")]
    ReadWrite,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ReadOnly => "RO",
            Self::WriteOnly => "WO",
            Self::ReadWrite => "RW",
        };
        f.write_str(s)
    }
}

/// Node operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOp {
    /// Run a command node
    Execute,
    /// Write a value
    SetValue,
    /// Read a value
    GetValue,
}

/// Typed node value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Enumeration entry, e.g. `Continuous`
    Enum(String),
}

impl NodeValue {
    pub fn enum_entry(entry: impl Into<String>) -> Self {
        Self::Enum(entry.into())
    }

    /// Numeric view, used by float nodes
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Enum(v) => f.write_str(v),
        }
    }
}

/// Well-known node names used by the stream sequencer
pub mod nodes {
    pub const STREAM_BUFFER_HANDLING_MODE: &str = "TLStream.StreamBufferHandlingMode";
    pub const ACQUISITION_MODE: &str = "AcquisitionMode";
    pub const DEVICE_SERIAL_NUMBER: &str = "TLDevice.DeviceSerialNumber";

    pub const NEWEST_ONLY: &str = "NewestOnly";
    pub const CONTINUOUS: &str = "Continuous";
    pub const SINGLE_FRAME: &str = "SingleFrame";
}

/// One entry of a node script
///
/// No value means `Execute`, a value means `SetValue(value)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCommand {
    /// Dotted node path
    pub node: String,

    /// Value to write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,

    /// Expected access mode (defaults from the operation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessMode>,
}

impl NodeCommand {
    pub fn execute(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            value: None,
            access: None,
        }
    }

    pub fn set(node: impl Into<String>, value: NodeValue) -> Self {
        Self {
            node: node.into(),
            value: Some(value),
            access: None,
        }
    }

    pub fn op(&self) -> NodeOp {
        if self.value.is_some() {
            NodeOp::SetValue
        } else {
            NodeOp::Execute
        }
    }

    /// Access mode checked before running the command
    pub fn required_access(&self) -> AccessMode {
        self.access.unwrap_or(match self.op() {
            NodeOp::Execute => AccessMode::WriteOnly,
            NodeOp::GetValue => AccessMode::ReadOnly,
            NodeOp::SetValue => AccessMode::ReadWrite,
        })
    }
}

/// Ordered list of node commands run after camera init
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeScript {
    #[serde(default)]
    pub commands: Vec<NodeCommand>,
}
