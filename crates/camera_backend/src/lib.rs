//! # Camera Backend
//!
//! Camera driver abstraction.
//!
//! Responsibilities:
//! - Define the per-camera capability set (`CameraBackend`)
//! - Execute node scripts against a camera
//! - Provide a `MockCamera` with failure injection and a shared call log
//!
//! Every call may fail and no implementation is assumed thread safe: the
//! runtime core drives both cameras from a single thread.

pub mod backend;
pub mod error;
pub mod mock_camera;
pub mod node_script;

pub use backend::CameraBackend;
pub use contracts::{AccessMode, FrameRecord, NodeOp, NodeScript, NodeValue};
pub use error::{BackendError, Result};
pub use mock_camera::{BackendCall, CallLog, MockCamera, MockHandle, MockOp};
pub use node_script::apply_node_script;
