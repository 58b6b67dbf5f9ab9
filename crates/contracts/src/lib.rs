//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the stereo panel:
//! frame records, camera/parameter identifiers, node commands, the
//! Control Surface and Persistence sink collaborator traits and the panel
//! blueprint. Business crates depend on this crate, never the reverse.
//!
//! ## Time Model
//! - Frame timestamps are camera clock microseconds (`u64`)
//! - A scheduler tick is the only unit of progress inside the runtime core

mod blueprint;
mod camera;
mod error;
mod frame;
mod node;
mod sink;
mod surface;

pub use blueprint::*;
pub use camera::*;
pub use error::*;
pub use frame::*;
pub use node::*;
pub use sink::*;
pub use surface::*;
