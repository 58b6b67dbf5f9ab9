//! Camera backend abstraction
//!
//! Defines the capability set of one hardware camera, supporting a real
//! driver binding and mock testing behind the same interface.

use contracts::{AccessMode, FrameRecord, NodeOp, NodeValue};

use crate::error::Result;

/// Camera backend trait
///
/// One instance drives one physical camera. Calls are blocking and the
/// implementation is not required to be `Send` or `Sync`.
pub trait CameraBackend {
    /// Locate the camera described by `config_ref` (serial number or config file)
    fn find(&mut self, config_ref: &str) -> Result<()>;

    /// Initialize a found camera
    fn init(&mut self, config_ref: &str) -> Result<()>;

    /// Run `op` on the node at `node` after checking its access mode
    ///
    /// # Returns
    /// The node value for `GetValue`, `None` otherwise
    fn set_node(
        &mut self,
        node: &str,
        op: NodeOp,
        access: AccessMode,
        value: Option<&NodeValue>,
    ) -> Result<Option<NodeValue>>;

    /// Begin acquisition
    fn start_acquisition(&mut self) -> Result<()>;

    /// End acquisition
    fn end_acquisition(&mut self) -> Result<()>;

    /// Grab the next frame
    ///
    /// An incomplete image is returned as a `FrameRecord` without pixel data,
    /// not as an error.
    fn get_frame(&mut self) -> Result<FrameRecord>;

    /// Serial number of the found camera
    fn serial(&self) -> Result<String>;

    /// Release the camera
    fn deinit(&mut self) -> Result<()>;

    /// True between a successful `init` and `deinit`
    fn is_initialized(&self) -> bool;
}

impl<B: CameraBackend + ?Sized> CameraBackend for Box<B> {
    fn find(&mut self, config_ref: &str) -> Result<()> {
        (**self).find(config_ref)
    }

    fn init(&mut self, config_ref: &str) -> Result<()> {
        (**self).init(config_ref)
    }

    fn set_node(
        &mut self,
        node: &str,
        op: NodeOp,
        access: AccessMode,
        value: Option<&NodeValue>,
    ) -> Result<Option<NodeValue>> {
        (**self).set_node(node, op, access, value)
    }

    fn start_acquisition(&mut self) -> Result<()> {
        (**self).start_acquisition()
    }

    fn end_acquisition(&mut self) -> Result<()> {
        (**self).end_acquisition()
    }

    fn get_frame(&mut self) -> Result<FrameRecord> {
        (**self).get_frame()
    }

    fn serial(&self) -> Result<String> {
        (**self).serial()
    }

    fn deinit(&mut self) -> Result<()> {
        (**self).deinit()
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }
}
