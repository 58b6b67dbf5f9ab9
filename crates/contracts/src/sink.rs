//! ImageSink trait - Persistence output interface
//!
//! Encoding and file layout live behind this trait.

use crate::{ContractError, FrameRecord};

/// Persistence sink for captured frames
///
/// All sink implementations must implement this trait.
pub trait ImageSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Persist one frame under `name` (no extension)
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, frame: &FrameRecord, name: &str) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
