//! Stereo rig: the two camera resources
//!
//! Owned exclusively by the stream sequencer. Parameter writes and node
//! scripts always address the primary before the secondary.

use camera_backend::{apply_node_script, BackendError, CameraBackend, Result};
use contracts::{
    nodes, AccessMode, CameraParameter, CameraSide, FrameRecord, NodeOp, NodeScript, NodeValue,
};
use tracing::{debug, info, instrument, warn};

/// Primary (trigger source) and secondary (triggered) camera
pub struct StereoRig<B> {
    primary: B,
    secondary: B,
}

impl<B: CameraBackend> StereoRig<B> {
    pub fn new(primary: B, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn camera(&self, side: CameraSide) -> &B {
        match side {
            CameraSide::Primary => &self.primary,
            CameraSide::Secondary => &self.secondary,
        }
    }

    pub fn camera_mut(&mut self, side: CameraSide) -> &mut B {
        match side {
            CameraSide::Primary => &mut self.primary,
            CameraSide::Secondary => &mut self.secondary,
        }
    }

    pub fn is_initialized(&self, side: CameraSide) -> bool {
        self.camera(side).is_initialized()
    }

    pub fn both_initialized(&self) -> bool {
        CameraSide::BOTH.iter().all(|&side| self.is_initialized(side))
    }

    fn ensure_initialized(&self) -> Result<()> {
        match CameraSide::BOTH.into_iter().find(|&side| !self.is_initialized(side)) {
            Some(side) => Err(BackendError::not_initialized(side.as_str())),
            None => Ok(()),
        }
    }

    /// Find, init, then run the optional node script on one side
    #[instrument(name = "rig_find_and_init", skip(self, script, side), fields(side = %side))]
    pub fn find_and_init(
        &mut self,
        side: CameraSide,
        config_ref: &str,
        script: Option<&NodeScript>,
    ) -> Result<String> {
        let camera = self.camera_mut(side);
        camera.find(config_ref)?;
        camera.init(config_ref)?;
        if let Some(script) = script {
            apply_node_script(&mut *camera, script)?;
        }
        let serial = camera.serial()?;
        info!(side = %side, serial = %serial, config_ref, "Camera initialized");
        Ok(serial)
    }

    /// Serial number of one side
    pub fn serial(&self, side: CameraSide) -> Result<String> {
        self.camera(side).serial()
    }

    /// Write a numeric parameter to the primary, then the secondary
    pub fn set_parameter(&mut self, parameter: CameraParameter, value: f64) -> Result<()> {
        self.ensure_initialized()?;
        let value = NodeValue::Float(value);
        for side in CameraSide::BOTH {
            self.camera_mut(side).set_node(
                parameter.node_name(),
                NodeOp::SetValue,
                AccessMode::ReadWrite,
                Some(&value),
            )?;
        }
        Ok(())
    }

    /// Newest-only buffering plus the given acquisition mode on both cameras
    pub fn configure_acquisition(&mut self, acquisition_mode: &str) -> Result<()> {
        let buffering = NodeValue::enum_entry(nodes::NEWEST_ONLY);
        let mode = NodeValue::enum_entry(acquisition_mode);
        for side in CameraSide::BOTH {
            let camera = self.camera_mut(side);
            camera.set_node(
                nodes::STREAM_BUFFER_HANDLING_MODE,
                NodeOp::SetValue,
                AccessMode::ReadWrite,
                Some(&buffering),
            )?;
            camera.set_node(
                nodes::ACQUISITION_MODE,
                NodeOp::SetValue,
                AccessMode::ReadWrite,
                Some(&mode),
            )?;
        }
        debug!(acquisition_mode, "Acquisition configured");
        Ok(())
    }

    /// Start the secondary, then the primary
    ///
    /// A primary failure ends the secondary again.
    pub fn start_pair(&mut self) -> Result<()> {
        self.secondary.start_acquisition()?;
        if let Err(e) = self.primary.start_acquisition() {
            if let Err(rollback) = self.secondary.end_acquisition() {
                warn!(error = %rollback, "Failed to end secondary after primary start failure");
            }
            return Err(e);
        }
        Ok(())
    }

    /// End both cameras, returning the first error after both were attempted
    pub fn end_pair(&mut self) -> Result<()> {
        let primary = self.primary.end_acquisition();
        let secondary = self.secondary.end_acquisition();
        primary.and(secondary)
    }

    /// Primary frame, then secondary frame
    pub fn grab_pair(&mut self) -> Result<[FrameRecord; 2]> {
        let primary = self.primary.get_frame()?;
        let secondary = self.secondary.get_frame()?;
        Ok([primary, secondary])
    }

    /// Release every initialized camera, logging failures
    pub fn deinit_all(&mut self) {
        for side in CameraSide::BOTH {
            let camera = self.camera_mut(side);
            if !camera.is_initialized() {
                continue;
            }
            match camera.deinit() {
                Ok(()) => debug!(side = %side, "Camera released"),
                Err(e) => warn!(side = %side, error = %e, "Camera deinit failed"),
            }
        }
    }
}
