//! Stream Sequencer
//!
//! Governs start/stop of the two cameras and the order in which frames are
//! pulled from them.
//!
//! ## Ordering
//!
//! - start: secondary before primary (the primary triggers the secondary,
//!   the receiver must be armed first)
//! - frame step: primary before secondary (keeps both buffers within one
//!   trigger cycle of each other)

use camera_backend::{CameraBackend, Result};
use contracts::{nodes, CameraSide, FrameRecord};
use tracing::{debug, info, instrument, warn};

use crate::rig::StereoRig;

/// Acquisition state of the rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Stopped,
    Running,
}

/// Complete frames of one trigger pulse
#[derive(Debug, Clone)]
pub struct FramePair {
    pub primary: FrameRecord,
    pub secondary: FrameRecord,
}

impl FramePair {
    pub fn frame(&self, side: CameraSide) -> &FrameRecord {
        match side {
            CameraSide::Primary => &self.primary,
            CameraSide::Secondary => &self.secondary,
        }
    }

    /// Both frames, primary first
    pub fn sides(&self) -> [(CameraSide, &FrameRecord); 2] {
        [
            (CameraSide::Primary, &self.primary),
            (CameraSide::Secondary, &self.secondary),
        ]
    }
}

/// Owner of the rig and the stream state
pub struct StreamSequencer<B> {
    rig: StereoRig<B>,
    state: StreamState,
}

impl<B: CameraBackend> StreamSequencer<B> {
    pub fn new(rig: StereoRig<B>) -> Self {
        Self {
            rig,
            state: StreamState::Stopped,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StreamState::Running
    }

    pub fn rig(&self) -> &StereoRig<B> {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut StereoRig<B> {
        &mut self.rig
    }

    /// `Stopped -> Running`
    ///
    /// Returns `false` when already running (no camera is touched).
    #[instrument(name = "sequencer_start", skip(self))]
    pub fn start(&mut self) -> Result<bool> {
        if self.is_running() {
            debug!("Start ignored, stream already running");
            return Ok(false);
        }
        self.rig.configure_acquisition(nodes::CONTINUOUS)?;
        self.rig.start_pair()?;
        self.state = StreamState::Running;
        observability::record_stream_state(true);
        info!("Stream started");
        Ok(true)
    }

    /// `Running -> Stopped`
    ///
    /// The state is `Stopped` afterwards even if ending a camera failed.
    #[instrument(name = "sequencer_stop", skip(self))]
    pub fn stop(&mut self) -> Result<bool> {
        if !self.is_running() {
            debug!("Stop ignored, stream not running");
            return Ok(false);
        }
        let ended = self.rig.end_pair();
        self.state = StreamState::Stopped;
        observability::record_stream_state(false);
        info!("Stream stopped");
        ended.map(|()| true)
    }

    /// Per-tick frame step, only meaningful while running
    pub fn step(&mut self) -> Result<Option<FramePair>> {
        self.acquire_pair()
    }

    /// Pull one pair from the running stream, primary first
    ///
    /// An incomplete pair yields `None`.
    pub fn acquire_pair(&mut self) -> Result<Option<FramePair>> {
        let [primary, secondary] = self.rig.grab_pair()?;
        Ok(complete_pair(primary, secondary))
    }

    /// End continuous acquisition ahead of single-frame captures
    ///
    /// The stream state stays `Running`.
    pub fn suspend_continuous(&mut self) -> Result<()> {
        debug!("Suspending continuous acquisition");
        self.rig.end_pair()
    }

    /// Arm both cameras for one frame, grab the pair, end both
    pub fn single_frame_pair(&mut self) -> Result<Option<FramePair>> {
        self.rig.configure_acquisition(nodes::SINGLE_FRAME)?;
        self.rig.start_pair()?;
        let grabbed = self.rig.grab_pair();
        let ended = self.rig.end_pair();
        let [primary, secondary] = grabbed?;
        ended?;
        Ok(complete_pair(primary, secondary))
    }

    /// Re-arm continuous acquisition after single-frame captures
    pub fn resume_continuous(&mut self) -> Result<()> {
        self.rig.configure_acquisition(nodes::CONTINUOUS)?;
        self.rig.start_pair()?;
        debug!("Continuous acquisition resumed");
        Ok(())
    }

    /// Stop the stream if running and release every initialized camera
    ///
    /// Failures are logged and ignored.
    pub fn shutdown(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "Failed to end acquisition during shutdown");
            }
        }
        self.rig.deinit_all();
    }
}

fn complete_pair(primary: FrameRecord, secondary: FrameRecord) -> Option<FramePair> {
    let mut complete = true;
    for (side, frame) in [(CameraSide::Primary, &primary), (CameraSide::Secondary, &secondary)] {
        if !frame.is_complete() {
            debug!(side = %side, serial = %frame.serial, timestamp_us = frame.timestamp_us, "Incomplete frame dropped");
            observability::record_incomplete_frame(side);
            complete = false;
        }
    }
    complete.then_some(FramePair { primary, secondary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ready_sequencer;
    use camera_backend::{BackendError, MockOp};

    fn p(op: MockOp) -> (String, MockOp) {
        ("primary".to_string(), op)
    }

    fn s(op: MockOp) -> (String, MockOp) {
        ("secondary".to_string(), op)
    }

    #[test]
    fn test_start_arms_secondary_first() {
        let (mut sequencer, log) = ready_sequencer();
        assert!(sequencer.start().unwrap());
        assert_eq!(sequencer.state(), StreamState::Running);
        assert_eq!(
            log.sequence_of(&[MockOp::StartAcquisition]),
            vec![s(MockOp::StartAcquisition), p(MockOp::StartAcquisition)]
        );
        // newest-only + continuous on both cameras before any start
        let set_nodes: Vec<_> = log
            .entries()
            .into_iter()
            .filter(|c| c.op == MockOp::SetNode)
            .filter_map(|c| c.detail)
            .collect();
        assert_eq!(
            set_nodes,
            vec![
                "TLStream.StreamBufferHandlingMode=NewestOnly",
                "AcquisitionMode=Continuous",
                "TLStream.StreamBufferHandlingMode=NewestOnly",
                "AcquisitionMode=Continuous",
            ]
        );
    }

    #[test]
    fn test_redundant_transitions_are_noops() {
        let (mut sequencer, log) = ready_sequencer();
        assert!(!sequencer.stop().unwrap());
        assert!(log.is_empty());

        sequencer.start().unwrap();
        let calls = log.len();
        assert!(!sequencer.start().unwrap());
        assert_eq!(log.len(), calls);

        assert!(sequencer.stop().unwrap());
        assert!(!sequencer.stop().unwrap());
        assert_eq!(log.count("primary", MockOp::EndAcquisition), 1);
        assert_eq!(log.count("secondary", MockOp::EndAcquisition), 1);
        assert_eq!(sequencer.state(), StreamState::Stopped);
    }

    #[test]
    fn test_primary_start_failure_rolls_back() {
        let (mut sequencer, log) = ready_sequencer();
        sequencer
            .rig()
            .camera(CameraSide::Primary)
            .handle()
            .fail_next(MockOp::StartAcquisition);

        let err = sequencer.start().unwrap_err();
        assert!(matches!(err, BackendError::Injected { .. }));
        assert_eq!(sequencer.state(), StreamState::Stopped);
        assert_eq!(log.count("secondary", MockOp::EndAcquisition), 1);
        assert!(!sequencer.rig().camera(CameraSide::Secondary).handle().is_acquiring());
    }

    #[test]
    fn test_stop_failure_still_stops() {
        let (mut sequencer, _log) = ready_sequencer();
        sequencer.start().unwrap();
        sequencer
            .rig()
            .camera(CameraSide::Secondary)
            .handle()
            .fail_next(MockOp::EndAcquisition);
        assert!(sequencer.stop().is_err());
        assert_eq!(sequencer.state(), StreamState::Stopped);
    }

    #[test]
    fn test_step_pulls_primary_first() {
        let (mut sequencer, log) = ready_sequencer();
        sequencer.start().unwrap();
        log.clear();

        let pair = sequencer.step().unwrap().unwrap();
        assert_eq!(pair.primary.serial, "18285621");
        assert_eq!(pair.secondary.serial, "18285622");
        assert_eq!(
            log.sequence(),
            vec![p(MockOp::GetFrame), s(MockOp::GetFrame)]
        );
    }

    #[test]
    fn test_incomplete_pair_is_dropped() {
        let (mut sequencer, _log) = ready_sequencer();
        sequencer.start().unwrap();
        sequencer
            .rig()
            .camera(CameraSide::Secondary)
            .handle()
            .deliver_incomplete(1);

        assert!(sequencer.step().unwrap().is_none());
        assert!(sequencer.step().unwrap().is_some());
    }

    #[test]
    fn test_single_frame_cycle() {
        let (mut sequencer, log) = ready_sequencer();
        sequencer.start().unwrap();
        sequencer.suspend_continuous().unwrap();
        log.clear();

        let pair = sequencer.single_frame_pair().unwrap();
        assert!(pair.is_some());
        assert_eq!(
            log.sequence_of(&[
                MockOp::StartAcquisition,
                MockOp::GetFrame,
                MockOp::EndAcquisition
            ]),
            vec![
                s(MockOp::StartAcquisition),
                p(MockOp::StartAcquisition),
                p(MockOp::GetFrame),
                s(MockOp::GetFrame),
                p(MockOp::EndAcquisition),
                s(MockOp::EndAcquisition),
            ]
        );

        sequencer.resume_continuous().unwrap();
        assert!(sequencer.is_running());
        assert!(sequencer.step().unwrap().is_some());
    }

    #[test]
    fn test_shutdown_releases_cameras() {
        let (mut sequencer, log) = ready_sequencer();
        sequencer.start().unwrap();
        sequencer.shutdown();
        assert_eq!(sequencer.state(), StreamState::Stopped);
        assert_eq!(log.count("primary", MockOp::Deinit), 1);
        assert_eq!(log.count("secondary", MockOp::Deinit), 1);
        assert!(!sequencer.rig().both_initialized());
    }
}
