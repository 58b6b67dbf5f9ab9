//! Test fixtures shared by the unit tests of this crate

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;
use camera_backend::{CallLog, MockCamera};
use contracts::{
    CameraSide, ContractError, FrameRecord, ImageSink, PanelBlueprint, PixelBuffer, SinkKind,
};
use persistence::LogSink;

use crate::context::PanelContext;
use crate::rig::StereoRig;
use crate::sequencer::StreamSequencer;

pub(crate) type Rig = MockCamera;

/// Default blueprint with small mock frames and a log sink
pub(crate) fn blueprint() -> PanelBlueprint {
    let mut blueprint = PanelBlueprint::default();
    for camera in [
        &mut blueprint.cameras.primary,
        &mut blueprint.cameras.secondary,
    ] {
        camera.mock.width = 8;
        camera.mock.height = 4;
        camera.mock.bits_per_pixel = 8;
    }
    blueprint.capture.sink = SinkKind::Log;
    blueprint
}

pub(crate) fn context() -> (PanelContext<Rig>, CallLog) {
    let log = CallLog::new();
    let ctx = PanelContext::with_mock_cameras(blueprint(), &log, Box::new(LogSink::new("log")));
    (ctx, log)
}

/// Both cameras found and initialized, call log cleared
pub(crate) fn initialized_context() -> (PanelContext<Rig>, CallLog) {
    let (mut ctx, log) = context();
    for side in CameraSide::BOTH {
        let config_ref = ctx.blueprint.camera(side).config_ref.clone();
        ctx.sequencer
            .rig_mut()
            .find_and_init(side, &config_ref, None)
            .unwrap();
    }
    log.clear();
    (ctx, log)
}

/// Initialized and streaming, call log cleared
pub(crate) fn running_context() -> (PanelContext<Rig>, CallLog) {
    let (mut ctx, log) = initialized_context();
    ctx.sequencer.start().unwrap();
    log.clear();
    (ctx, log)
}

/// Stopped sequencer over two initialized mock cameras, call log cleared
pub(crate) fn ready_sequencer() -> (StreamSequencer<Rig>, CallLog) {
    let log = CallLog::new();
    let blueprint = blueprint();
    let mut rig = StereoRig::new(
        MockCamera::new("primary", blueprint.cameras.primary.mock.clone(), log.clone()),
        MockCamera::new("secondary", blueprint.cameras.secondary.mock.clone(), log.clone()),
    );
    rig.find_and_init(CameraSide::Primary, "primary.toml", None)
        .unwrap();
    rig.find_and_init(CameraSide::Secondary, "secondary.toml", None)
        .unwrap();
    log.clear();
    (StreamSequencer::new(rig), log)
}

/// Complete gray frame with a diagonal ramp offset by `seed`
pub(crate) fn gray_frame(width: u32, height: u32, bits: u8, seed: u32) -> FrameRecord {
    let modulus = 1u32 << bits;
    let samples = (0..height).flat_map(|y| (0..width).map(move |x| (x + y + seed) % modulus));
    let data: Vec<u8> = if bits <= 8 {
        samples.map(|v| v as u8).collect()
    } else {
        samples.flat_map(|v| (v as u16).to_le_bytes()).collect()
    };
    FrameRecord {
        pixels: Some(PixelBuffer {
            width,
            height,
            data: Bytes::from(data),
        }),
        timestamp_us: 1_000_000 + seed as u64,
        bits_per_pixel: bits,
        serial: "100".into(),
    }
}

/// Sink recording names into a handle the test keeps
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    names: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    /// Replace the context's sink, returning a handle onto the new one
    pub(crate) fn install(ctx: &mut PanelContext<Rig>) -> Self {
        let sink = Self::default();
        ctx.sink = Box::new(sink.clone());
        sink
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.names.borrow().clone()
    }
}

impl ImageSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn write(&mut self, frame: &FrameRecord, name: &str) -> Result<(), ContractError> {
        if !frame.is_complete() {
            return Err(ContractError::sink_write("recording", "incomplete frame"));
        }
        self.names.borrow_mut().push(name.to_string());
        Ok(())
    }
}
