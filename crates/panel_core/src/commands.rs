//! UI event to command mapping
//!
//! Every handler runs inside the report adapter: a failure is shown to the
//! user and never reaches the scheduler.

use camera_backend::CameraBackend;
use contracts::{CameraSide, UiEvent};
use tracing::info;

use crate::capture::save_images;
use crate::context::PanelContext;
use crate::error::{PanelError, Result};
use crate::queue::DeferredCommand;

/// Build the deferred command for one UI event
pub fn command_for<B: CameraBackend + 'static>(event: UiEvent) -> DeferredCommand<B> {
    let label = event.label();
    match event {
        UiEvent::FindAndInit { side, config_ref } => {
            DeferredCommand::reporting(label, move |ctx, _| find_and_init(ctx, side, &config_ref))
        }
        UiEvent::StartStream => DeferredCommand::reporting(label, |ctx, _| start_stream(ctx)),
        UiEvent::StopStream => DeferredCommand::reporting(label, |ctx, _| stop_stream(ctx)),
        UiEvent::SliderChanged { parameter, value } => {
            DeferredCommand::reporting(label, move |ctx: &mut PanelContext<B>, surface| {
                ctx.params
                    .on_slider_change(&mut ctx.sequencer, surface, parameter, value)
            })
        }
        UiEvent::TextSubmitted { parameter, text } => {
            DeferredCommand::reporting(label, move |ctx: &mut PanelContext<B>, surface| {
                ctx.params
                    .on_text_submit(&mut ctx.sequencer, surface, parameter, &text)
            })
        }
        UiEvent::CaptureFieldSubmitted { field, text } => {
            DeferredCommand::reporting(label, move |ctx, _| {
                ctx.capture.set_field(field, &text);
                Ok(())
            })
        }
        UiEvent::SaveImages => {
            DeferredCommand::reporting(label, |ctx, surface| save_images(ctx, surface).map(|_| ()))
        }
    }
}

/// Find and initialize one camera, then apply its node script
pub fn find_and_init<B: CameraBackend + 'static>(
    ctx: &mut PanelContext<B>,
    side: CameraSide,
    config_ref: &str,
) -> Result<()> {
    if ctx.sequencer.is_running() {
        return Err(PanelError::validation(
            "camera",
            "stop acquisition before initializing a camera",
        ));
    }
    let script = ctx.init_script(side)?;
    let serial = ctx
        .sequencer
        .rig_mut()
        .find_and_init(side, config_ref.trim(), script.as_ref())?;
    info!(side = %side, serial = %serial, "Find and init complete");
    Ok(())
}

/// Start the stream (no-op while running)
pub fn start_stream<B: CameraBackend>(ctx: &mut PanelContext<B>) -> Result<()> {
    ctx.sequencer.start()?;
    Ok(())
}

/// Stop the stream (no-op while stopped)
pub fn stop_stream<B: CameraBackend>(ctx: &mut PanelContext<B>) -> Result<()> {
    ctx.sequencer.stop()?;
    Ok(())
}
