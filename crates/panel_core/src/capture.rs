//! Capture-to-disk
//!
//! Saves `count` stereo pairs while the stream is running. Fields are kept as
//! the text the user typed and parsed only when a save is requested.

use camera_backend::CameraBackend;
use contracts::{
    CaptureConfig, CaptureField, CaptureStrategy, ControlSurface, WidgetId, WidgetValue,
};
use persistence::NameTemplate;
use tracing::{debug, info, instrument, warn};

use crate::context::PanelContext;
use crate::error::{PanelError, Result};
use crate::sequencer::FramePair;

/// Capture text fields as last submitted
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub name_format: String,
    pub counter: String,
    pub count: String,
    pub strategy: CaptureStrategy,
}

impl CaptureSettings {
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self {
            name_format: config.name_format.clone(),
            counter: config.counter.to_string(),
            count: config.count.to_string(),
            strategy: config.strategy,
        }
    }

    pub fn field(&self, field: CaptureField) -> &str {
        match field {
            CaptureField::NameFormat => &self.name_format,
            CaptureField::Counter => &self.counter,
            CaptureField::Count => &self.count,
        }
    }

    /// Store submitted text, validated at save time
    pub fn set_field(&mut self, field: CaptureField, text: &str) {
        let slot = match field {
            CaptureField::NameFormat => &mut self.name_format,
            CaptureField::Counter => &mut self.counter,
            CaptureField::Count => &mut self.count,
        };
        *slot = text.trim().to_string();
    }

    /// Parse the three fields into a request
    pub fn parse(&self) -> Result<CaptureRequest> {
        let template = NameTemplate::parse(&self.name_format)
            .map_err(|e| PanelError::validation("name format", e.to_string()))?;
        let counter = self.counter.trim().parse::<u64>().map_err(|_| {
            PanelError::validation(
                "counter",
                format!("'{}' is not a non-negative integer", self.counter),
            )
        })?;
        let count = self
            .count
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|&count| count > 0)
            .ok_or_else(|| {
                PanelError::validation(
                    "image count",
                    format!("'{}' is not a positive integer", self.count),
                )
            })?;
        // 最后一张图像的计数器也必须可表示
        let next_counter = counter.checked_add(count as u64).ok_or_else(|| {
            PanelError::validation(
                "counter",
                format!("'{}' + {count} images exceeds the counter range", self.counter),
            )
        })?;
        Ok(CaptureRequest {
            template,
            counter,
            count,
            next_counter,
            strategy: self.strategy,
        })
    }
}

/// A validated save request
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub template: NameTemplate,
    pub counter: u64,
    pub count: u32,
    /// `counter + count`, the counter after this save
    pub next_counter: u64,
    pub strategy: CaptureStrategy,
}

/// Outcome of one save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureReport {
    pub requested: u32,
    pub pairs_written: u32,
    pub images_written: u32,
    pub next_counter: u64,
}

/// Save the requested number of pairs
///
/// Requires a running stream. An incomplete pair skips its iteration, the
/// counter still advances by the requested count.
#[instrument(name = "save_images", skip(ctx, surface))]
pub fn save_images<B: CameraBackend>(
    ctx: &mut PanelContext<B>,
    surface: &mut dyn ControlSurface,
) -> Result<CaptureReport> {
    if !ctx.sequencer.is_running() {
        return Err(PanelError::validation(
            "stream",
            "start acquisition before saving images",
        ));
    }
    let request = ctx.capture.parse()?;

    let pairs_written = match request.strategy {
        CaptureStrategy::FromStream => {
            let mut written = 0;
            for i in 0..request.count {
                let pair = ctx.sequencer.acquire_pair()?;
                written += write_iteration(ctx, &request, i, pair)?;
            }
            written
        }
        CaptureStrategy::Rearm => capture_rearmed(ctx, &request)?,
    };
    ctx.sink.flush()?;

    let next_counter = request.next_counter;
    ctx.capture.counter = next_counter.to_string();
    ctx.params.mirror(
        surface,
        WidgetId::Capture(CaptureField::Counter),
        WidgetValue::Text(ctx.capture.counter.clone()),
    )?;

    let report = CaptureReport {
        requested: request.count,
        pairs_written,
        images_written: pairs_written * 2,
        next_counter,
    };
    info!(
        requested = report.requested,
        pairs = report.pairs_written,
        next_counter,
        "Images saved"
    );
    Ok(report)
}

/// Single-frame captures with the continuous stream suspended
fn capture_rearmed<B: CameraBackend>(
    ctx: &mut PanelContext<B>,
    request: &CaptureRequest,
) -> Result<u32> {
    ctx.sequencer.suspend_continuous()?;
    let mut written = 0;
    let mut outcome = Ok(());
    for i in 0..request.count {
        let step = ctx
            .sequencer
            .single_frame_pair()
            .map_err(PanelError::from)
            .and_then(|pair| write_iteration(ctx, request, i, pair));
        match step {
            Ok(n) => written += n,
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }
    if let Err(e) = ctx.sequencer.resume_continuous() {
        warn!(error = %e, "Failed to resume continuous acquisition after capture");
        outcome = outcome.and(Err(e.into()));
    }
    outcome.map(|()| written)
}

/// Write both frames of iteration `i`; returns 1 if a pair was written
fn write_iteration<B: CameraBackend>(
    ctx: &mut PanelContext<B>,
    request: &CaptureRequest,
    i: u32,
    pair: Option<FramePair>,
) -> Result<u32> {
    let Some(pair) = pair else {
        debug!(iteration = i, "Incomplete pair, capture iteration skipped");
        ctx.metrics.on_frame_pair(false);
        return Ok(0);
    };
    let counter = request.counter + i as u64;
    for (side, frame) in pair.sides() {
        let name = request
            .template
            .render(&frame.serial, frame.timestamp_us, counter, side.label());
        ctx.sink.write(frame, &name).inspect_err(|_| {
            observability::record_image_written(ctx.sink.name(), side, false);
        })?;
        ctx.metrics.on_image_saved(ctx.sink.name(), side);
    }
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{initialized_context, running_context, RecordingSink};
    use camera_backend::MockOp;
    use contracts::CameraSide;

    #[test]
    fn test_parse_fields() {
        let mut settings = CaptureSettings::from_config(&CaptureConfig::default());
        assert_eq!(settings.field(CaptureField::Counter), "1");
        settings.set_field(CaptureField::Count, " 3 ");
        let request = settings.parse().unwrap();
        assert_eq!(request.count, 3);
        assert_eq!(request.counter, 1);

        settings.set_field(CaptureField::Count, "0");
        assert!(settings.parse().unwrap_err().is_validation());
        settings.set_field(CaptureField::Count, "2");
        settings.set_field(CaptureField::Counter, "-1");
        assert!(settings.parse().unwrap_err().is_validation());
        settings.set_field(CaptureField::Counter, "1");
        settings.set_field(CaptureField::NameFormat, "{side}");
        assert!(settings.parse().unwrap_err().is_validation());
    }

    #[test]
    fn test_counter_overflow_is_rejected_before_writing() {
        let (mut ctx, log) = running_context();
        let sink = RecordingSink::install(&mut ctx);
        let mut surface = crate::HeadlessSurface::new();
        log.clear();
        ctx.capture.set_field(CaptureField::Counter, &u64::MAX.to_string());
        ctx.capture.set_field(CaptureField::Count, "2");

        let err = save_images(&mut ctx, &mut surface).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("counter"));
        assert!(sink.names().is_empty());
        assert_eq!(log.count("primary", MockOp::GetFrame), 0);
        assert_eq!(ctx.capture.counter, u64::MAX.to_string());

        // the largest counter that still fits is accepted
        ctx.capture.set_field(CaptureField::Counter, &(u64::MAX - 2).to_string());
        let report = save_images(&mut ctx, &mut surface).unwrap();
        assert_eq!(report.next_counter, u64::MAX);
        assert_eq!(sink.names().len(), 4);
    }

    #[test]
    fn test_save_requires_running_stream() {
        let (mut ctx, log) = initialized_context();
        let sink = RecordingSink::install(&mut ctx);
        let mut surface = crate::HeadlessSurface::new();

        let err = save_images(&mut ctx, &mut surface).unwrap_err();
        assert!(err.is_validation());
        assert!(sink.names().is_empty());
        assert_eq!(ctx.capture.counter, "1");
        assert_eq!(log.count("primary", MockOp::GetFrame), 0);
    }

    #[test]
    fn test_save_from_stream() {
        let (mut ctx, _log) = running_context();
        let sink = RecordingSink::install(&mut ctx);
        let mut surface = crate::HeadlessSurface::new();
        ctx.capture.set_field(CaptureField::NameFormat, "{serial}_{counter}_{L_R}");
        ctx.capture.set_field(CaptureField::Count, "2");

        let report = save_images(&mut ctx, &mut surface).unwrap();
        assert_eq!(report.images_written, 4);
        assert_eq!(report.next_counter, 3);
        assert_eq!(
            sink.names(),
            vec![
                "18285621_1_L",
                "18285622_1_R",
                "18285621_2_L",
                "18285622_2_R"
            ]
        );
        assert_eq!(ctx.capture.counter, "3");
        assert_eq!(
            surface.widget(WidgetId::Capture(CaptureField::Counter)),
            Some(&WidgetValue::Text("3".into()))
        );
        assert!(surface.pending_events().is_empty());
        assert!(ctx.sequencer.is_running());
    }

    #[test]
    fn test_incomplete_pair_skips_iteration() {
        let (mut ctx, _log) = running_context();
        let sink = RecordingSink::install(&mut ctx);
        let mut surface = crate::HeadlessSurface::new();
        ctx.capture.set_field(CaptureField::Count, "3");
        ctx.sequencer
            .rig()
            .camera(CameraSide::Primary)
            .handle()
            .deliver_incomplete(1);

        let report = save_images(&mut ctx, &mut surface).unwrap();
        assert_eq!(report.pairs_written, 2);
        assert_eq!(sink.names().len(), 4);
        assert_eq!(report.next_counter, 4);
    }

    #[test]
    fn test_rearm_strategy_restores_stream() {
        let (mut ctx, log) = running_context();
        let sink = RecordingSink::install(&mut ctx);
        let mut surface = crate::HeadlessSurface::new();
        ctx.capture.strategy = CaptureStrategy::Rearm;
        ctx.capture.set_field(CaptureField::Count, "2");

        let report = save_images(&mut ctx, &mut surface).unwrap();
        assert_eq!(report.images_written, 4);
        assert_eq!(sink.names().len(), 4);
        assert!(ctx.sequencer.is_running());
        // suspend + 2 single-frame cycles
        assert_eq!(log.count("primary", MockOp::EndAcquisition), 3);
        // 2 single-frame cycles + resume
        assert_eq!(log.count("secondary", MockOp::StartAcquisition), 3);
        assert!(ctx
            .sequencer
            .rig()
            .camera(CameraSide::Primary)
            .handle()
            .is_acquiring());
        assert!(ctx.sequencer.step().unwrap().is_some());
    }
}
