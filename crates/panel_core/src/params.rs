//! Parameter Sync
//!
//! Keeps the slider and text widget of FPS, Gain and Exposure consistent
//! with each other and with the last value sent to the cameras.

use camera_backend::CameraBackend;
use contracts::{CameraParameter, ControlSurface, ParametersConfig, WidgetId, WidgetValue};
use tracing::debug;

use crate::error::{PanelError, Result};
use crate::sequencer::StreamSequencer;

/// Model of one slider/text widget pair
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterWidgetPair {
    pub slider: f64,
    pub text: String,
    /// Last value accepted by the camera setter
    pub last_sent: Option<f64>,
}

impl ParameterWidgetPair {
    fn new(initial: f64) -> Self {
        Self {
            slider: initial,
            text: format_value(initial),
            last_sent: None,
        }
    }

    /// Slider and text agree, and match the last value sent if any
    pub fn is_settled(&self) -> bool {
        let text_matches = self
            .text
            .trim()
            .parse::<f64>()
            .is_ok_and(|text| text == self.slider);
        text_matches && self.last_sent.map_or(true, |sent| sent == self.slider)
    }
}

/// Text shown for a numeric value
pub fn format_value(value: f64) -> String {
    value.to_string()
}

/// The three parameter pairs
#[derive(Debug)]
pub struct ParameterPanel {
    fps: ParameterWidgetPair,
    gain: ParameterWidgetPair,
    exposure: ParameterWidgetPair,
}

impl ParameterPanel {
    pub fn new(config: &ParametersConfig) -> Self {
        Self {
            fps: ParameterWidgetPair::new(config.fps.default),
            gain: ParameterWidgetPair::new(config.gain.default),
            exposure: ParameterWidgetPair::new(config.exposure.default),
        }
    }

    pub fn pair(&self, parameter: CameraParameter) -> &ParameterWidgetPair {
        match parameter {
            CameraParameter::Fps => &self.fps,
            CameraParameter::Gain => &self.gain,
            CameraParameter::Exposure => &self.exposure,
        }
    }

    fn pair_mut(&mut self, parameter: CameraParameter) -> &mut ParameterWidgetPair {
        match parameter {
            CameraParameter::Fps => &mut self.fps,
            CameraParameter::Gain => &mut self.gain,
            CameraParameter::Exposure => &mut self.exposure,
        }
    }

    /// Mirror a value into a widget without firing its change event
    ///
    /// The write goes out with `notify = false`, so the surface never turns it
    /// into a `UiEvent`.
    pub fn mirror(
        &self,
        surface: &mut dyn ControlSurface,
        widget: WidgetId,
        value: WidgetValue,
    ) -> Result<()> {
        surface.set_widget_value(widget, value, false)?;
        Ok(())
    }

    /// Slider released at `value`
    ///
    /// The text widget is only mirrored once both cameras accepted the value.
    pub fn on_slider_change<B: CameraBackend>(
        &mut self,
        sequencer: &mut StreamSequencer<B>,
        surface: &mut dyn ControlSurface,
        parameter: CameraParameter,
        value: f64,
    ) -> Result<()> {
        self.pair_mut(parameter).slider = value;
        sequencer.rig_mut().set_parameter(parameter, value)?;

        let text = format_value(value);
        self.mirror(
            surface,
            WidgetId::Text(parameter),
            WidgetValue::Text(text.clone()),
        )?;
        let pair = self.pair_mut(parameter);
        pair.text = text;
        pair.last_sent = Some(value);
        debug!(parameter = %parameter, value, "Parameter set from slider");
        Ok(())
    }

    /// Text box submitted with `text`
    ///
    /// Empty text is ignored; unparsable text is a validation error.
    pub fn on_text_submit<B: CameraBackend>(
        &mut self,
        sequencer: &mut StreamSequencer<B>,
        surface: &mut dyn ControlSurface,
        parameter: CameraParameter,
        text: &str,
    ) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let value = trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                PanelError::validation(
                    format!("{parameter} value"),
                    format!("'{trimmed}' is not a number"),
                )
            })?;

        self.pair_mut(parameter).text = trimmed.to_string();
        sequencer.rig_mut().set_parameter(parameter, value)?;

        self.mirror(surface, WidgetId::Slider(parameter), WidgetValue::Number(value))?;
        let pair = self.pair_mut(parameter);
        pair.slider = value;
        pair.last_sent = Some(value);
        debug!(parameter = %parameter, value, "Parameter set from text");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, initialized_context};
    use crate::HeadlessSurface;
    use camera_backend::MockOp;
    use contracts::NodeValue;

    #[test]
    fn test_slider_settles_pair() {
        let (mut ctx, log) = initialized_context();
        let mut surface = HeadlessSurface::new();
        ctx.params
            .on_slider_change(&mut ctx.sequencer, &mut surface, CameraParameter::Gain, 12.5)
            .unwrap();

        let pair = ctx.params.pair(CameraParameter::Gain);
        assert_eq!(pair.slider, 12.5);
        assert_eq!(pair.text, "12.5");
        assert_eq!(pair.last_sent, Some(12.5));
        assert!(pair.is_settled());
        assert_eq!(
            surface.widget(WidgetId::Text(CameraParameter::Gain)),
            Some(&WidgetValue::Text("12.5".into()))
        );
        // mirrored without notification: no echo event
        assert!(surface.pending_events().is_empty());
        assert_eq!(
            surface.widget_writes().last(),
            Some(&(
                WidgetId::Text(CameraParameter::Gain),
                WidgetValue::Text("12.5".into()),
                false
            ))
        );

        // primary before secondary
        let writes: Vec<_> = log
            .entries()
            .into_iter()
            .filter(|c| c.op == MockOp::SetNode)
            .map(|c| (c.camera, c.detail))
            .collect();
        assert_eq!(
            writes,
            vec![
                ("primary".to_string(), Some("Gain=12.5".to_string())),
                ("secondary".to_string(), Some("Gain=12.5".to_string())),
            ]
        );
        assert_eq!(
            ctx.sequencer.rig().camera(contracts::CameraSide::Secondary).handle().node_value("Gain"),
            Some(NodeValue::Float(12.5))
        );
    }

    #[test]
    fn test_text_submit_mirrors_slider() {
        let (mut ctx, _log) = initialized_context();
        let mut surface = HeadlessSurface::new();
        ctx.params
            .on_text_submit(&mut ctx.sequencer, &mut surface, CameraParameter::Fps, " 25 ")
            .unwrap();

        let pair = ctx.params.pair(CameraParameter::Fps);
        assert_eq!(pair.slider, 25.0);
        assert_eq!(pair.last_sent, Some(25.0));
        assert!(pair.is_settled());
        assert_eq!(
            surface.widget(WidgetId::Slider(CameraParameter::Fps)),
            Some(&WidgetValue::Number(25.0))
        );
        assert!(surface.pending_events().is_empty());
    }

    #[test]
    fn test_empty_text_is_ignored() {
        let (mut ctx, log) = initialized_context();
        let mut surface = HeadlessSurface::new();
        let before = ctx.params.pair(CameraParameter::Exposure).clone();
        log.clear();

        ctx.params
            .on_text_submit(&mut ctx.sequencer, &mut surface, CameraParameter::Exposure, "   ")
            .unwrap();

        assert_eq!(ctx.params.pair(CameraParameter::Exposure), &before);
        assert!(log.is_empty());
        assert!(surface.widget_writes().is_empty());
    }

    #[test]
    fn test_malformed_text_is_validation_error() {
        let (mut ctx, log) = initialized_context();
        let mut surface = HeadlessSurface::new();
        log.clear();

        let err = ctx
            .params
            .on_text_submit(&mut ctx.sequencer, &mut surface, CameraParameter::Gain, "abc")
            .unwrap_err();
        assert!(err.is_validation());
        assert!(log.is_empty());
        assert_eq!(ctx.params.pair(CameraParameter::Gain).text, "0");
    }

    #[test]
    fn test_backend_failure_skips_mirror() {
        let (mut ctx, _log) = context();
        let mut surface = HeadlessSurface::new();

        // cameras were never initialized
        let err = ctx
            .params
            .on_slider_change(&mut ctx.sequencer, &mut surface, CameraParameter::Fps, 40.0)
            .unwrap_err();
        assert!(matches!(err, PanelError::Backend(_)));
        assert!(surface.widget_writes().is_empty());
        assert_eq!(ctx.params.pair(CameraParameter::Fps).last_sent, None);
    }
}
