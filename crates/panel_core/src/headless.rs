//! Headless Control Surface
//!
//! In-memory widget toolkit: events are pushed by a driver (script, test),
//! widget writes and drawing calls are recorded for inspection.

use std::collections::{HashMap, VecDeque};

use contracts::{
    BarSpec, ContractError, ControlSurface, DisplaySurface, DisplayTarget, FrameShape,
    PrimitiveId, UiEvent, WidgetId, WidgetValue,
};
use tracing::{trace, warn};

/// One recorded widget write: `(widget, value, notify)`
pub type WidgetWrite = (WidgetId, WidgetValue, bool);

/// Display surface that keeps primitive ids and call counters
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    next_id: u64,
    images: HashMap<PrimitiveId, FrameShape>,
    bars: HashMap<PrimitiveId, f64>,
    pub clears: u64,
    pub image_creates: u64,
    pub image_replaces: u64,
    pub bar_creates: u64,
    pub bar_updates: u64,
}

impl HeadlessDisplay {
    fn allocate(&mut self) -> PrimitiveId {
        self.next_id += 1;
        PrimitiveId(self.next_id)
    }

    /// Live image primitives
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Live bar primitives
    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn bar_height(&self, id: PrimitiveId) -> Option<f64> {
        self.bars.get(&id).copied()
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn clear(&mut self) -> Result<(), ContractError> {
        self.images.clear();
        self.bars.clear();
        self.clears += 1;
        Ok(())
    }

    fn create_image(
        &mut self,
        shape: FrameShape,
        intensities: &[f32],
    ) -> Result<PrimitiveId, ContractError> {
        if intensities.len() != shape.area() {
            return Err(ContractError::surface(format!(
                "image data has {} values, shape {}x{} needs {}",
                intensities.len(),
                shape.height,
                shape.width,
                shape.area()
            )));
        }
        let id = self.allocate();
        self.images.insert(id, shape);
        self.image_creates += 1;
        Ok(id)
    }

    fn replace_image(&mut self, id: PrimitiveId, intensities: &[f32]) -> Result<(), ContractError> {
        let shape = self
            .images
            .get(&id)
            .ok_or_else(|| ContractError::surface(format!("unknown image {id}")))?;
        if intensities.len() != shape.area() {
            return Err(ContractError::surface(format!(
                "image {id} expects {} values, got {}",
                shape.area(),
                intensities.len()
            )));
        }
        self.image_replaces += 1;
        Ok(())
    }

    fn create_bars(&mut self, bars: &[BarSpec]) -> Result<Vec<PrimitiveId>, ContractError> {
        let ids = bars
            .iter()
            .map(|bar| {
                let id = self.allocate();
                self.bars.insert(id, bar.height);
                id
            })
            .collect();
        self.bar_creates += 1;
        Ok(ids)
    }

    fn set_bar_height(&mut self, id: PrimitiveId, height: f64) -> Result<(), ContractError> {
        let bar = self
            .bars
            .get_mut(&id)
            .ok_or_else(|| ContractError::surface(format!("unknown bar {id}")))?;
        *bar = height;
        self.bar_updates += 1;
        Ok(())
    }
}

/// Control surface without a window
#[derive(Debug)]
pub struct HeadlessSurface {
    open: bool,
    pending: VecDeque<UiEvent>,
    widgets: HashMap<WidgetId, WidgetValue>,
    writes: Vec<WidgetWrite>,
    errors: Vec<String>,
    displays: HashMap<DisplayTarget, HeadlessDisplay>,
    redraws: u64,
    close_at: Option<u64>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            open: true,
            pending: VecDeque::new(),
            widgets: HashMap::new(),
            writes: Vec::new(),
            errors: Vec::new(),
            displays: HashMap::new(),
            redraws: 0,
            close_at: None,
        }
    }

    /// Queue a user interaction for the next `poll_events`
    pub fn push_event(&mut self, event: UiEvent) {
        self.pending.push_back(event);
    }

    /// Simulate the user closing the window
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Close once `redraws` more redraws have happened
    pub fn close_after(&mut self, redraws: u64) {
        self.close_at = Some(self.redraws + redraws);
    }

    /// Current value of a widget, if it was ever written
    pub fn widget(&self, id: WidgetId) -> Option<&WidgetValue> {
        self.widgets.get(&id)
    }

    /// Every widget write in call order
    pub fn widget_writes(&self) -> &[WidgetWrite] {
        &self.writes
    }

    /// Events waiting to be polled
    pub fn pending_events(&self) -> Vec<UiEvent> {
        self.pending.iter().cloned().collect()
    }

    /// Messages of every reported error
    pub fn reported_errors(&self) -> &[String] {
        &self.errors
    }

    /// Display state of one target (created empty on first access)
    pub fn display_state(&mut self, target: DisplayTarget) -> &HeadlessDisplay {
        self.displays.entry(target).or_default()
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }
}

/// Change event a widget fires when its value is set with notification
fn echo_event(widget: WidgetId, value: &WidgetValue) -> Option<UiEvent> {
    match (widget, value) {
        (WidgetId::Slider(parameter), WidgetValue::Number(value)) => Some(UiEvent::SliderChanged {
            parameter,
            value: *value,
        }),
        (WidgetId::Text(parameter), WidgetValue::Text(text)) => Some(UiEvent::TextSubmitted {
            parameter,
            text: text.clone(),
        }),
        (WidgetId::Capture(field), WidgetValue::Text(text)) => Some(UiEvent::CaptureFieldSubmitted {
            field,
            text: text.clone(),
        }),
        _ => None,
    }
}

impl ControlSurface for HeadlessSurface {
    fn is_open(&self) -> bool {
        self.open && self.close_at.map_or(true, |at| self.redraws < at)
    }

    fn poll_events(&mut self) -> Vec<UiEvent> {
        self.pending.drain(..).collect()
    }

    fn set_widget_value(
        &mut self,
        widget: WidgetId,
        value: WidgetValue,
        notify: bool,
    ) -> Result<(), ContractError> {
        if !self.is_open() {
            return Err(ContractError::SurfaceClosed);
        }
        if notify {
            let event = echo_event(widget, &value).ok_or_else(|| {
                ContractError::surface(format!("{widget:?} does not accept {value:?}"))
            })?;
            self.pending.push_back(event);
        }
        trace!(?widget, ?value, notify, "Widget value set");
        self.writes.push((widget, value.clone(), notify));
        self.widgets.insert(widget, value);
        Ok(())
    }

    fn display(&mut self, target: DisplayTarget) -> &mut dyn DisplaySurface {
        self.displays.entry(target).or_default()
    }

    fn report_error(&mut self, error: &dyn std::error::Error) {
        warn!(error = %error, "Error reported to user");
        self.errors.push(error.to_string());
    }

    fn redraw(&mut self) -> Result<(), ContractError> {
        self.redraws += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraParameter, CameraSide};

    #[test]
    fn test_notify_write_echoes_event() {
        let mut surface = HeadlessSurface::new();
        let slider = WidgetId::Slider(CameraParameter::Gain);
        surface
            .set_widget_value(slider, WidgetValue::Number(3.0), true)
            .unwrap();
        surface
            .set_widget_value(slider, WidgetValue::Number(4.0), false)
            .unwrap();

        assert_eq!(
            surface.poll_events(),
            vec![UiEvent::SliderChanged {
                parameter: CameraParameter::Gain,
                value: 3.0
            }]
        );
        assert_eq!(surface.widget(slider), Some(&WidgetValue::Number(4.0)));
        assert_eq!(surface.widget_writes().len(), 2);
    }

    #[test]
    fn test_closed_surface_rejects_writes() {
        let mut surface = HeadlessSurface::new();
        surface.close();
        let err = surface
            .set_widget_value(
                WidgetId::Text(CameraParameter::Fps),
                WidgetValue::Text("1".into()),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::SurfaceClosed));
    }

    #[test]
    fn test_close_after_redraws() {
        let mut surface = HeadlessSurface::new();
        surface.close_after(2);
        surface.redraw().unwrap();
        assert!(surface.is_open());
        surface.redraw().unwrap();
        assert!(!surface.is_open());
    }

    #[test]
    fn test_display_ids_are_never_reused() {
        let mut surface = HeadlessSurface::new();
        let target = DisplayTarget::image(CameraSide::Primary);
        let shape = FrameShape::new(2, 2);
        let display = surface.display(target);
        let first = display.create_image(shape, &[0.0; 4]).unwrap();
        display.clear().unwrap();
        let second = display.create_image(shape, &[0.0; 4]).unwrap();
        assert_ne!(first, second);
        assert!(display.replace_image(first, &[0.0; 4]).is_err());
        assert!(display.replace_image(second, &[0.0; 3]).is_err());
        assert_eq!(surface.display_state(target).image_count(), 1);
    }
}
