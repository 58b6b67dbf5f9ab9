//! Control Surface contracts
//!
//! The widget toolkit is an external collaborator. The runtime core only
//! consumes its events, mirrors widget values back into it and draws into
//! the display surfaces it hands out.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CameraParameter, CameraSide, ContractError, FrameShape};

/// Capture text field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureField {
    /// File naming template
    NameFormat,
    /// Counter of the first image of the next save
    Counter,
    /// Number of image pairs per save
    Count,
}

/// Discrete user interaction delivered by the control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// "Find and Init" clicked with the side's config text
    FindAndInit {
        side: CameraSide,
        config_ref: String,
    },
    /// "Start Acquisition" clicked
    StartStream,
    /// "Stop Acquisition" clicked
    StopStream,
    /// Parameter slider released at `value`
    SliderChanged {
        parameter: CameraParameter,
        value: f64,
    },
    /// Parameter text box submitted
    TextSubmitted {
        parameter: CameraParameter,
        text: String,
    },
    /// Capture text box submitted
    CaptureFieldSubmitted { field: CaptureField, text: String },
    /// "Save Image(s)" clicked
    SaveImages,
}

impl UiEvent {
    /// Short label used for logging and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::FindAndInit { .. } => "find_and_init",
            Self::StartStream => "start_stream",
            Self::StopStream => "stop_stream",
            Self::SliderChanged { .. } => "slider_changed",
            Self::TextSubmitted { .. } => "text_submitted",
            Self::CaptureFieldSubmitted { .. } => "capture_field_submitted",
            Self::SaveImages => "save_images",
        }
    }
}

/// Widget addressed by a mirroring write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetId {
    Slider(CameraParameter),
    Text(CameraParameter),
    Capture(CaptureField),
}

/// Value written into a widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetValue {
    Number(f64),
    Text(String),
}

/// What a display surface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayKind {
    Image,
    Histogram,
}

/// A display surface of one camera side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayTarget {
    pub side: CameraSide,
    pub kind: DisplayKind,
}

impl DisplayTarget {
    pub fn image(side: CameraSide) -> Self {
        Self {
            side,
            kind: DisplayKind::Image,
        }
    }

    pub fn histogram(side: CameraSide) -> Self {
        Self {
            side,
            kind: DisplayKind::Histogram,
        }
    }
}

/// Opaque handle to a graphics primitive owned by a display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

impl fmt::Display for PrimitiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Histogram bar geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSpec {
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Drawing area handed to the render cache
pub trait DisplaySurface {
    /// Drop every primitive and reset the axes
    fn clear(&mut self) -> Result<(), ContractError>;

    /// Create a gray image bound to `shape`, intensities already normalized to `[0, 1]`
    fn create_image(
        &mut self,
        shape: FrameShape,
        intensities: &[f32],
    ) -> Result<PrimitiveId, ContractError>;

    /// Replace the data of an existing image in place
    fn replace_image(&mut self, id: PrimitiveId, intensities: &[f32]) -> Result<(), ContractError>;

    /// Create one bar primitive per spec, in order
    fn create_bars(&mut self, bars: &[BarSpec]) -> Result<Vec<PrimitiveId>, ContractError>;

    /// Change the height of an existing bar
    fn set_bar_height(&mut self, id: PrimitiveId, height: f64) -> Result<(), ContractError>;
}

/// The widget toolkit as seen by the runtime core
pub trait ControlSurface {
    /// False once the user closed the window
    fn is_open(&self) -> bool;

    /// Collect user interactions that happened since the last call
    fn poll_events(&mut self) -> Vec<UiEvent>;

    /// Write a widget value. With `notify` the widget fires its change
    /// event as if the user had edited it.
    fn set_widget_value(
        &mut self,
        widget: WidgetId,
        value: WidgetValue,
        notify: bool,
    ) -> Result<(), ContractError>;

    /// Display surface of one side
    fn display(&mut self, target: DisplayTarget) -> &mut dyn DisplaySurface;

    /// Show an error to the user
    fn report_error(&mut self, error: &dyn std::error::Error);

    /// Flush pending drawing
    fn redraw(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
