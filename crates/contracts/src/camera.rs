//! Camera identifiers
//!
//! The rig always has exactly two cameras. The primary is (or may be) the
//! hardware trigger source for the secondary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One side of the stereo rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSide {
    /// Trigger source, left image
    Primary,
    /// Triggered receiver, right image
    Secondary,
}

impl CameraSide {
    /// Both sides, primary first
    pub const BOTH: [CameraSide; 2] = [CameraSide::Primary, CameraSide::Secondary];

    /// Side label used by the capture naming template (`{L_R}`)
    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "L",
            Self::Secondary => "R",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for CameraSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric camera setting exposed as a slider/text pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraParameter {
    /// Acquisition frame rate (Hz)
    Fps,
    /// Analog gain (dB)
    Gain,
    /// Exposure time (microseconds)
    Exposure,
}

impl CameraParameter {
    pub const ALL: [CameraParameter; 3] = [
        CameraParameter::Fps,
        CameraParameter::Gain,
        CameraParameter::Exposure,
    ];

    /// Camera node written when this parameter changes
    pub fn node_name(self) -> &'static str {
        match self {
            Self::Fps => "AcquisitionFrameRate",
            Self::Gain => "Gain",
            Self::Exposure => "ExposureTime",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fps => "fps",
            Self::Gain => "gain",
            Self::Exposure => "exposure",
        }
    }
}

impl fmt::Display for CameraParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_labels() {
        assert_eq!(CameraSide::Primary.label(), "L");
        assert_eq!(CameraSide::Secondary.label(), "R");
        assert_eq!(CameraSide::BOTH[0], CameraSide::Primary);
    }

    #[test]
    fn test_parameter_nodes() {
        assert_eq!(CameraParameter::Fps.node_name(), "AcquisitionFrameRate");
        assert_eq!(CameraParameter::Exposure.node_name(), "ExposureTime");
        let json = serde_json::to_string(&CameraParameter::Gain).unwrap();
        assert_eq!(json, "\"gain\"");
    }
}
