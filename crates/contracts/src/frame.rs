//! FrameRecord - Camera Backend output
//!
//! One acquisition call produces one record. Records are ephemeral: the
//! caller that requested the frame owns it and drops it after a single use.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Largest supported sample depth
pub const MAX_BITS_PER_PIXEL: u8 = 16;

/// Image shape as `(rows, cols)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameShape {
    pub height: u32,
    pub width: u32,
}

impl FrameShape {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// Number of pixels
    pub fn area(&self) -> usize {
        self.height as usize * self.width as usize
    }
}

/// Raw monochrome pixel buffer
///
/// Samples are one byte each when `bits_per_pixel <= 8`, otherwise two
/// little-endian bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// A single camera frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Pixel data, `None` when the camera delivered an incomplete image
    pub pixels: Option<PixelBuffer>,

    /// Camera timestamp (microseconds)
    pub timestamp_us: u64,

    /// Significant bits per sample
    pub bits_per_pixel: u8,

    /// Serial number of the producing camera
    pub serial: String,
}

impl FrameRecord {
    /// Build an incomplete record (dropped or partially delivered image)
    pub fn incomplete(serial: impl Into<String>, timestamp_us: u64, bits_per_pixel: u8) -> Self {
        Self {
            pixels: None,
            timestamp_us,
            bits_per_pixel,
            serial: serial.into(),
        }
    }

    /// Bytes per stored sample
    pub fn bytes_per_sample(&self) -> usize {
        if self.bits_per_pixel <= 8 {
            1
        } else {
            2
        }
    }

    /// True when pixel data is present, non-empty and of the announced size
    pub fn is_complete(&self) -> bool {
        match &self.pixels {
            Some(px) => {
                let expected = px.width as usize * px.height as usize * self.bytes_per_sample();
                !px.data.is_empty() && px.data.len() == expected
            }
            None => false,
        }
    }

    /// Frame shape, if pixel data is present
    pub fn shape(&self) -> Option<FrameShape> {
        self.pixels
            .as_ref()
            .map(|px| FrameShape::new(px.height, px.width))
    }

    /// Maximum representable intensity, `2^bits_per_pixel - 1`
    pub fn dynamic_range(&self) -> u32 {
        let bits = self.bits_per_pixel.clamp(1, MAX_BITS_PER_PIXEL);
        (1u32 << bits) - 1
    }

    /// Decoded samples in row-major order (empty for incomplete frames)
    pub fn samples(&self) -> Vec<u16> {
        let Some(px) = &self.pixels else {
            return Vec::new();
        };
        if self.bytes_per_sample() == 1 {
            px.data.iter().map(|&b| b as u16).collect()
        } else {
            px.data
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(width: u32, height: u32, bits: u8, data: Vec<u8>) -> FrameRecord {
        FrameRecord {
            pixels: Some(PixelBuffer {
                width,
                height,
                data: Bytes::from(data),
            }),
            timestamp_us: 1_000,
            bits_per_pixel: bits,
            serial: "100".into(),
        }
    }

    #[test]
    fn test_dynamic_range() {
        assert_eq!(record(1, 1, 8, vec![0]).dynamic_range(), 255);
        assert_eq!(record(1, 1, 10, vec![0, 0]).dynamic_range(), 1023);
        assert_eq!(record(1, 1, 16, vec![0, 0]).dynamic_range(), 65535);
    }

    #[test]
    fn test_completeness() {
        assert!(record(2, 1, 8, vec![1, 2]).is_complete());
        // truncated delivery
        assert!(!record(2, 2, 8, vec![1, 2]).is_complete());
        assert!(!record(0, 0, 8, vec![]).is_complete());
        assert!(!FrameRecord::incomplete("1", 0, 8).is_complete());
    }

    #[test]
    fn test_samples_sixteen_bit() {
        let frame = record(2, 1, 12, vec![0x01, 0x00, 0xff, 0x0f]);
        assert_eq!(frame.samples(), vec![1, 4095]);
        assert_eq!(frame.shape(), Some(FrameShape::new(1, 2)));
    }
}
