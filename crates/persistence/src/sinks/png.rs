//! PngSink - writes grayscale PNG files

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, FrameRecord, ImageSink};
use image::{ImageBuffer, Luma};
use tracing::{debug, error, instrument};

use crate::naming::IMAGE_EXTENSION;

/// Sink that writes one PNG per frame into a directory
///
/// Frames of up to 8 bits per pixel become 8-bit gray images, deeper frames
/// 16-bit gray images. Sample values are stored as delivered.
pub struct PngSink {
    name: String,
    output_dir: PathBuf,
    written: u64,
    last_written: Option<PathBuf>,
}

impl PngSink {
    /// Create a new PngSink, creating `output_dir` if needed
    pub fn new(name: impl Into<String>, output_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self {
            name: name.into(),
            output_dir,
            written: 0,
            last_written: None,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of images written
    pub fn written_count(&self) -> u64 {
        self.written
    }

    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    fn save(&self, frame: &FrameRecord, path: &Path) -> Result<(), String> {
        let pixels = frame
            .pixels
            .as_ref()
            .filter(|_| frame.is_complete())
            .ok_or_else(|| "frame has no complete pixel data".to_string())?;

        if frame.bytes_per_sample() == 1 {
            let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
                ImageBuffer::from_raw(pixels.width, pixels.height, pixels.data.to_vec())
                    .ok_or_else(|| "pixel buffer size mismatch".to_string())?;
            buffer.save(path).map_err(|e| e.to_string())
        } else {
            let buffer: ImageBuffer<Luma<u16>, Vec<u16>> =
                ImageBuffer::from_raw(pixels.width, pixels.height, frame.samples())
                    .ok_or_else(|| "pixel buffer size mismatch".to_string())?;
            buffer.save(path).map_err(|e| e.to_string())
        }
    }
}

impl ImageSink for PngSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "png_sink_write",
        skip(self, frame),
        fields(sink = %self.name, serial = %frame.serial)
    )]
    fn write(&mut self, frame: &FrameRecord, name: &str) -> Result<(), ContractError> {
        let path = self.output_dir.join(format!("{name}.{IMAGE_EXTENSION}"));
        self.save(frame, &path).map_err(|message| {
            error!(sink = %self.name, path = %path.display(), error = %message, "Write failed");
            ContractError::sink_write(&self.name, format!("{}: {message}", path.display()))
        })?;
        debug!(path = %path.display(), "PNG written");
        self.written += 1;
        self.last_written = Some(path);
        Ok(())
    }
}
