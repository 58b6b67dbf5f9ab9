//! LogSink - records capture names via tracing

use contracts::{ContractError, FrameRecord, ImageSink};
use tracing::{info, instrument};

/// Sink that only logs what would have been written
pub struct LogSink {
    name: String,
    written: u64,
    last_written: Option<String>,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: 0,
            last_written: None,
        }
    }

    pub fn written_count(&self) -> u64 {
        self.written
    }

    /// Most recent image name
    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }
}

impl ImageSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, frame),
        fields(sink = %self.name, serial = %frame.serial)
    )]
    fn write(&mut self, frame: &FrameRecord, name: &str) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            image = name,
            timestamp_us = frame.timestamp_us,
            bits_per_pixel = frame.bits_per_pixel,
            complete = frame.is_complete(),
            "Image captured"
        );
        self.written += 1;
        self.last_written = Some(name.to_string());
        Ok(())
    }
}
