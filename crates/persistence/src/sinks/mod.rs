//! Sink implementations
//!
//! Contains PngSink and LogSink, plus the factory used by the panel.

mod log;
mod png;

use std::path::Path;

use contracts::{ImageSink, SinkKind};
use tracing::info;

use crate::error::PersistenceError;

pub use self::log::LogSink;
pub use self::png::PngSink;

/// Create the sink selected by `kind`
///
/// `output_dir` is only used by file-writing sinks.
pub fn create_sink(
    kind: SinkKind,
    output_dir: &Path,
) -> Result<Box<dyn ImageSink>, PersistenceError> {
    let sink: Box<dyn ImageSink> = match kind {
        SinkKind::Png => Box::new(
            PngSink::new("png", output_dir)
                .map_err(|e| PersistenceError::sink_creation("png", e.to_string()))?,
        ),
        SinkKind::Log => Box::new(LogSink::new("log")),
    };
    info!(sink = sink.name(), output_dir = %output_dir.display(), "Image sink created");
    Ok(sink)
}
