//! # Persistence
//!
//! 图像保存模块。
//!
//! 负责：
//! - 命名模板 (`{serial}`, `{datetime}`, `{counter}`, `{L_R}`)
//! - PNG / 日志 sink
//! - 按配置创建 sink

pub mod error;
pub mod naming;
pub mod sinks;

pub use contracts::{ImageSink, SinkKind};
pub use error::PersistenceError;
pub use naming::NameTemplate;
pub use sinks::{create_sink, LogSink, PngSink};
