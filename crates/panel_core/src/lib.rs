//! # Panel Core
//!
//! 双目相机控制面板的运行时核心。
//!
//! ## 组成
//!
//! - [`CommandQueue`]: UI 事件产生的延迟命令，FIFO
//! - [`ParameterPanel`]: FPS / Gain / Exposure 滑块与文本框同步
//! - [`StreamSequencer`]: 启停顺序与逐 tick 取帧
//! - [`RenderCache`]: 图像与直方图图元缓存
//! - [`Scheduler`]: 单线程协作式调度循环与失败隔离
//! - [`HeadlessSurface`]: 无窗口的 Control Surface 实现
//!
//! 全部可变状态都在 [`PanelContext`] 中，由调度循环持有并按引用传入命令。
//!
//! ## 使用示例
//!
//! ```ignore
//! let log = CallLog::new();
//! let mut ctx = PanelContext::with_mock_cameras(blueprint, &log, sink);
//! let mut surface = HeadlessSurface::new();
//! surface.push_event(UiEvent::StartStream);
//! let ticks = Scheduler::new(&ctx.blueprint.scheduler)
//!     .run(&mut ctx, &mut surface)
//!     .await?;
//! ```

pub mod capture;
pub mod commands;
pub mod context;
pub mod error;
pub mod headless;
pub mod params;
pub mod queue;
pub mod render;
pub mod rig;
pub mod scheduler;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::{save_images, CaptureReport, CaptureRequest, CaptureSettings};
pub use commands::command_for;
pub use context::PanelContext;
pub use error::{ErrorKind, PanelError, Result};
pub use headless::{HeadlessDisplay, HeadlessSurface, WidgetWrite};
pub use params::{ParameterPanel, ParameterWidgetPair};
pub use queue::{submit, CommandOutcome, CommandQueue, DeferredCommand};
pub use render::{Histogram, RenderAction, RenderCache, RenderStats, HISTOGRAM_BUCKETS};
pub use rig::StereoRig;
pub use scheduler::{FailureDisposition, Scheduler, TickReport};
pub use sequencer::{FramePair, StreamSequencer, StreamState};
