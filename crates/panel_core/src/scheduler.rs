//! Scheduler Loop
//!
//! 单线程协作式调度。每个 tick 依次执行：
//!
//! 1. 采集步骤（仅 Running）：取一对帧并渲染，结果暂存
//! 2. 排空命令队列，逐个执行到完成
//! 3. 评估暂存的采集失败：此刻仍为 Running 才按策略上报，已停止则视为拆除噪声
//! 4. 重绘并收集新输入
//!
//! 命令与采集步骤不会在比“整条命令 / 整个帧步骤”更细的粒度上交错，
//! 因此不需要任何锁。

use std::time::{Duration, Instant};

use camera_backend::CameraBackend;
use contracts::{ControlSurface, SchedulerConfig, StreamFailurePolicy};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::context::PanelContext;
use crate::error::{PanelError, Result};
use crate::queue::CommandOutcome;

/// How a stream-step failure was disposed of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Stream was stopped in the same tick, failure ignored
    Swallowed,
    /// Reported to the user, loop continues
    Reported,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The stream step ran
    pub stepped: bool,
    /// A complete pair was rendered
    pub pair_rendered: bool,
    pub commands_completed: usize,
    pub commands_reported: usize,
    pub stream_failure: Option<FailureDisposition>,
}

/// Top-level driver of the panel
#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: StreamFailurePolicy,
    tick_interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(&SchedulerConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            policy: config.stream_failure,
            tick_interval: Duration::from_micros(config.tick_interval_us),
        }
    }

    pub fn with_policy(mut self, policy: StreamFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StreamFailurePolicy {
        self.policy
    }

    /// Run one tick
    ///
    /// Returns `Err` only for an escalated stream failure or a failing
    /// redraw; command failures are reported and never surface here.
    #[instrument(name = "scheduler_tick", level = "trace", skip_all)]
    pub fn tick<B: CameraBackend + 'static>(
        &self,
        ctx: &mut PanelContext<B>,
        surface: &mut dyn ControlSurface,
    ) -> Result<TickReport> {
        let started = Instant::now();
        let mut report = TickReport::default();

        // 1. stream step, failure evaluated after the drain
        let step = if ctx.sequencer.is_running() {
            report.stepped = true;
            Some(stream_step(ctx, surface))
        } else {
            None
        };
        if let Some(Ok(rendered)) = step {
            report.pair_rendered = rendered;
        }

        // 2. drain
        let commands = ctx.queue.drain_all();
        observability::record_queue_depth(commands.len());
        for command in commands {
            let label = command.label();
            let outcome = command.invoke(ctx, surface);
            let completed = outcome == CommandOutcome::Completed;
            ctx.metrics.on_command(label, completed);
            if completed {
                report.commands_completed += 1;
            } else {
                report.commands_reported += 1;
            }
            trace!(command = label, ?outcome, "Command executed");
        }

        // 3. stream failure, against the state after the drain
        if let Some(Err(e)) = step {
            report.stream_failure = Some(self.contain(ctx, surface, e)?);
        }

        // 4. redraw and collect input
        surface.redraw()?;
        for event in surface.poll_events() {
            ctx.submit_event(event);
        }

        ctx.metrics.on_tick(started.elapsed().as_secs_f64() * 1e6);
        Ok(report)
    }

    fn contain<B: CameraBackend>(
        &self,
        ctx: &mut PanelContext<B>,
        surface: &mut dyn ControlSurface,
        e: PanelError,
    ) -> Result<FailureDisposition> {
        if !ctx.sequencer.is_running() {
            debug!(error = %e, "Stream step failed after stop, ignored");
            ctx.metrics.on_stream_failure(false);
            return Ok(FailureDisposition::Swallowed);
        }
        ctx.metrics.on_stream_failure(true);
        match self.policy {
            StreamFailurePolicy::Escalate => Err(PanelError::stream_step(e)),
            StreamFailurePolicy::Report => {
                warn!(error = %e, "Stream step failed");
                surface.report_error(&e);
                Ok(FailureDisposition::Reported)
            }
        }
    }

    /// Run until the surface closes or a failure escalates
    ///
    /// Cameras are always stopped and released before returning. Returns
    /// the number of completed ticks.
    #[instrument(name = "scheduler_run", skip_all, fields(policy = ?self.policy))]
    pub async fn run<B: CameraBackend + 'static>(
        &self,
        ctx: &mut PanelContext<B>,
        surface: &mut dyn ControlSurface,
    ) -> Result<u64> {
        info!(tick_interval_us = self.tick_interval.as_micros() as u64, "Scheduler loop started");
        let mut ticks: u64 = 0;

        let outcome = loop {
            if !surface.is_open() {
                break Ok(());
            }
            if let Err(e) = self.tick(ctx, surface) {
                break Err(e);
            }
            ticks += 1;
            if ticks.is_multiple_of(1000) {
                debug!(ticks, state = ?ctx.stream_state(), "Scheduler progress");
            }
            self.pause().await;
        };

        let outcome = match outcome {
            Ok(()) => Ok(ticks),
            Err(e) => self.boundary(surface, e).map(|()| ticks),
        };
        shutdown(ctx);
        info!(ticks, "Scheduler loop finished");
        outcome
    }

    /// Top-level error boundary
    ///
    /// Fatal while the surface is open; teardown noise once it is closed.
    pub fn boundary(&self, surface: &mut dyn ControlSurface, e: PanelError) -> Result<()> {
        if surface.is_open() {
            error!(error = %e, kind = ?e.kind(), "Scheduler loop terminated");
            surface.report_error(&e);
            Err(e)
        } else {
            debug!(error = %e, "Failure after surface closed, ignored");
            Ok(())
        }
    }

    async fn pause(&self) {
        if self.tick_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.tick_interval).await;
        }
    }
}

/// Pull one pair and draw it; `Ok(false)` for a dropped pair
fn stream_step<B: CameraBackend>(
    ctx: &mut PanelContext<B>,
    surface: &mut dyn ControlSurface,
) -> Result<bool> {
    let Some(pair) = ctx.sequencer.step()? else {
        ctx.metrics.on_frame_pair(false);
        return Ok(false);
    };
    ctx.metrics.on_frame_pair(true);
    for (side, frame) in pair.sides() {
        ctx.render.update(side, frame, surface)?;
    }
    Ok(true)
}

/// Stop and release the cameras, drop whatever is still queued
fn shutdown<B: CameraBackend>(ctx: &mut PanelContext<B>) {
    ctx.sequencer.shutdown();
    if let Err(e) = ctx.sink.flush() {
        warn!(sink = ctx.sink.name(), error = %e, "Sink flush failed during shutdown");
    }
    let discarded = ctx.queue.len();
    ctx.queue.clear();
    if discarded > 0 {
        debug!(discarded, "Pending commands discarded");
    }
}
