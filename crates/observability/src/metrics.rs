//! Stereo Panel 指标收集模块
//!
//! 收集调度循环、命令执行、帧对获取、渲染与图像保存的运行指标。

use std::collections::HashMap;

use contracts::{CameraSide, DisplayKind};
use metrics::{counter, gauge, histogram};

/// 记录一次调度 tick
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_tick;
///
/// let started = Instant::now();
/// scheduler.tick(&mut ctx, &mut surface)?;
/// record_tick(started.elapsed().as_micros() as f64);
/// ```
pub fn record_tick(duration_us: f64) {
    counter!("stereo_panel_ticks_total").increment(1);
    histogram!("stereo_panel_tick_duration_us").record(duration_us);
}

/// 记录命令执行结果
pub fn record_command(label: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "stereo_panel_commands_total",
        "command" => label.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录队列深度（drain 前）
pub fn record_queue_depth(depth: usize) {
    gauge!("stereo_panel_queue_depth").set(depth as f64);
}

/// 记录流状态 (1 = Running)
pub fn record_stream_state(running: bool) {
    gauge!("stereo_panel_stream_running").set(if running { 1.0 } else { 0.0 });
}

/// 记录一次帧对获取
pub fn record_frame_pair(complete: bool) {
    if complete {
        counter!("stereo_panel_frame_pairs_total").increment(1);
    } else {
        counter!("stereo_panel_frame_pairs_incomplete_total").increment(1);
    }
}

/// 记录不完整帧
pub fn record_incomplete_frame(side: CameraSide) {
    counter!("stereo_panel_incomplete_frames_total", "side" => side.as_str()).increment(1);
}

/// 记录 stream step 失败 (escalated = 上报到顶层边界)
pub fn record_stream_failure(escalated: bool) {
    let disposition = if escalated { "escalated" } else { "swallowed" };
    counter!(
        "stereo_panel_stream_failures_total",
        "disposition" => disposition
    )
    .increment(1);
}

/// 记录显示面更新
pub fn record_render(side: CameraSide, kind: DisplayKind, recreated: bool) {
    let kind = match kind {
        DisplayKind::Image => "image",
        DisplayKind::Histogram => "histogram",
    };
    let mode = if recreated { "recreate" } else { "update" };
    counter!(
        "stereo_panel_render_total",
        "side" => side.as_str(),
        "kind" => kind,
        "mode" => mode
    )
    .increment(1);
}

/// 记录图像写入
pub fn record_image_written(sink_name: &str, side: CameraSide, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "stereo_panel_images_written_total",
        "sink" => sink_name.to_string(),
        "side" => side.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 面板指标聚合器
///
/// 在内存中聚合指标，便于会话结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct PanelMetricsAggregator {
    /// 总 tick 数
    pub total_ticks: u64,

    /// 成功命令数
    pub commands_succeeded: u64,

    /// 失败命令数
    pub commands_failed: u64,

    /// 完整帧对数
    pub complete_pairs: u64,

    /// 不完整帧对数
    pub incomplete_pairs: u64,

    /// 已保存图像数
    pub images_saved: u64,

    /// 被吞掉的 stream step 失败数 (停止后的拆除噪声)
    pub stream_failures_swallowed: u64,

    /// 上报的 stream step 失败数
    pub stream_failures_reported: u64,

    /// tick 耗时统计 (微秒)
    pub tick_stats: RunningStats,

    /// 各命令失败次数
    pub failure_counts: HashMap<String, u64>,
}

impl PanelMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录 tick 并同步到全局 recorder
    pub fn on_tick(&mut self, duration_us: f64) {
        self.total_ticks += 1;
        self.tick_stats.push(duration_us);
        record_tick(duration_us);
    }

    pub fn on_command(&mut self, label: &str, success: bool) {
        if success {
            self.commands_succeeded += 1;
        } else {
            self.commands_failed += 1;
            *self.failure_counts.entry(label.to_string()).or_insert(0) += 1;
        }
        record_command(label, success);
    }

    pub fn on_frame_pair(&mut self, complete: bool) {
        if complete {
            self.complete_pairs += 1;
        } else {
            self.incomplete_pairs += 1;
        }
        record_frame_pair(complete);
    }

    pub fn on_image_saved(&mut self, sink_name: &str, side: CameraSide) {
        self.images_saved += 1;
        record_image_written(sink_name, side, true);
    }

    pub fn on_stream_failure(&mut self, escalated: bool) {
        if escalated {
            self.stream_failures_reported += 1;
        } else {
            self.stream_failures_swallowed += 1;
        }
        record_stream_failure(escalated);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let total_pairs = self.complete_pairs + self.incomplete_pairs;
        MetricsSummary {
            total_ticks: self.total_ticks,
            commands_succeeded: self.commands_succeeded,
            commands_failed: self.commands_failed,
            complete_pairs: self.complete_pairs,
            incomplete_pairs: self.incomplete_pairs,
            incomplete_rate: if total_pairs > 0 {
                self.incomplete_pairs as f64 / total_pairs as f64 * 100.0
            } else {
                0.0
            },
            images_saved: self.images_saved,
            stream_failures_swallowed: self.stream_failures_swallowed,
            stream_failures_reported: self.stream_failures_reported,
            tick_duration_us: StatsSummary::from(&self.tick_stats),
            failure_counts: self.failure_counts.clone(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub commands_succeeded: u64,
    pub commands_failed: u64,
    pub complete_pairs: u64,
    pub incomplete_pairs: u64,
    pub incomplete_rate: f64,
    pub images_saved: u64,
    pub stream_failures_swallowed: u64,
    pub stream_failures_reported: u64,
    pub tick_duration_us: StatsSummary,
    pub failure_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Panel Metrics Summary ===")?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Commands: {} succeeded, {} failed",
            self.commands_succeeded, self.commands_failed
        )?;
        writeln!(
            f,
            "Frame pairs: {} complete, {} incomplete ({:.2}%)",
            self.complete_pairs, self.incomplete_pairs, self.incomplete_rate
        )?;
        writeln!(f, "Images saved: {}", self.images_saved)?;
        writeln!(
            f,
            "Stream failures: {} reported, {} swallowed after stop",
            self.stream_failures_reported, self.stream_failures_swallowed
        )?;
        writeln!(f, "Tick duration (us): {}", self.tick_duration_us)?;

        if !self.failure_counts.is_empty() {
            writeln!(f, "Command failures:")?;
            let mut failures: Vec<_> = self.failure_counts.iter().collect();
            failures.sort();
            for (command, count) in failures {
                writeln!(f, "  {}: {}", command, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计 (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
