//! PanelBlueprint - Config Loader 输出
//!
//! 描述完整的面板配置：两台相机、参数滑块范围、采集保存策略、调度器策略。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{CameraParameter, CameraSide};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的面板配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 相机设置
    #[serde(default)]
    pub cameras: CamerasConfig,

    /// 参数滑块范围
    #[serde(default)]
    pub parameters: ParametersConfig,

    /// 图像保存设置
    #[serde(default)]
    pub capture: CaptureConfig,

    /// 调度器设置
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl PanelBlueprint {
    /// 获取某一侧相机配置
    pub fn camera(&self, side: CameraSide) -> &CameraConfig {
        match side {
            CameraSide::Primary => &self.cameras.primary,
            CameraSide::Secondary => &self.cameras.secondary,
        }
    }
}

/// 双相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CamerasConfig {
    /// 主相机 (触发源)
    #[serde(default = "default_primary_camera")]
    pub primary: CameraConfig,

    /// 从相机 (被触发)
    #[serde(default = "default_secondary_camera")]
    pub secondary: CameraConfig,
}

impl Default for CamerasConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_camera(),
            secondary: default_secondary_camera(),
        }
    }
}

/// 单台相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// "Find and Init" 文本框初始值
    pub config_ref: String,

    /// 初始化后执行的节点脚本 (可选)
    #[serde(default)]
    pub init_script: Option<PathBuf>,

    /// Mock 相机参数
    #[serde(default)]
    pub mock: MockCameraSettings,
}

/// Mock 相机参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockCameraSettings {
    /// 序列号
    pub serial: String,

    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 像素位深 (1..=16)
    pub bits_per_pixel: u8,

    /// 帧间隔 (微秒)
    pub frame_interval_us: u64,

    /// 每 N 帧产生一帧不完整图像 (None = 从不)
    pub incomplete_every: Option<u32>,
}

impl MockCameraSettings {
    pub fn with_serial(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            width: default_width(),
            height: default_height(),
            bits_per_pixel: default_bits_per_pixel(),
            frame_interval_us: default_frame_interval_us(),
            incomplete_every: None,
        }
    }
}

impl Default for MockCameraSettings {
    fn default() -> Self {
        Self::with_serial("00000000")
    }
}

fn default_primary_camera() -> CameraConfig {
    CameraConfig {
        config_ref: "primary.toml".to_string(),
        init_script: None,
        mock: MockCameraSettings::with_serial("18285621"),
    }
}

fn default_secondary_camera() -> CameraConfig {
    CameraConfig {
        config_ref: "secondary.toml".to_string(),
        init_script: None,
        mock: MockCameraSettings::with_serial("18285622"),
    }
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    480
}

fn default_bits_per_pixel() -> u8 {
    8
}

fn default_frame_interval_us() -> u64 {
    16_667
}

/// 滑块范围
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// 三个相机参数的范围
///
/// 默认值来自 BFS-U3-32S4M 相机。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParametersConfig {
    /// 帧率 (Hz)
    #[serde(default = "default_fps_range")]
    pub fps: ParameterRange,

    /// 增益 (dB)
    #[serde(default = "default_gain_range")]
    pub gain: ParameterRange,

    /// 曝光时间 (微秒)
    #[serde(default = "default_exposure_range")]
    pub exposure: ParameterRange,
}

impl ParametersConfig {
    pub fn range(&self, parameter: CameraParameter) -> &ParameterRange {
        match parameter {
            CameraParameter::Fps => &self.fps,
            CameraParameter::Gain => &self.gain,
            CameraParameter::Exposure => &self.exposure,
        }
    }
}

impl Default for ParametersConfig {
    fn default() -> Self {
        Self {
            fps: default_fps_range(),
            gain: default_gain_range(),
            exposure: default_exposure_range(),
        }
    }
}

fn default_fps_range() -> ParameterRange {
    // 手册写 118，实测 60
    ParameterRange {
        min: 1.0,
        max: 60.0,
        default: 1.0,
    }
}

fn default_gain_range() -> ParameterRange {
    ParameterRange {
        min: 0.0,
        max: 47.0,
        default: 0.0,
    }
}

fn default_exposure_range() -> ParameterRange {
    ParameterRange {
        min: 6.0,
        max: 29_999_999.0,
        default: 6.0,
    }
}

/// 图像保存设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 文件名模板
    #[serde(default = "default_name_format")]
    pub name_format: String,

    /// 计数器初始值
    #[serde(default = "default_counter")]
    pub counter: u64,

    /// 每次保存的图像对数量
    #[serde(default = "default_count")]
    pub count: u32,

    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 采集策略
    #[serde(default)]
    pub strategy: CaptureStrategy,

    /// 输出方式
    #[serde(default)]
    pub sink: SinkKind,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            name_format: default_name_format(),
            counter: default_counter(),
            count: default_count(),
            output_dir: default_output_dir(),
            strategy: CaptureStrategy::default(),
            sink: SinkKind::default(),
        }
    }
}

/// 默认文件名模板
pub const DEFAULT_NAME_FORMAT: &str = "{serial}_{datetime}_{counter}_{L_R}";

/// 文件名模板中可用的占位符
pub const NAME_PLACEHOLDERS: [&str; 4] = ["serial", "datetime", "counter", "L_R"];

fn default_name_format() -> String {
    DEFAULT_NAME_FORMAT.to_string()
}

fn default_counter() -> u64 {
    1
}

fn default_count() -> u32 {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./captures")
}

/// 保存时如何获取图像对
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStrategy {
    /// 直接从连续采集流中取帧
    #[default]
    FromStream,
    /// 停止连续采集，每对图像单帧重新布防
    Rearm,
}

/// 保存输出类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// PNG 文件
    #[default]
    Png,
    /// 仅日志
    Log,
}

/// 调度器设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 采集步骤失败处理策略
    #[serde(default)]
    pub stream_failure: StreamFailurePolicy,

    /// 每个 tick 之后的等待时间 (微秒)，0 = 仅协作式让出
    #[serde(default)]
    pub tick_interval_us: u64,
}

/// 采集仍在运行时，流步骤失败如何处理
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamFailurePolicy {
    /// 上报到顶层边界，界面仍打开则终止循环
    #[default]
    Escalate,
    /// 仅向用户报告，循环继续
    Report,
}
