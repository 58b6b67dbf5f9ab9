//! Mock camera
//!
//! 用于单元测试和 headless 会话的 mock 实现，支持注入失败场景。
//! 所有 mock 相机共享同一个 `CallLog`，以便检查跨相机的调用顺序。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use contracts::{
    nodes, AccessMode, FrameRecord, MockCameraSettings, NodeOp, NodeValue, PixelBuffer,
};
use tracing::{debug, instrument};

use crate::backend::CameraBackend;
use crate::error::{BackendError, Result};

/// Camera clock value of the first frame (microseconds)
const CLOCK_ORIGIN_US: u64 = 1_000_000;

/// Backend operation kind recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Find,
    Init,
    SetNode,
    StartAcquisition,
    EndAcquisition,
    GetFrame,
    Serial,
    Deinit,
}

impl MockOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Init => "init",
            Self::SetNode => "set_node",
            Self::StartAcquisition => "start_acquisition",
            Self::EndAcquisition => "end_acquisition",
            Self::GetFrame => "get_frame",
            Self::Serial => "serial",
            Self::Deinit => "deinit",
        }
    }
}

impl fmt::Display for MockOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCall {
    /// Camera name given at construction
    pub camera: String,
    pub op: MockOp,
    /// Node name and value for `SetNode`
    pub detail: Option<String>,
}

/// Shared, ordered record of backend calls
///
/// Calls are recorded before they are evaluated, failing calls included.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<BackendCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, camera: &str, op: MockOp, detail: Option<String>) {
        self.entries.lock().unwrap().push(BackendCall {
            camera: camera.to_string(),
            op,
            detail,
        });
    }

    /// Snapshot of every recorded call
    pub fn entries(&self) -> Vec<BackendCall> {
        self.entries.lock().unwrap().clone()
    }

    /// `(camera, op)` pairs in call order
    pub fn sequence(&self) -> Vec<(String, MockOp)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|c| (c.camera.clone(), c.op))
            .collect()
    }

    /// `(camera, op)` pairs restricted to the given operations
    pub fn sequence_of(&self, ops: &[MockOp]) -> Vec<(String, MockOp)> {
        self.sequence()
            .into_iter()
            .filter(|(_, op)| ops.contains(op))
            .collect()
    }

    /// Number of calls of `op` on `camera`
    pub fn count(&self, camera: &str, op: MockOp) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.camera == camera && c.op == op)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone)]
struct MockNode {
    access: AccessMode,
    value: Option<NodeValue>,
}

#[derive(Debug, Default)]
struct MockState {
    found: bool,
    initialized: bool,
    acquiring: bool,
    nodes: HashMap<String, MockNode>,
    frames_delivered: u64,
    frames_since_start: u64,
    /// 剩余失败次数 (op -> count)
    fail_next: HashMap<MockOp, u32>,
    /// 被拒绝的节点
    rejected_nodes: Vec<String>,
    incomplete_next: u32,
}

/// Failure injection and inspection handle of one `MockCamera`
///
/// Stays valid after the camera was moved into the rig.
#[derive(Debug, Clone)]
pub struct MockHandle {
    camera: String,
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    pub fn camera(&self) -> &str {
        &self.camera
    }

    /// Make the next call of `op` fail
    pub fn fail_next(&self, op: MockOp) {
        self.fail_times(op, 1);
    }

    /// Make the next `times` calls of `op` fail
    pub fn fail_times(&self, op: MockOp, times: u32) {
        *self.state.lock().unwrap().fail_next.entry(op).or_insert(0) += times;
    }

    /// Make every later `SetNode` on `node` fail
    pub fn reject_node(&self, node: impl Into<String>) {
        self.state.lock().unwrap().rejected_nodes.push(node.into());
    }

    /// Deliver the next `count` frames without pixel data
    pub fn deliver_incomplete(&self, count: u32) {
        self.state.lock().unwrap().incomplete_next += count;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }

    pub fn is_acquiring(&self) -> bool {
        self.state.lock().unwrap().acquiring
    }

    /// Frames handed out since construction, incomplete ones included
    pub fn frames_delivered(&self) -> u64 {
        self.state.lock().unwrap().frames_delivered
    }

    /// Current value of a node
    pub fn node_value(&self, node: &str) -> Option<NodeValue> {
        self.state
            .lock()
            .unwrap()
            .nodes
            .get(node)
            .and_then(|n| n.value.clone())
    }
}

/// Mock camera
pub struct MockCamera {
    /// 调用日志中的相机名
    name: String,
    settings: MockCameraSettings,
    state: Arc<Mutex<MockState>>,
    log: CallLog,
}

impl MockCamera {
    /// 创建 mock 相机，调用记录写入 `log`
    pub fn new(name: impl Into<String>, settings: MockCameraSettings, log: CallLog) -> Self {
        let state = MockState {
            nodes: default_nodes(&settings),
            ..MockState::default()
        };
        Self {
            name: name.into(),
            settings,
            state: Arc::new(Mutex::new(state)),
            log,
        }
    }

    /// Add or replace a node
    pub fn with_node(
        self,
        node: impl Into<String>,
        access: AccessMode,
        value: Option<NodeValue>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(node.into(), MockNode { access, value });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &MockCameraSettings {
        &self.settings
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            camera: self.name.clone(),
            state: Arc::clone(&self.state),
        }
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    fn take_fault(&self, state: &mut MockState, op: MockOp) -> Result<()> {
        match state.fail_next.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(BackendError::Injected {
                    camera: self.name.clone(),
                    operation: op.as_str(),
                })
            }
            _ => Ok(()),
        }
    }

    fn ensure_initialized(&self, state: &MockState) -> Result<()> {
        if state.initialized {
            Ok(())
        } else {
            Err(BackendError::not_initialized(&self.name))
        }
    }

    /// Deterministic diagonal gradient shifted by the frame index
    fn render_pixels(&self, index: u64) -> PixelBuffer {
        let width = self.settings.width;
        let height = self.settings.height;
        let levels = 1u64 << self.settings.bits_per_pixel.clamp(1, 16);
        let wide = self.settings.bits_per_pixel > 8;
        let mut data = Vec::with_capacity(width as usize * height as usize * if wide { 2 } else { 1 });
        for y in 0..height as u64 {
            for x in 0..width as u64 {
                let v = ((x + y + index) % levels) as u16;
                if wide {
                    data.extend_from_slice(&v.to_le_bytes());
                } else {
                    data.push(v as u8);
                }
            }
        }
        PixelBuffer {
            width,
            height,
            data: Bytes::from(data),
        }
    }
}

impl CameraBackend for MockCamera {
    #[instrument(name = "mock_camera_find", skip(self), fields(camera = %self.name))]
    fn find(&mut self, config_ref: &str) -> Result<()> {
        self.log.record(&self.name, MockOp::Find, Some(config_ref.to_string()));
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::Find)?;

        // 纯数字视为序列号，必须与 mock 序列号一致
        let trimmed = config_ref.trim();
        let is_serial = !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit());
        if trimmed.is_empty() || (is_serial && trimmed != self.settings.serial) {
            return Err(BackendError::not_found(config_ref));
        }
        state.found = true;
        Ok(())
    }

    #[instrument(name = "mock_camera_init", skip(self), fields(camera = %self.name))]
    fn init(&mut self, config_ref: &str) -> Result<()> {
        self.log.record(&self.name, MockOp::Init, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::Init)?;
        if !state.found {
            return Err(BackendError::not_found(config_ref));
        }
        state.initialized = true;
        Ok(())
    }

    #[instrument(
        name = "mock_camera_set_node",
        skip(self, node, value),
        fields(camera = %self.name, node = %node)
    )]
    fn set_node(
        &mut self,
        node: &str,
        op: NodeOp,
        access: AccessMode,
        value: Option<&NodeValue>,
    ) -> Result<Option<NodeValue>> {
        let detail = match value {
            Some(v) => format!("{node}={v}"),
            None => node.to_string(),
        };
        self.log.record(&self.name, MockOp::SetNode, Some(detail));
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::SetNode)?;
        self.ensure_initialized(&state)?;

        if state.rejected_nodes.iter().any(|n| n == node) {
            return Err(BackendError::node_rejected(node, op, "mock rejection"));
        }
        let entry = state
            .nodes
            .get_mut(node)
            .ok_or_else(|| BackendError::node_rejected(node, op, "unknown node"))?;

        // GetValue 允许读取 RW 节点
        let readable = op == NodeOp::GetValue
            && access == AccessMode::ReadOnly
            && entry.access == AccessMode::ReadWrite;
        if entry.access != access && !readable {
            return Err(BackendError::AccessMode {
                node: node.to_string(),
                expected: access,
                actual: entry.access,
            });
        }

        match op {
            NodeOp::Execute => Ok(None),
            NodeOp::GetValue => Ok(entry.value.clone()),
            NodeOp::SetValue => {
                let value =
                    value.ok_or_else(|| BackendError::node_rejected(node, op, "missing value"))?;
                entry.value = Some(value.clone());
                Ok(None)
            }
        }
    }

    #[instrument(name = "mock_camera_start", skip(self), fields(camera = %self.name))]
    fn start_acquisition(&mut self) -> Result<()> {
        self.log.record(&self.name, MockOp::StartAcquisition, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::StartAcquisition)?;
        self.ensure_initialized(&state)?;
        if state.acquiring {
            return Err(BackendError::acquisition(&self.name, "already acquiring"));
        }
        state.acquiring = true;
        state.frames_since_start = 0;
        Ok(())
    }

    #[instrument(name = "mock_camera_end", skip(self), fields(camera = %self.name))]
    fn end_acquisition(&mut self) -> Result<()> {
        self.log.record(&self.name, MockOp::EndAcquisition, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::EndAcquisition)?;
        if !state.acquiring {
            return Err(BackendError::acquisition(&self.name, "not acquiring"));
        }
        state.acquiring = false;
        Ok(())
    }

    fn get_frame(&mut self) -> Result<FrameRecord> {
        self.log.record(&self.name, MockOp::GetFrame, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::GetFrame)?;
        if !state.acquiring {
            return Err(BackendError::acquisition(&self.name, "acquisition not started"));
        }
        let single_frame = state
            .nodes
            .get(nodes::ACQUISITION_MODE)
            .and_then(|n| n.value.as_ref())
            == Some(&NodeValue::enum_entry(nodes::SINGLE_FRAME));
        if single_frame && state.frames_since_start > 0 {
            return Err(BackendError::acquisition(
                &self.name,
                "no frame pending in SingleFrame mode",
            ));
        }

        let index = state.frames_delivered;
        state.frames_delivered += 1;
        state.frames_since_start += 1;
        let timestamp_us = CLOCK_ORIGIN_US + index * self.settings.frame_interval_us;

        let periodic = self
            .settings
            .incomplete_every
            .is_some_and(|every| every > 0 && state.frames_delivered % every as u64 == 0);
        let forced = state.incomplete_next > 0;
        if forced {
            state.incomplete_next -= 1;
        }
        if forced || periodic {
            debug!(camera = %self.name, index, "Delivering incomplete frame");
            return Ok(FrameRecord::incomplete(
                self.settings.serial.clone(),
                timestamp_us,
                self.settings.bits_per_pixel,
            ));
        }
        drop(state);

        Ok(FrameRecord {
            pixels: Some(self.render_pixels(index)),
            timestamp_us,
            bits_per_pixel: self.settings.bits_per_pixel,
            serial: self.settings.serial.clone(),
        })
    }

    fn serial(&self) -> Result<String> {
        self.log.record(&self.name, MockOp::Serial, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::Serial)?;
        if !state.found {
            return Err(BackendError::not_initialized(&self.name));
        }
        Ok(self.settings.serial.clone())
    }

    #[instrument(name = "mock_camera_deinit", skip(self), fields(camera = %self.name))]
    fn deinit(&mut self) -> Result<()> {
        self.log.record(&self.name, MockOp::Deinit, None);
        let mut state = self.state.lock().unwrap();
        self.take_fault(&mut state, MockOp::Deinit)?;
        state.initialized = false;
        state.acquiring = false;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().unwrap().initialized
    }
}

fn default_nodes(settings: &MockCameraSettings) -> HashMap<String, MockNode> {
    use AccessMode::{ReadOnly, ReadWrite, WriteOnly};

    let pixel_format = if settings.bits_per_pixel > 8 { "Mono16" } else { "Mono8" };
    let table: Vec<(&str, AccessMode, Option<NodeValue>)> = vec![
        (
            nodes::STREAM_BUFFER_HANDLING_MODE,
            ReadWrite,
            Some(NodeValue::enum_entry("OldestFirst")),
        ),
        (
            nodes::ACQUISITION_MODE,
            ReadWrite,
            Some(NodeValue::enum_entry(nodes::CONTINUOUS)),
        ),
        (
            nodes::DEVICE_SERIAL_NUMBER,
            ReadOnly,
            Some(NodeValue::enum_entry(settings.serial.clone())),
        ),
        ("AcquisitionFrameRateEnable", ReadWrite, Some(NodeValue::Bool(false))),
        ("AcquisitionFrameRate", ReadWrite, Some(NodeValue::Float(30.0))),
        ("GainAuto", ReadWrite, Some(NodeValue::enum_entry("Continuous"))),
        ("Gain", ReadWrite, Some(NodeValue::Float(0.0))),
        ("ExposureAuto", ReadWrite, Some(NodeValue::enum_entry("Continuous"))),
        ("ExposureTime", ReadWrite, Some(NodeValue::Float(10_000.0))),
        ("UserSetSelector", ReadWrite, Some(NodeValue::enum_entry("Default"))),
        ("UserSetLoad", WriteOnly, None),
        ("TriggerMode", ReadWrite, Some(NodeValue::enum_entry("Off"))),
        ("TriggerSelector", ReadWrite, Some(NodeValue::enum_entry("FrameStart"))),
        ("TriggerSource", ReadWrite, Some(NodeValue::enum_entry("Software"))),
        ("TriggerActivation", ReadWrite, Some(NodeValue::enum_entry("RisingEdge"))),
        ("TriggerOverlap", ReadWrite, Some(NodeValue::enum_entry("Off"))),
        ("LineSelector", ReadWrite, Some(NodeValue::enum_entry("Line0"))),
        ("LineMode", ReadWrite, Some(NodeValue::enum_entry("Input"))),
        ("LineSource", ReadWrite, Some(NodeValue::enum_entry("Off"))),
        ("V3_3Enable", ReadWrite, Some(NodeValue::Bool(false))),
        ("PixelFormat", ReadWrite, Some(NodeValue::enum_entry(pixel_format))),
        ("Width", ReadOnly, Some(NodeValue::Int(settings.width as i64))),
        ("Height", ReadOnly, Some(NodeValue::Int(settings.height as i64))),
    ];
    table
        .into_iter()
        .map(|(name, access, value)| (name.to_string(), MockNode { access, value }))
        .collect()
}
