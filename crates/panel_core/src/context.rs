//! Panel context
//!
//! All mutable runtime state, owned by the scheduler loop and passed by
//! reference into commands. There are no process-wide globals.

use camera_backend::{CallLog, CameraBackend, MockCamera};
use config_loader::ConfigLoader;
use contracts::{CameraSide, ImageSink, NodeScript, PanelBlueprint, UiEvent};
use observability::PanelMetricsAggregator;

use crate::capture::CaptureSettings;
use crate::commands::command_for;
use crate::error::Result;
use crate::params::ParameterPanel;
use crate::queue::CommandQueue;
use crate::render::RenderCache;
use crate::rig::StereoRig;
use crate::sequencer::{StreamSequencer, StreamState};

/// Runtime state of one panel session
pub struct PanelContext<B> {
    pub blueprint: PanelBlueprint,
    pub sequencer: StreamSequencer<B>,
    pub render: RenderCache,
    pub params: ParameterPanel,
    pub capture: CaptureSettings,
    pub queue: CommandQueue<B>,
    pub sink: Box<dyn ImageSink>,
    pub metrics: PanelMetricsAggregator,
}

impl<B: CameraBackend + 'static> PanelContext<B> {
    pub fn new(
        blueprint: PanelBlueprint,
        primary: B,
        secondary: B,
        sink: Box<dyn ImageSink>,
    ) -> Self {
        Self {
            sequencer: StreamSequencer::new(StereoRig::new(primary, secondary)),
            render: RenderCache::new(),
            params: ParameterPanel::new(&blueprint.parameters),
            capture: CaptureSettings::from_config(&blueprint.capture),
            queue: CommandQueue::new(),
            sink,
            metrics: PanelMetricsAggregator::new(),
            blueprint,
        }
    }

    pub fn stream_state(&self) -> StreamState {
        self.sequencer.state()
    }

    /// Turn a UI event into a deferred command for the next drain
    pub fn submit_event(&mut self, event: UiEvent) {
        self.queue.enqueue(command_for(event));
    }

    /// Node script configured for `side`, read from disk on each call
    pub fn init_script(&self, side: CameraSide) -> Result<Option<NodeScript>> {
        match &self.blueprint.camera(side).init_script {
            Some(path) => Ok(Some(ConfigLoader::load_node_script(path)?)),
            None => Ok(None),
        }
    }
}

impl PanelContext<MockCamera> {
    /// Context backed by the mock cameras described in the blueprint
    pub fn with_mock_cameras(
        blueprint: PanelBlueprint,
        log: &CallLog,
        sink: Box<dyn ImageSink>,
    ) -> Self {
        let primary = MockCamera::new(
            CameraSide::Primary.as_str(),
            blueprint.cameras.primary.mock.clone(),
            log.clone(),
        );
        let secondary = MockCamera::new(
            CameraSide::Secondary.as_str(),
            blueprint.cameras.secondary.mock.clone(),
            log.clone(),
        );
        Self::new(blueprint, primary, secondary, sink)
    }
}
