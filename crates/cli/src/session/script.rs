//! Session script: UI events with tick delays.
//!
//! ```toml
//! [[steps]]
//! event = "find_and_init"
//! side = "primary"
//! config_ref = "18285621"
//!
//! [[steps]]
//! wait_ticks = 5
//! event = "save_images"
//! ```

use std::path::Path;

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{CameraSide, UiEvent};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// One scripted interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Ticks to wait after the previous step
    #[serde(default)]
    pub wait_ticks: u64,

    #[serde(flatten)]
    pub event: UiEvent,
}

/// Ordered list of scripted interactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        ConfigLoader::load_document(path).map_err(|e| CliError::script(path, e.to_string()))
    }

    pub fn parse_toml(content: &str) -> Result<Self, CliError> {
        ConfigLoader::parse_document(content, ConfigFormat::Toml)
            .map_err(|e| CliError::script(Path::new("<inline>"), e.to_string()))
    }

    /// Tick at which the last step is released
    pub fn duration_ticks(&self) -> u64 {
        self.steps.iter().map(|step| step.wait_ticks).sum()
    }

    /// Non-fatal issues worth telling the user about
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.steps.is_empty() {
            warnings.push("Session script has no steps".to_string());
        }
        for side in CameraSide::BOTH {
            let initialized = self.steps.iter().any(|step| {
                matches!(&step.event, UiEvent::FindAndInit { side: s, .. } if *s == side)
            });
            if !initialized {
                warnings.push(format!("The {side} camera is never initialized"));
            }
        }
        let starts = self
            .steps
            .iter()
            .position(|step| step.event == UiEvent::StartStream);
        let first_save = self
            .steps
            .iter()
            .position(|step| step.event == UiEvent::SaveImages);
        if let Some(save) = first_save {
            if starts.map_or(true, |start| start > save) {
                warnings.push(format!(
                    "Step {} saves images before the stream is started",
                    save + 1
                ));
            }
        }
        warnings
    }
}
