//! Command implementations.

mod info;
mod run;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::PanelBlueprint;

use crate::error::CliError;

pub use info::run_info;
pub use run::run_session;
pub use validate::run_validate;

/// Load a blueprint and resolve its relative paths against the config's directory
fn load_blueprint(config: &Path) -> Result<PanelBlueprint> {
    if !config.exists() {
        return Err(CliError::config_not_found(config).into());
    }
    let mut blueprint = config_loader::ConfigLoader::load_from_path(config)
        .with_context(|| format!("Failed to load config from {}", config.display()))?;
    if let Some(base) = config.parent() {
        resolve_paths(&mut blueprint, base);
    }
    Ok(blueprint)
}

fn resolve_paths(blueprint: &mut PanelBlueprint, base: &Path) {
    for camera in [
        &mut blueprint.cameras.primary,
        &mut blueprint.cameras.secondary,
    ] {
        if let Some(script) = camera.init_script.as_mut().filter(|p| p.is_relative()) {
            *script = base.join(&*script);
        }
    }
    if blueprint.capture.output_dir.is_relative() {
        blueprint.capture.output_dir = base.join(&blueprint.capture.output_dir);
    }
}
