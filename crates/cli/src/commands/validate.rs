//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CameraSide, CaptureStrategy, PanelBlueprint, StreamFailurePolicy};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ValidateArgs;
use crate::session::SessionScript;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    primary_serial: String,
    secondary_serial: String,
    init_scripts: usize,
    name_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    script_steps: Option<usize>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        config_path: config_path.clone(),
        error: Some(error),
        warnings: None,
        summary: None,
    };

    let blueprint = match load_blueprint(&args.config) {
        Ok(blueprint) => blueprint,
        Err(e) => return invalid(format!("{e:#}")),
    };

    // node scripts are only read on "Find and Init", check them now
    let mut init_scripts = 0;
    for side in CameraSide::BOTH {
        if let Some(path) = &blueprint.camera(side).init_script {
            if let Err(e) = config_loader::ConfigLoader::load_node_script(path) {
                return invalid(format!("{side} init script {}: {e}", path.display()));
            }
            init_scripts += 1;
        }
    }

    let mut warnings = collect_warnings(&blueprint);
    let script_steps = match &args.script {
        Some(path) => match SessionScript::load(path) {
            Ok(script) => {
                warnings.extend(script.warnings());
                Some(script.steps.len())
            }
            Err(e) => return invalid(e.to_string()),
        },
        None => None,
    };

    ValidationResult {
        valid: true,
        config_path: config_path.clone(),
        error: None,
        warnings: (!warnings.is_empty()).then_some(warnings),
        summary: Some(ConfigSummary {
            version: format!("{:?}", blueprint.version),
            primary_serial: blueprint.cameras.primary.mock.serial.clone(),
            secondary_serial: blueprint.cameras.secondary.mock.serial.clone(),
            init_scripts,
            name_format: blueprint.capture.name_format.clone(),
            script_steps,
        }),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &PanelBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    for side in CameraSide::BOTH {
        if blueprint.camera(side).init_script.is_none() {
            warnings.push(format!(
                "No init script for the {side} camera - trigger lines stay at camera defaults"
            ));
        }
    }

    if !blueprint.capture.name_format.contains("{counter}")
        && !blueprint.capture.name_format.contains("{datetime}")
    {
        warnings.push(
            "capture.name_format has neither {counter} nor {datetime} - saves will overwrite each other"
                .to_string(),
        );
    }

    if blueprint.capture.strategy == CaptureStrategy::Rearm
        && blueprint.scheduler.stream_failure == StreamFailurePolicy::Escalate
    {
        warnings.push(
            "capture.strategy = rearm with stream_failure = escalate: a failed re-arm ends the session"
                .to_string(),
        );
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Primary serial: {}", summary.primary_serial);
            println!("  Secondary serial: {}", summary.secondary_serial);
            println!("  Init scripts: {}", summary.init_scripts);
            println!("  Name format: {}", summary.name_format);
            if let Some(steps) = summary.script_steps {
                println!("  Script steps: {}", steps);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
