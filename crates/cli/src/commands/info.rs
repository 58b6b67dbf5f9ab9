//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CameraConfig, CameraParameter, CameraSide, PanelBlueprint};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    cameras: Vec<CameraInfo>,
    parameters: Vec<ParameterInfo>,
    capture: CaptureInfo,
    scheduler: SchedulerInfo,
}

#[derive(Serialize)]
struct CameraInfo {
    side: CameraSide,
    config_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    init_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mock: Option<MockInfo>,
}

#[derive(Serialize)]
struct MockInfo {
    serial: String,
    width: u32,
    height: u32,
    bits_per_pixel: u8,
    frame_interval_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    incomplete_every: Option<u32>,
}

#[derive(Serialize)]
struct ParameterInfo {
    parameter: CameraParameter,
    node: &'static str,
    min: f64,
    max: f64,
    default: f64,
}

#[derive(Serialize)]
struct CaptureInfo {
    name_format: String,
    counter: u64,
    count: u32,
    output_dir: String,
    strategy: String,
    sink: String,
}

#[derive(Serialize)]
struct SchedulerInfo {
    stream_failure: String,
    tick_interval_us: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn camera_info(side: CameraSide, camera: &CameraConfig, with_mock: bool) -> CameraInfo {
    let mock = &camera.mock;
    CameraInfo {
        side,
        config_ref: camera.config_ref.clone(),
        init_script: camera
            .init_script
            .as_ref()
            .map(|p| p.display().to_string()),
        mock: with_mock.then(|| MockInfo {
            serial: mock.serial.clone(),
            width: mock.width,
            height: mock.height,
            bits_per_pixel: mock.bits_per_pixel,
            frame_interval_us: mock.frame_interval_us,
            incomplete_every: mock.incomplete_every,
        }),
    }
}

fn build_config_info(blueprint: &PanelBlueprint, args: &InfoArgs) -> ConfigInfo {
    let cameras = CameraSide::BOTH
        .into_iter()
        .map(|side| camera_info(side, blueprint.camera(side), args.cameras))
        .collect();

    let parameters = CameraParameter::ALL
        .into_iter()
        .map(|parameter| {
            let range = blueprint.parameters.range(parameter);
            ParameterInfo {
                parameter,
                node: parameter.node_name(),
                min: range.min,
                max: range.max,
                default: range.default,
            }
        })
        .collect();

    let capture = &blueprint.capture;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        cameras,
        parameters,
        capture: CaptureInfo {
            name_format: capture.name_format.clone(),
            counter: capture.counter,
            count: capture.count,
            output_dir: capture.output_dir.display().to_string(),
            strategy: format!("{:?}", capture.strategy),
            sink: format!("{:?}", capture.sink),
        },
        scheduler: SchedulerInfo {
            stream_failure: format!("{:?}", blueprint.scheduler.stream_failure),
            tick_interval_us: blueprint.scheduler.tick_interval_us,
        },
    }
}

fn print_config_info(blueprint: &PanelBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Stereo Panel Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📷 Cameras (version {:?})", blueprint.version);
    for (i, side) in CameraSide::BOTH.into_iter().enumerate() {
        let camera = blueprint.camera(side);
        let is_last = i == CameraSide::BOTH.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, side, camera.config_ref);
        match &camera.init_script {
            Some(path) => println!("   {}  ├─ Init script: {}", child_prefix, path.display()),
            None => println!("   {}  ├─ Init script: (none)", child_prefix),
        }
        let mock = &camera.mock;
        if args.cameras {
            println!(
                "   {}  └─ Mock: serial {}, {}x{} @ {} bit, every {} us",
                child_prefix,
                mock.serial,
                mock.width,
                mock.height,
                mock.bits_per_pixel,
                mock.frame_interval_us
            );
        } else {
            println!("   {}  └─ Mock serial: {}", child_prefix, mock.serial);
        }
    }

    println!("\n🎚  Parameters");
    for (i, parameter) in CameraParameter::ALL.into_iter().enumerate() {
        let range = blueprint.parameters.range(parameter);
        let prefix = if i == CameraParameter::ALL.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        println!(
            "   {} {} ({}): {} .. {}, default {}",
            prefix,
            parameter,
            parameter.node_name(),
            range.min,
            range.max,
            range.default
        );
    }

    let capture = &blueprint.capture;
    println!("\n💾 Capture");
    println!("   ├─ Name format: {}", capture.name_format);
    println!("   ├─ Counter: {} (count {})", capture.counter, capture.count);
    println!("   ├─ Output: {} ({:?})", capture.output_dir.display(), capture.sink);
    println!("   └─ Strategy: {:?}", capture.strategy);

    println!("\n⚙️  Scheduler");
    println!("   ├─ Stream failure: {:?}", blueprint.scheduler.stream_failure);
    println!(
        "   └─ Tick interval: {} us",
        blueprint.scheduler.tick_interval_us
    );

    println!();
}
