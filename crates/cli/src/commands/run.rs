//! `run` command implementation.

use anyhow::Result;
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::session::{Session, SessionConfig, SessionScript};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut blueprint = load_blueprint(&args.config)?;

    // Apply CLI overrides
    if let Some(ref output_dir) = args.output_dir {
        info!(output_dir = %output_dir.display(), "Overriding capture output directory from CLI");
        blueprint.capture.output_dir = output_dir.clone();
    }
    if let Some(policy) = args.stream_failure {
        info!(policy = ?policy, "Overriding stream failure policy from CLI");
        blueprint.scheduler.stream_failure = policy.into();
    }
    if let Some(tick_interval_us) = args.tick_interval_us {
        blueprint.scheduler.tick_interval_us = tick_interval_us;
    }

    let script = match &args.script {
        Some(path) => {
            info!(script = %path.display(), "Loading session script");
            SessionScript::load(path)?
        }
        None => SessionScript::default(),
    };
    for warning in script.warnings() {
        tracing::warn!("{warning}");
    }

    info!(
        primary = %blueprint.cameras.primary.config_ref,
        secondary = %blueprint.cameras.secondary.config_ref,
        sink = ?blueprint.capture.sink,
        strategy = ?blueprint.capture.strategy,
        steps = script.steps.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_script_summary(&script);
        return Ok(());
    }

    let session = Session::new(SessionConfig {
        blueprint,
        script,
        linger_ticks: args.linger_ticks,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting session...");
    let stats = session.run().await?;
    info!(
        ticks = stats.ticks,
        images_saved = stats.metrics.images_saved,
        duration_secs = stats.duration.as_secs_f64(),
        "Session completed successfully"
    );
    stats.print_summary();

    info!("Stereo Panel finished");
    Ok(())
}

/// Print the scripted events for dry-run mode
fn print_script_summary(script: &SessionScript) {
    println!(
        "\n=== Session Script ({} steps, {} ticks) ===\n",
        script.steps.len(),
        script.duration_ticks()
    );
    let mut tick = 0;
    for (i, step) in script.steps.iter().enumerate() {
        tick += step.wait_ticks;
        println!("  {:>3}. +{:<4} {:?}", i + 1, tick, step.event);
    }
    println!();
}
