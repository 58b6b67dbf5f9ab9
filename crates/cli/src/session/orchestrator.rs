//! Session orchestrator - wires config, cameras, sink and scheduler.
//!
//! Runs on the current thread: the scheduler loop is the only logical
//! thread of control, the Ctrl+C watcher just raises a flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use camera_backend::CallLog;
use contracts::PanelBlueprint;
use panel_core::{PanelContext, Scheduler};
use tracing::{info, warn};

use super::{ScriptedSurface, SessionScript, SessionStats};
use crate::error::CliError;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Panel configuration, paths already resolved
    pub blueprint: PanelBlueprint,

    /// Scripted UI events
    pub script: SessionScript,

    /// Ticks to keep running after the last scripted event
    pub linger_ticks: u64,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One headless panel session
pub struct Session {
    config: SessionConfig,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// Run until the script is done or Ctrl+C
    ///
    /// An escalated failure ends the session with an error after the
    /// cameras were released.
    pub async fn run(self) -> Result<SessionStats> {
        let start_time = Instant::now();
        let SessionConfig {
            blueprint,
            script,
            linger_ticks,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let sink = persistence::create_sink(blueprint.capture.sink, &blueprint.capture.output_dir)
            .context("Failed to create image sink")?;

        info!(
            primary = %blueprint.cameras.primary.mock.serial,
            secondary = %blueprint.cameras.secondary.mock.serial,
            "Running with mock cameras"
        );
        let log = CallLog::new();
        let mut ctx = PanelContext::with_mock_cameras(blueprint, &log, sink);
        let scheduler = Scheduler::new(&ctx.blueprint.scheduler);

        let interrupted = Arc::new(AtomicBool::new(false));
        let watcher = tokio::spawn(watch_shutdown_signal(interrupted.clone()));

        let steps = script.steps.len();
        info!(steps, linger_ticks, policy = ?scheduler.policy(), "Session started");
        let mut surface = ScriptedSurface::new(script, linger_ticks, interrupted.clone());

        let outcome = scheduler.run(&mut ctx, &mut surface).await;
        watcher.abort();
        if interrupted.load(Ordering::Relaxed) {
            warn!("Session interrupted by signal");
        }

        let stats = SessionStats {
            ticks: ctx.metrics.total_ticks,
            duration: start_time.elapsed(),
            steps_released: surface.released(),
            errors_reported: surface.headless().reported_errors().to_vec(),
            render: ctx.render.stats(),
            metrics: ctx.metrics.summary(),
        };
        info!(
            ticks = stats.ticks,
            backend_calls = log.len(),
            duration_secs = stats.duration.as_secs_f64(),
            "Session finished"
        );

        match outcome {
            Ok(_) => Ok(stats),
            Err(e) => {
                stats.print_summary();
                Err(CliError::session_terminated(stats.ticks, e.to_string()).into())
            }
        }
    }
}

/// Raise `flag` on Ctrl+C or SIGTERM
async fn watch_shutdown_signal(flag: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    flag.store(true, Ordering::Relaxed);
}
