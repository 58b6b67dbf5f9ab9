//! Session statistics.

use std::time::Duration;

use observability::MetricsSummary;
use panel_core::RenderStats;

/// Statistics from a session run
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Completed scheduler ticks
    pub ticks: u64,

    /// Wall time of the session
    pub duration: Duration,

    /// Scripted events released to the panel
    pub steps_released: usize,

    /// Messages of the errors shown to the user
    pub errors_reported: Vec<String>,

    /// Render cache recreate/update counters
    pub render: RenderStats,

    /// Aggregated panel metrics
    pub metrics: MetricsSummary,
}

impl SessionStats {
    /// Ticks per second
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Session Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Tick rate: {:.0}/s", self.tick_rate());
        println!("   ├─ Scripted events: {}", self.steps_released);
        println!("   └─ Errors reported: {}", self.errors_reported.len());

        let m = &self.metrics;
        println!("\n📷 Acquisition");
        println!(
            "   ├─ Frame pairs: {} complete, {} dropped ({:.2}%)",
            m.complete_pairs, m.incomplete_pairs, m.incomplete_rate
        );
        println!("   ├─ Images saved: {}", m.images_saved);
        println!(
            "   └─ Stream failures: {} reported, {} swallowed after stop",
            m.stream_failures_reported, m.stream_failures_swallowed
        );

        println!("\n🖼  Render Cache");
        println!(
            "   ├─ Image: {} recreated, {} updated",
            self.render.image_recreations, self.render.image_updates
        );
        println!(
            "   └─ Histogram: {} recreated, {} updated",
            self.render.histogram_recreations, self.render.histogram_updates
        );

        println!(
            "\n⚙️  Commands: {} completed, {} failed",
            m.commands_succeeded, m.commands_failed
        );
        let mut failures: Vec<_> = m.failure_counts.iter().collect();
        failures.sort();
        for (command, count) in failures {
            println!("   ├─ {command}: {count}");
        }
        if !self.errors_reported.is_empty() {
            println!("\n⚠️  Reported Errors");
            for error in &self.errors_reported {
                println!("   ├─ {error}");
            }
        }

        println!();
    }
}
