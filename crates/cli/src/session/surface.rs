//! Control surface driven by a session script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ContractError, ControlSurface, DisplaySurface, DisplayTarget, UiEvent, WidgetId, WidgetValue,
};
use panel_core::HeadlessSurface;
use tracing::{debug, info};

use super::{ScriptStep, SessionScript};

/// Headless surface that releases scripted events tick by tick
///
/// Closes `linger_ticks` redraws after the last step, or as soon as the
/// interrupt flag is raised.
pub struct ScriptedSurface {
    inner: HeadlessSurface,
    steps: VecDeque<ScriptStep>,
    /// Ticks left before the head step is released
    countdown: u64,
    linger_ticks: u64,
    closing: bool,
    interrupted: Arc<AtomicBool>,
    released: usize,
}

impl ScriptedSurface {
    pub fn new(script: SessionScript, linger_ticks: u64, interrupted: Arc<AtomicBool>) -> Self {
        let steps: VecDeque<ScriptStep> = script.steps.into();
        let countdown = steps.front().map_or(0, |step| step.wait_ticks);
        Self {
            inner: HeadlessSurface::new(),
            steps,
            countdown,
            linger_ticks,
            closing: false,
            interrupted,
            released: 0,
        }
    }

    pub fn headless(&self) -> &HeadlessSurface {
        &self.inner
    }

    /// Steps released so far
    pub fn released(&self) -> usize {
        self.released
    }

    fn release_due(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while self.countdown == 0 {
            let Some(step) = self.steps.pop_front() else {
                break;
            };
            self.released += 1;
            debug!(step = self.released, event = step.event.label(), "Scripted event released");
            events.push(step.event);
            self.countdown = self.steps.front().map_or(0, |next| next.wait_ticks);
        }
        self.countdown = self.countdown.saturating_sub(1);

        if self.steps.is_empty() && !self.closing {
            self.closing = true;
            info!(linger_ticks = self.linger_ticks, "Session script finished");
            self.inner.close_after(self.linger_ticks);
        }
        events
    }
}

impl ControlSurface for ScriptedSurface {
    fn is_open(&self) -> bool {
        !self.interrupted.load(Ordering::Relaxed) && self.inner.is_open()
    }

    fn poll_events(&mut self) -> Vec<UiEvent> {
        // echoes of notifying writes come first, they happened earlier
        let mut events = self.inner.poll_events();
        events.extend(self.release_due());
        events
    }

    fn set_widget_value(
        &mut self,
        widget: WidgetId,
        value: WidgetValue,
        notify: bool,
    ) -> Result<(), ContractError> {
        self.inner.set_widget_value(widget, value, notify)
    }

    fn display(&mut self, target: DisplayTarget) -> &mut dyn DisplaySurface {
        self.inner.display(target)
    }

    fn report_error(&mut self, error: &dyn std::error::Error) {
        self.inner.report_error(error);
    }

    fn redraw(&mut self) -> Result<(), ContractError> {
        self.inner.redraw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(wait_ticks: u64, event: UiEvent) -> ScriptStep {
        ScriptStep { wait_ticks, event }
    }

    /// Simulate the scheduler's redraw + poll at the end of a tick
    fn tick(surface: &mut ScriptedSurface) -> Vec<UiEvent> {
        surface.redraw().unwrap();
        surface.poll_events()
    }

    #[test]
    fn test_steps_released_after_wait() {
        let script = SessionScript {
            steps: vec![
                step(0, UiEvent::StartStream),
                step(0, UiEvent::SaveImages),
                step(2, UiEvent::StopStream),
            ],
        };
        let mut surface = ScriptedSurface::new(script, 1, Arc::default());

        assert_eq!(tick(&mut surface), vec![UiEvent::StartStream, UiEvent::SaveImages]);
        assert!(tick(&mut surface).is_empty());
        assert_eq!(tick(&mut surface), vec![UiEvent::StopStream]);
        assert!(surface.is_open());
        tick(&mut surface);
        assert!(!surface.is_open());
        assert_eq!(surface.released(), 3);
    }

    #[test]
    fn test_interrupt_closes() {
        let flag = Arc::new(AtomicBool::new(false));
        let surface = ScriptedSurface::new(SessionScript::default(), 100, flag.clone());
        assert!(surface.is_open());
        flag.store(true, Ordering::Relaxed);
        assert!(!surface.is_open());
    }
}
