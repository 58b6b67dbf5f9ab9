//! Command Queue
//!
//! FIFO of deferred user actions. Commands enqueued while a drain is being
//! executed land in the next tick's drain.

use std::collections::VecDeque;

use contracts::ControlSurface;
use tracing::warn;

use crate::context::PanelContext;
use crate::error::Result;

/// How a command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Completed,
    /// Failed, the error was handed to `ControlSurface::report_error`
    Reported,
}

type CommandFn<B> = Box<dyn FnOnce(&mut PanelContext<B>, &mut dyn ControlSurface) -> CommandOutcome>;

/// A user action waiting for the next drain phase
pub struct DeferredCommand<B> {
    label: &'static str,
    run: CommandFn<B>,
}

impl<B: 'static> DeferredCommand<B> {
    /// Wrap a raw callable; the callable decides how failures are handled
    pub fn new<F>(label: &'static str, run: F) -> Self
    where
        F: FnOnce(&mut PanelContext<B>, &mut dyn ControlSurface) -> CommandOutcome + 'static,
    {
        Self {
            label,
            run: Box::new(run),
        }
    }

    /// Wrap a fallible handler in the report adapter
    ///
    /// An error is logged and reported to the surface, never propagated.
    pub fn reporting<F>(label: &'static str, handler: F) -> Self
    where
        F: FnOnce(&mut PanelContext<B>, &mut dyn ControlSurface) -> Result<()> + 'static,
    {
        Self::new(label, move |ctx, surface| match handler(ctx, surface) {
            Ok(()) => CommandOutcome::Completed,
            Err(e) => {
                warn!(command = label, error = %e, kind = ?e.kind(), "Command failed");
                surface.report_error(&e);
                CommandOutcome::Reported
            }
        })
    }
}

impl<B> DeferredCommand<B> {
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run the command to completion, consuming it
    pub fn invoke(self, ctx: &mut PanelContext<B>, surface: &mut dyn ControlSurface) -> CommandOutcome {
        (self.run)(ctx, surface)
    }
}

impl<B> std::fmt::Debug for DeferredCommand<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredCommand")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// FIFO command queue, no priority and no dedup
pub struct CommandQueue<B> {
    pending: VecDeque<DeferredCommand<B>>,
}

impl<B> CommandQueue<B> {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Append to the tail
    pub fn enqueue(&mut self, command: DeferredCommand<B>) {
        self.pending.push_back(command);
    }

    /// Take every queued command in FIFO order, leaving the queue empty
    pub fn drain_all(&mut self) -> VecDeque<DeferredCommand<B>> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Labels of the queued commands, head first
    pub fn labels(&self) -> Vec<&'static str> {
        self.pending.iter().map(DeferredCommand::label).collect()
    }

    /// Drop every queued command
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<B> Default for CommandQueue<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap `handler` in the report adapter and push it onto `queue`
pub fn submit<B: 'static, F>(queue: &mut CommandQueue<B>, label: &'static str, handler: F)
where
    F: FnOnce(&mut PanelContext<B>, &mut dyn ControlSurface) -> Result<()> + 'static,
{
    queue.enqueue(DeferredCommand::reporting(label, handler));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use crate::testing::{context, Rig};
    use crate::HeadlessSurface;

    #[test]
    fn test_fifo_and_duplicates() {
        let mut queue: CommandQueue<Rig> = CommandQueue::new();
        submit(&mut queue, "start_stream", |_, _| Ok(()));
        submit(&mut queue, "start_stream", |_, _| Ok(()));
        submit(&mut queue, "stop_stream", |_, _| Ok(()));
        assert_eq!(queue.labels(), vec!["start_stream", "start_stream", "stop_stream"]);

        let drained = queue.drain_all();
        assert_eq!(drained.len(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_inspection_needs_no_static_backend() {
        fn inspect<B>(queue: &CommandQueue<B>) -> (usize, Vec<&'static str>) {
            (queue.len(), queue.labels())
        }
        let queue: CommandQueue<&str> = CommandQueue::default();
        assert_eq!(inspect(&queue), (0, Vec::new()));
    }

    #[test]
    fn test_enqueue_during_drain_is_deferred() {
        let (mut ctx, _log) = context();
        let mut surface = HeadlessSurface::new();
        submit(&mut ctx.queue, "outer", |ctx, _| {
            submit(&mut ctx.queue, "inner", |_, _| Ok(()));
            Ok(())
        });

        let drained = ctx.queue.drain_all();
        for command in drained {
            command.invoke(&mut ctx, &mut surface);
        }
        assert_eq!(ctx.queue.labels(), vec!["inner"]);
    }

    #[test]
    fn test_failure_is_reported_not_propagated() {
        let (mut ctx, _log) = context();
        let mut surface = HeadlessSurface::new();
        let command = DeferredCommand::reporting("save_images", |_, _| {
            Err(PanelError::validation("stream", "not running"))
        });
        assert_eq!(command.invoke(&mut ctx, &mut surface), CommandOutcome::Reported);
        assert_eq!(surface.reported_errors(), ["invalid stream: not running"]);
    }
}
