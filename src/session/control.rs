//! The control loop: samples the pointer at a fixed rate and turns its
//! distance from the anchor into scroll commands.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::context::SessionContext;
use crate::config::LoopSettings;
use crate::error::SinkResult;
use crate::input::PointerSource;
use crate::log;
use crate::scroll::{StepAccumulator, scroll_rate};
use crate::sink::ScrollSink;

/// Why a control loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The stop flag was set (release, shutdown) or the anchor went away
    Stopped,
    /// The hold lasted longer than the configured ceiling
    HoldCeiling,
}

pub type LoopHandle = JoinHandle<SinkResult<LoopExit>>;

/// One activation of the scroll loop. Owns its accumulator, so every
/// activation starts from a zero remainder.
pub struct ControlLoop<S, P> {
    sink: Arc<S>,
    pointer: Arc<P>,
    context: Arc<SessionContext>,
    settings: LoopSettings,
    accumulator: StepAccumulator,
}

impl<S, P> ControlLoop<S, P>
where
    S: ScrollSink,
    P: PointerSource + 'static,
{
    pub fn new(
        sink: Arc<S>,
        pointer: Arc<P>,
        context: Arc<SessionContext>,
        settings: LoopSettings,
    ) -> Self {
        Self {
            sink,
            pointer,
            context,
            settings,
            accumulator: StepAccumulator::new(),
        }
    }

    /// Run on its own task.
    pub fn spawn(self) -> LoopHandle {
        tokio::spawn(self.run())
    }

    /// Tick until stopped. Sink errors end the loop immediately.
    pub async fn run(mut self) -> SinkResult<LoopExit> {
        let context = Arc::clone(&self.context);
        let guard = context.enter_loop();
        log::log_event(&format!("scroll loop #{} started", guard.number()));

        let exit = self.tick_until_stopped(&context).await;

        match &exit {
            Ok(reason) => log::log_event(&format!("scroll loop #{} ended: {:?}", guard.number(), reason)),
            Err(e) => log::log_error(&format!("scroll loop #{} failed: {}", guard.number(), e)),
        }
        exit
    }

    async fn tick_until_stopped(&mut self, context: &SessionContext) -> SinkResult<LoopExit> {
        // Kept after a release clears the context, so a breach that happened
        // before the release is still seen on the next tick.
        let mut hold_started = None;

        loop {
            if let Some(started) = context.hold_started() {
                hold_started = Some(started);
            }

            // Checked before the stop flag: a ceiling breach racing a release
            // is reported as a ceiling stop.
            if let (Some(limit), Some(started)) = (self.settings.max_hold, hold_started) {
                if started.elapsed() > limit {
                    context.run_control().set();
                    return Ok(LoopExit::HoldCeiling);
                }
            }

            if context.run_control().is_set() {
                return Ok(LoopExit::Stopped);
            }

            let Some(anchor) = context.anchor() else {
                return Ok(LoopExit::Stopped);
            };

            let position = self.pointer.current_position();
            let rate = scroll_rate(position.y - anchor.y, &self.settings.rate);

            for direction in self.accumulator.advance(rate, self.settings.period) {
                self.sink.scroll(direction).await?;
            }

            sleep(self.settings.period).await;
        }
    }
}
