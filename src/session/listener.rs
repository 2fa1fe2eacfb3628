//! Gesture listener
//!
//! Dispatches button transitions in arrival order: a press anchors the
//! gesture and starts the control loop, a release stops it. Depending on the
//! release policy the listener either ends with the first gesture or keeps
//! waiting for the next press until it is stopped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::context::SessionContext;
use super::control::{ControlLoop, LoopExit, LoopHandle};
use crate::config::{LoopSettings, ReleasePolicy};
use crate::error::{Result, SinkResult};
use crate::input::{Button, GestureEvent, GestureKind, Point, PointerSource};
use crate::log;
use crate::sink::ScrollSink;

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// Single-shot gesture finished
    Released,
    /// `stop()` was requested (watchdog, signal)
    Stopped,
    /// The input backend went away
    InputClosed,
}

pub struct GestureListener<S, P> {
    sink: Arc<S>,
    pointer: Arc<P>,
    context: Arc<SessionContext>,
    settings: LoopSettings,
    button: Button,
    release: ReleasePolicy,
    worker: Option<LoopHandle>,
}

impl<S, P> GestureListener<S, P>
where
    S: ScrollSink,
    P: PointerSource + 'static,
{
    pub fn new(
        sink: Arc<S>,
        pointer: Arc<P>,
        context: Arc<SessionContext>,
        settings: LoopSettings,
        button: Button,
        release: ReleasePolicy,
    ) -> Self {
        Self {
            sink,
            pointer,
            context,
            settings,
            button,
            release,
            worker: None,
        }
    }

    /// Process events until released (single-shot), stopped or disconnected.
    ///
    /// The control loop is always joined before this returns. A sink error in
    /// the loop ends the listener with that error.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<GestureEvent>,
        stop: CancellationToken,
    ) -> Result<ListenerExit> {
        let outcome = self.dispatch(&mut events, &stop).await;
        let joined = self.shutdown().await;
        let exit = outcome?;
        joined?;
        log::log_event(&format!("listener ended: {:?}", exit));
        Ok(exit)
    }

    async fn dispatch(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<GestureEvent>,
        stop: &CancellationToken,
    ) -> Result<ListenerExit> {
        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => return Ok(ListenerExit::Stopped),

                finished = join_worker(&mut self.worker) => {
                    let exit = finished??;
                    log::log_event(&format!("scroll loop finished on its own: {:?}", exit));
                }

                event = events.recv() => {
                    let Some(event) = event else {
                        return Ok(ListenerExit::InputClosed);
                    };
                    if event.button != self.button {
                        continue;
                    }
                    match event.kind {
                        GestureKind::Pressed => self.on_press(event.position).await?,
                        GestureKind::Released => {
                            self.on_release();
                            if self.release == ReleasePolicy::SingleShot {
                                return Ok(ListenerExit::Released);
                            }
                        }
                    }
                }
            }
        }
    }

    async fn on_press(&mut self, position: Point) -> Result<()> {
        log::log_event(&format!("press at ({:.0}, {:.0})", position.x, position.y));

        if let Some(worker) = &self.worker {
            if !worker.is_finished() && !self.context.run_control().is_set() {
                // Already scrolling; re-anchor the running loop.
                self.context.begin_hold(position);
                return Ok(());
            }
        }

        // A previous loop that is winding down must be gone before a new one starts.
        if let Some(worker) = self.worker.take() {
            let exit = worker.await??;
            log::log_event(&format!("previous scroll loop reaped: {:?}", exit));
        }

        self.context.begin_hold(position);
        self.context.run_control().clear();
        self.worker = Some(
            ControlLoop::new(
                Arc::clone(&self.sink),
                Arc::clone(&self.pointer),
                Arc::clone(&self.context),
                self.settings,
            )
            .spawn(),
        );
        Ok(())
    }

    fn on_release(&mut self) {
        log::log_event("release");
        self.context.run_control().set();
        self.context.end_hold();
    }

    /// Stop and join the control loop, if any.
    async fn shutdown(&mut self) -> Result<()> {
        self.context.run_control().set();
        if let Some(worker) = self.worker.take() {
            worker.await??;
        }
        Ok(())
    }
}

/// Resolves when the current control loop ends; pending while there is none.
async fn join_worker(
    worker: &mut Option<LoopHandle>,
) -> std::result::Result<SinkResult<LoopExit>, JoinError> {
    match worker.as_mut() {
        Some(handle) => {
            let result = handle.await;
            *worker = None;
            result
        }
        None => std::future::pending().await,
    }
}
