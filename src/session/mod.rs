//! Scroll session orchestration.
//!
//! A session owns the shared [`SessionContext`] and the sink handle. It sets
//! the host status line, runs the gesture listener with a watchdog beside it,
//! and always joins both before returning and clearing the status line.

mod context;
mod control;
mod listener;
mod watchdog;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::Result;
use crate::input::{GestureEvent, PointerSource};
use crate::log;
use crate::sink::ScrollSink;

pub use context::SessionContext;
use listener::{GestureListener, ListenerExit};
use watchdog::{Watchdog, WatchdogExit};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The single-shot gesture was released
    Released,
    /// No gesture started before the startup timeout
    StartupTimeout,
    /// No press/release for longer than the inactivity timeout
    Inactivity,
    /// Stopped from outside (signal)
    Stopped,
    /// The input backend closed its event stream
    InputClosed,
}

pub struct Session<S, P> {
    settings: Settings,
    sink: Arc<S>,
    pointer: Arc<P>,
    context: Arc<SessionContext>,
    stop: CancellationToken,
}

impl<S, P> Session<S, P>
where
    S: ScrollSink,
    P: PointerSource + 'static,
{
    pub fn new(settings: Settings, sink: Arc<S>, pointer: Arc<P>) -> Self {
        Self {
            settings,
            sink,
            pointer,
            context: Arc::new(SessionContext::new()),
            stop: CancellationToken::new(),
        }
    }

    /// Handle that stops the listener (and so the session) when cancelled.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    #[cfg(test)]
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub async fn run(self, events: mpsc::UnboundedReceiver<GestureEvent>) -> Result<SessionEnd> {
        if let Err(e) = self.sink.set_status(&self.settings.status_text).await {
            log::log_error(&format!("Failed to set status: {}", e));
            self.clear_status().await;
            return Err(e.into());
        }

        let watchdog = Watchdog::new(
            self.settings.watchdog,
            Arc::clone(&self.context),
            self.stop.clone(),
        )
        .spawn();

        let listener = GestureListener::new(
            Arc::clone(&self.sink),
            Arc::clone(&self.pointer),
            Arc::clone(&self.context),
            self.settings.control,
            self.settings.button,
            self.settings.release,
        );
        let outcome = listener.run(events, self.stop.clone()).await;

        // releases the watchdog if it is still polling
        self.stop.cancel();
        let watchdog_exit = watchdog.await;

        self.clear_status().await;

        let end = match (outcome?, watchdog_exit?) {
            (ListenerExit::Released, _) => SessionEnd::Released,
            (ListenerExit::InputClosed, _) => SessionEnd::InputClosed,
            (ListenerExit::Stopped, WatchdogExit::StartupTimeout) => SessionEnd::StartupTimeout,
            (ListenerExit::Stopped, WatchdogExit::Inactivity) => SessionEnd::Inactivity,
            (ListenerExit::Stopped, _) => SessionEnd::Stopped,
        };
        log::log_event(&format!("session ended: {:?}", end));
        Ok(end)
    }

    /// Best effort: a failure here is logged, never returned.
    async fn clear_status(&self) {
        if let Err(e) = self.sink.clear_status().await {
            log::log_error(&format!("Failed to clear status: {}", e));
        }
    }
}
