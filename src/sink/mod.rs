//! Scroll sink
//!
//! The narrow command interface to the host application: one call per
//! scroll unit, plus a status line set at session start and cleared at
//! the end.

mod dry_run;
mod sioyek;

use std::future::Future;

use crate::error::SinkResult;
use crate::scroll::ScrollDirection;

pub use dry_run::DryRunSink;
pub use sioyek::SioyekSink;

/// Commands the session sends to the host application.
///
/// Each call completes only when the host has accepted the command. Errors
/// are never retried by callers.
pub trait ScrollSink: Send + Sync + 'static {
    /// Scroll one unit towards the end of the document
    fn scroll_forward(&self) -> impl Future<Output = SinkResult<()>> + Send;

    /// Scroll one unit towards the start of the document
    fn scroll_backward(&self) -> impl Future<Output = SinkResult<()>> + Send;

    fn set_status(&self, text: &str) -> impl Future<Output = SinkResult<()>> + Send;

    fn clear_status(&self) -> impl Future<Output = SinkResult<()>> + Send;

    /// Dispatch one accumulated scroll unit
    fn scroll(&self, direction: ScrollDirection) -> impl Future<Output = SinkResult<()>> + Send {
        async move {
            match direction {
                ScrollDirection::Forward => self.scroll_forward().await,
                ScrollDirection::Backward => self.scroll_backward().await,
            }
        }
    }
}
