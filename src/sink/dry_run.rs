//! Sink that reports commands instead of sending them.

use super::ScrollSink;
use crate::error::SinkResult;
use crate::log;

/// Prints and logs each command; used for trying out tuning without a host.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSink;

impl DryRunSink {
    fn report(&self, line: &str) {
        println!("{}", line);
        log::log_event(line);
    }
}

impl ScrollSink for DryRunSink {
    async fn scroll_forward(&self) -> SinkResult<()> {
        self.report("↓ move_down()");
        Ok(())
    }

    async fn scroll_backward(&self) -> SinkResult<()> {
        self.report("↑ move_up()");
        Ok(())
    }

    async fn set_status(&self, text: &str) -> SinkResult<()> {
        self.report(&format!("status: {}", text));
        Ok(())
    }

    async fn clear_status(&self) -> SinkResult<()> {
        self.report("status cleared");
        Ok(())
    }
}
