mod config;
mod error;
mod input;
mod log;
mod scroll;
mod session;
mod sink;

use std::sync::Arc;

use anyhow::{Context, Result};

use config::{Config, Settings};
use error::ConfigError;
use input::InputHandle;
use session::{Session, SessionEnd};
use sink::{DryRunSink, ScrollSink, SioyekSink};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging and panic hook
    if let Ok(log_path) = log::init() {
        log::log(&format!("Log file: {}", log_path.display()));
        log::install_panic_hook();
    }

    // Single positional argument: the host application to drive
    let target = std::env::args().nth(1);

    let config = Config::load().with_env_overrides();
    let settings = config.validate().context("invalid configuration")?;

    let result = if settings.dry_run {
        let input = input::open(settings.button)?;
        run_session(DryRunSink, settings, input).await
    } else {
        let target = target.ok_or(ConfigError::MissingTarget)?;
        let sink = SioyekSink::new(&target);
        log::log(&format!("Driving {}", sink.executable().display()));
        let input = input::open(settings.button)?;
        run_session(sink, settings, input).await
    };

    match result {
        Ok(end) => {
            log::log(&format!("Exiting: {:?}", end));
            Ok(())
        }
        Err(e) => {
            log::log_error(&format!("Session aborted: {}", e));
            Err(e.into())
        }
    }
}

async fn run_session<S: ScrollSink>(
    sink: S,
    settings: Settings,
    input: InputHandle,
) -> error::Result<SessionEnd> {
    let session = Session::new(settings, Arc::new(sink), input.pointer);

    // Ctrl-C stops the listener like a watchdog would, so cleanup still runs
    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::log_event("interrupted");
            stop.cancel();
        }
    });

    session.run(input.events).await
}
