//! Lifecycle watchdog
//!
//! Polls the session timestamps and stops the gesture listener when the
//! configured timeout is reached. It ends on its own once the listener has
//! stopped for any other reason.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::context::SessionContext;
use crate::config::WatchdogPolicy;
use crate::log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogExit {
    /// No gesture started in time; the listener was stopped
    StartupTimeout,
    /// Idle for too long; the listener was stopped
    Inactivity,
    /// A gesture started, so the startup timeout no longer applies
    Disarmed,
    /// The listener stopped first
    ListenerStopped,
}

pub struct Watchdog {
    policy: WatchdogPolicy,
    context: Arc<SessionContext>,
    listener: CancellationToken,
}

impl Watchdog {
    /// `listener` is the stop handle of the gesture listener.
    pub fn new(
        policy: WatchdogPolicy,
        context: Arc<SessionContext>,
        listener: CancellationToken,
    ) -> Self {
        Self {
            policy,
            context,
            listener,
        }
    }

    pub fn spawn(self) -> JoinHandle<WatchdogExit> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) -> WatchdogExit {
        let Some(poll) = self.policy.poll_interval() else {
            self.listener.cancelled().await;
            return WatchdogExit::ListenerStopped;
        };

        loop {
            tokio::select! {
                _ = self.listener.cancelled() => return WatchdogExit::ListenerStopped,
                _ = sleep(poll) => {}
            }

            if let Some(exit) = self.check() {
                return exit;
            }
        }
    }

    fn check(&self) -> Option<WatchdogExit> {
        match self.policy {
            WatchdogPolicy::Startup(timeout) => {
                if self.context.gesture_seen() {
                    log::log_event("startup watchdog disarmed");
                    return Some(WatchdogExit::Disarmed);
                }
                if self.context.since_launch() > timeout {
                    log::log_event(&format!("no gesture within {:?}, stopping", timeout));
                    self.listener.cancel();
                    return Some(WatchdogExit::StartupTimeout);
                }
                None
            }
            WatchdogPolicy::Inactivity(timeout) => {
                let idle = self.context.idle_for()?;
                if idle > timeout {
                    log::log_event(&format!("idle for {:?}, stopping", idle));
                    self.listener.cancel();
                    return Some(WatchdogExit::Inactivity);
                }
                None
            }
            WatchdogPolicy::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::input::Point;

    fn watchdog(policy: WatchdogPolicy) -> (Arc<SessionContext>, CancellationToken, JoinHandle<WatchdogExit>) {
        let context = Arc::new(SessionContext::new());
        let listener = CancellationToken::new();
        let handle = Watchdog::new(policy, Arc::clone(&context), listener.clone()).spawn();
        (context, listener, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_timeout_fires() {
        let (context, listener, handle) = watchdog(WatchdogPolicy::Startup(Duration::from_secs(2)));

        sleep(Duration::from_millis(1900)).await;
        assert!(!listener.is_cancelled());

        sleep(Duration::from_millis(400)).await;
        assert!(listener.is_cancelled());
        assert_eq!(handle.await.unwrap(), WatchdogExit::StartupTimeout);
        assert_eq!(context.loops_started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_disarmed_by_gesture() {
        let (context, listener, handle) = watchdog(WatchdogPolicy::Startup(Duration::from_secs(2)));

        sleep(Duration::from_millis(500)).await;
        context.begin_hold(Point::new(0.0, 0.0));
        context.end_hold();

        sleep(Duration::from_secs(10)).await;
        assert!(!listener.is_cancelled());
        assert_eq!(handle.await.unwrap(), WatchdogExit::Disarmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_fires_after_gesture() {
        let (context, listener, handle) = watchdog(WatchdogPolicy::Inactivity(Duration::from_secs(1)));

        context.begin_hold(Point::new(0.0, 0.0));
        sleep(Duration::from_secs(3)).await;
        // holding never counts as idle
        assert!(!listener.is_cancelled());

        context.end_hold();
        sleep(Duration::from_millis(900)).await;
        assert!(!listener.is_cancelled());

        sleep(Duration::from_millis(300)).await;
        assert!(listener.is_cancelled());
        assert_eq!(handle.await.unwrap(), WatchdogExit::Inactivity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_before_deadline_resets_inactivity() {
        let (context, listener, handle) = watchdog(WatchdogPolicy::Inactivity(Duration::from_secs(1)));

        context.begin_hold(Point::new(0.0, 0.0));
        context.end_hold();
        sleep(Duration::from_millis(950)).await;

        context.begin_hold(Point::new(0.0, 0.0));
        context.end_hold();
        sleep(Duration::from_millis(900)).await;
        assert!(!listener.is_cancelled());

        sleep(Duration::from_millis(300)).await;
        assert!(listener.is_cancelled());
        assert_eq!(handle.await.unwrap(), WatchdogExit::Inactivity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_fire_only_once_exceeded() {
        let timeout = Duration::from_secs(2);

        let context = Arc::new(SessionContext::new());
        let listener = CancellationToken::new();
        let startup = Watchdog::new(WatchdogPolicy::Startup(timeout), Arc::clone(&context), listener.clone());
        let inactivity = Watchdog::new(WatchdogPolicy::Inactivity(timeout), context, listener.clone());

        tokio::time::advance(timeout).await;
        assert_eq!(startup.check(), None);
        assert_eq!(inactivity.check(), None);
        assert!(!listener.is_cancelled());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(startup.check(), Some(WatchdogExit::StartupTimeout));
        assert_eq!(inactivity.check(), Some(WatchdogExit::Inactivity));
        assert!(listener.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_by_listener_stop() {
        for policy in [
            WatchdogPolicy::Startup(Duration::from_secs(30)),
            WatchdogPolicy::Inactivity(Duration::from_secs(30)),
            WatchdogPolicy::Disabled,
        ] {
            let (_context, listener, handle) = watchdog(policy);
            sleep(Duration::from_secs(1)).await;
            listener.cancel();
            assert_eq!(handle.await.unwrap(), WatchdogExit::ListenerStopped);
        }
    }
}
