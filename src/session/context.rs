//! State shared between the gesture listener, the control loop and the watchdog.
//!
//! Each field has a single writer category: press/release handling writes the
//! anchor, gesture state and timestamps; the stop flag may be set by anyone
//! that wants the control loop to end. Fields are independent, so no update
//! spans more than one lock.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::input::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Holding,
}

/// Cooperative stop flag for the control loop.
///
/// Setting is idempotent. It is only cleared when a fresh gesture starts.
#[derive(Debug, Default)]
pub struct RunControl {
    stop: AtomicBool,
}

impl RunControl {
    pub fn set(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Session context owned by the orchestrator and shared by reference.
#[derive(Debug)]
pub struct SessionContext {
    launched_at: Instant,
    anchor: Mutex<Option<Point>>,
    state: Mutex<GestureState>,
    hold_started: Mutex<Option<Instant>>,
    last_activity: Mutex<Instant>,
    gesture_seen: AtomicBool,
    run_control: RunControl,
    active_loops: AtomicUsize,
    loops_started: AtomicUsize,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            launched_at: now,
            anchor: Mutex::new(None),
            state: Mutex::new(GestureState::Idle),
            hold_started: Mutex::new(None),
            last_activity: Mutex::new(now),
            gesture_seen: AtomicBool::new(false),
            run_control: RunControl::default(),
            active_loops: AtomicUsize::new(0),
            loops_started: AtomicUsize::new(0),
        }
    }

    /// Record a press: anchor, hold start and activity time.
    pub fn begin_hold(&self, anchor: Point) {
        let now = Instant::now();
        *lock(&self.anchor) = Some(anchor);
        *lock(&self.hold_started) = Some(now);
        *lock(&self.state) = GestureState::Holding;
        *lock(&self.last_activity) = now;
        self.gesture_seen.store(true, Ordering::SeqCst);
    }

    /// Record a release. The anchor is dropped with the gesture.
    pub fn end_hold(&self) {
        *lock(&self.state) = GestureState::Idle;
        *lock(&self.hold_started) = None;
        *lock(&self.anchor) = None;
        *lock(&self.last_activity) = Instant::now();
    }

    pub fn state(&self) -> GestureState {
        *lock(&self.state)
    }

    pub fn anchor(&self) -> Option<Point> {
        *lock(&self.anchor)
    }

    /// When the current hold started, if a button is held.
    pub fn hold_started(&self) -> Option<Instant> {
        *lock(&self.hold_started)
    }

    /// Time since the last press/release, or `None` while holding.
    pub fn idle_for(&self) -> Option<Duration> {
        if self.state() == GestureState::Holding {
            return None;
        }
        Some(lock(&self.last_activity).elapsed())
    }

    pub fn since_launch(&self) -> Duration {
        self.launched_at.elapsed()
    }

    /// Whether any gesture has started during this session.
    pub fn gesture_seen(&self) -> bool {
        self.gesture_seen.load(Ordering::SeqCst)
    }

    pub fn run_control(&self) -> &RunControl {
        &self.run_control
    }

    /// Mark a control loop as running until the guard is dropped.
    pub fn enter_loop(&self) -> LoopGuard<'_> {
        self.active_loops.fetch_add(1, Ordering::SeqCst);
        let number = self.loops_started.fetch_add(1, Ordering::SeqCst) + 1;
        LoopGuard { context: self, number }
    }

    /// Control loops currently running.
    pub fn active_loops(&self) -> usize {
        self.active_loops.load(Ordering::SeqCst)
    }

    /// Control loops started over the session.
    #[cfg(test)]
    pub fn loops_started(&self) -> usize {
        self.loops_started.load(Ordering::SeqCst)
    }
}

/// Held by a running control loop.
pub struct LoopGuard<'a> {
    context: &'a SessionContext,
    number: usize,
}

impl LoopGuard<'_> {
    /// 1-based activation number within the session
    pub fn number(&self) -> usize {
        self.number
    }
}

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        self.context.active_loops.fetch_sub(1, Ordering::SeqCst);
    }
}
