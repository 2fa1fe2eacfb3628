//! Pointer and button input.
//!
//! Backends deliver button transitions over a channel and publish the live
//! pointer position through a [`SharedPointer`]. The gesture listener
//! consumes the channel; the control loop reads the pointer.

#[cfg(target_os = "linux")]
mod linux;

use std::sync::{Arc, Mutex};

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::InputError;

/// A position in the backend's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mouse button that can start a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Button::Left => write!(f, "left"),
            Button::Right => write!(f, "right"),
            Button::Middle => write!(f, "middle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Pressed,
    Released,
}

/// A button transition with the pointer position at the time it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub button: Button,
    pub kind: GestureKind,
    pub position: Point,
}

impl GestureEvent {
    pub fn pressed(button: Button, position: Point) -> Self {
        Self { button, kind: GestureKind::Pressed, position }
    }

    pub fn released(button: Button, position: Point) -> Self {
        Self { button, kind: GestureKind::Released, position }
    }
}

/// Live pointer position, callable from the control loop at tick rate.
pub trait PointerSource: Send + Sync {
    fn current_position(&self) -> Point;
}

/// Pointer position shared between an input backend (writer) and the
/// control loop (reader).
#[derive(Debug, Default)]
pub struct SharedPointer {
    position: Mutex<Point>,
}

impl SharedPointer {
    /// Move by a relative amount and return the new position.
    pub fn translate(&self, dx: f64, dy: f64) -> Point {
        match self.position.lock() {
            Ok(mut guard) => {
                guard.x += dx;
                guard.y += dy;
                *guard
            }
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
impl SharedPointer {
    pub fn new(position: Point) -> Self {
        Self { position: Mutex::new(position) }
    }

    pub fn set(&self, position: Point) {
        if let Ok(mut guard) = self.position.lock() {
            *guard = position;
        }
    }
}

impl PointerSource for SharedPointer {
    fn current_position(&self) -> Point {
        match self.position.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// A running input backend: live pointer plus the button event stream.
pub struct InputHandle {
    pub pointer: Arc<SharedPointer>,
    pub events: mpsc::UnboundedReceiver<GestureEvent>,
}

/// Open the platform input backend, watching `button`.
#[cfg(target_os = "linux")]
pub fn open(button: Button) -> Result<InputHandle, InputError> {
    linux::open(button)
}

/// Open the platform input backend, watching `button`.
#[cfg(not(target_os = "linux"))]
pub fn open(_button: Button) -> Result<InputHandle, InputError> {
    Err(InputError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_pointer_translate() {
        let pointer = SharedPointer::new(Point::new(10.0, 500.0));
        assert_eq!(pointer.translate(2.0, 40.0), Point::new(12.0, 540.0));
        assert_eq!(pointer.current_position(), Point::new(12.0, 540.0));

        pointer.set(Point::new(0.0, 0.0));
        assert_eq!(pointer.current_position(), Point::default());
    }

    #[test]
    fn test_button_from_config_name() {
        #[derive(Deserialize)]
        struct Wrapper {
            button: Button,
        }

        let parsed: Wrapper = toml::from_str("button = \"middle\"").unwrap();
        assert_eq!(parsed.button, Button::Middle);
        assert_eq!(parsed.button.to_string(), "middle");
    }
}
