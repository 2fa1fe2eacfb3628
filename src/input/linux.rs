//! Linux input backend reading `/dev/input/event*` devices.
//!
//! Relative motion from every matching device is integrated into one virtual
//! pointer. Only displacement from the anchor matters, so the origin of that
//! space is arbitrary.

use std::path::PathBuf;
use std::sync::Arc;

use evdev::{Device, InputEventKind, Key, RelativeAxisType};
use tokio::sync::mpsc;

use super::{Button, GestureEvent, InputHandle, PointerSource, SharedPointer};
use crate::error::InputError;
use crate::log;

const KEY_PRESSED: i32 = 1;
const KEY_RELEASED: i32 = 0;

fn button_key(button: Button) -> Key {
    match button {
        Button::Left => Key::BTN_LEFT,
        Button::Right => Key::BTN_RIGHT,
        Button::Middle => Key::BTN_MIDDLE,
    }
}

fn reports_drag(device: &Device, key: Key) -> bool {
    let has_button = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(key));
    let has_motion = device
        .supported_relative_axes()
        .is_some_and(|axes| axes.contains(RelativeAxisType::REL_Y));
    has_button && has_motion
}

pub fn open(button: Button) -> Result<InputHandle, InputError> {
    let key = button_key(button);
    let devices: Vec<(PathBuf, Device)> = evdev::enumerate()
        .filter(|(_, device)| reports_drag(device, key))
        .collect();

    if devices.is_empty() {
        return Err(InputError::NoDevices(button.to_string()));
    }

    let pointer = Arc::new(SharedPointer::default());
    let (tx, rx) = mpsc::unbounded_channel();

    for (path, device) in devices {
        log::log(&format!(
            "Watching {} ({})",
            path.display(),
            device.name().unwrap_or("unnamed device")
        ));

        let reader_pointer = Arc::clone(&pointer);
        let reader_tx = tx.clone();
        let reader_path = path.clone();
        std::thread::Builder::new()
            .name("autoscroll-input".to_string())
            .spawn(move || read_device(reader_path, device, button, key, reader_pointer, reader_tx))
            .map_err(|e| InputError::Device(path, e.to_string()))?;
    }

    Ok(InputHandle { pointer, events: rx })
}

/// Blocking read loop for one device. Returns once the listener has gone away.
fn read_device(
    path: PathBuf,
    mut device: Device,
    button: Button,
    key: Key,
    pointer: Arc<SharedPointer>,
    tx: mpsc::UnboundedSender<GestureEvent>,
) {
    loop {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) => {
                log::log_error(&format!("Reading {} failed: {}", path.display(), e));
                return;
            }
        };

        for event in events {
            match event.kind() {
                InputEventKind::RelAxis(axis) if axis == RelativeAxisType::REL_X => {
                    pointer.translate(f64::from(event.value()), 0.0);
                }
                InputEventKind::RelAxis(axis) if axis == RelativeAxisType::REL_Y => {
                    pointer.translate(0.0, f64::from(event.value()));
                }
                InputEventKind::Key(pressed) if pressed == key => {
                    let position = pointer.current_position();
                    let gesture = match event.value() {
                        KEY_PRESSED => GestureEvent::pressed(button, position),
                        KEY_RELEASED => GestureEvent::released(button, position),
                        // autorepeat
                        _ => continue,
                    };
                    if tx.send(gesture).is_err() {
                        return;
                    }
                }
                _ => {}
            }
        }

        if tx.is_closed() {
            return;
        }
    }
}
