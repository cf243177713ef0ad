//! Live controller input through gilrs.
//!
//! Pad events are classified into [`InputEvent`]s and pushed into the
//! coordinator's channel. When no controller is attached the source tells
//! the coordinator, then re-polls every [`RECONNECT_WAIT`] until one shows up.

use crate::types::*;
use crossbeam_channel::Sender;
use gilrs::{Axis, EventType, Gilrs};
use log::{debug, info, warn};
use std::thread;
use std::time::Duration;

/// Pause between looks for a controller while none is attached.
pub const RECONNECT_WAIT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("gamepad backend unavailable: {0}")]
    Backend(String),
}

pub struct GamepadInput {
    tx: Sender<InputEvent>,
    gilrs: Gilrs,
    /// Last direction reported per d-pad axis, for pads that send the
    /// d-pad as an axis instead of buttons.
    dpad: [Option<Button>; 2],
}

impl GamepadInput {
    pub fn new(tx: Sender<InputEvent>) -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Backend(e.to_string()))?;
        Ok(Self {
            tx,
            gilrs,
            dpad: [None; 2],
        })
    }

    /// Blocks the calling thread until the coordinator hangs up.
    pub fn run(&mut self) {
        info!("Gamepad input starting");
        loop {
            if !self.wait_for_pad() {
                return;
            }
            if !self.pump() {
                return;
            }
        }
    }

    /// Returns false if the coordinator is gone.
    fn wait_for_pad(&mut self) -> bool {
        let mut announced = false;
        loop {
            // Drain pending events so gilrs notices hot-plugs
            while self.gilrs.next_event().is_some() {}

            if let Some((id, pad)) = self.gilrs.gamepads().find(|(_, p)| p.is_connected()) {
                info!("Gamepad {} connected: {}", id, pad.name());
                return self.tx.send(InputEvent::DeviceConnected).is_ok();
            }
            if !announced {
                warn!("No gamepad found; retrying every {:?}", RECONNECT_WAIT);
                if self.tx.send(InputEvent::DeviceLost).is_err() {
                    return false;
                }
                announced = true;
            }
            thread::sleep(RECONNECT_WAIT);
        }
    }

    /// Forward events until the pad disconnects (true) or the coordinator
    /// hangs up (false).
    fn pump(&mut self) -> bool {
        loop {
            while let Some(event) = self.gilrs.next_event() {
                if let EventType::Disconnected = event.event {
                    warn!("Gamepad {} disconnected", event.id);
                    self.dpad = [None; 2];
                    return true;
                }
                for input in self.translate(event.event) {
                    debug!("pad: {:?}", input);
                    if self.tx.send(input).is_err() {
                        return false;
                    }
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn translate(&mut self, event: EventType) -> Vec<InputEvent> {
        match event {
            EventType::ButtonPressed(b, _) => map_button(b)
                .map(InputEvent::ButtonDown)
                .into_iter()
                .collect(),
            EventType::ButtonReleased(b, _) => map_button(b)
                .map(InputEvent::ButtonUp)
                .into_iter()
                .collect(),
            EventType::AxisChanged(Axis::DPadX, v, _) => {
                let dir = dpad_direction(v, Button::Left, Button::Right);
                transition(&mut self.dpad[0], dir)
            }
            EventType::AxisChanged(Axis::DPadY, v, _) => {
                let dir = dpad_direction(v, Button::Down, Button::Up);
                transition(&mut self.dpad[1], dir)
            }
            EventType::AxisChanged(axis, value, _) => map_axis(axis)
                .map(|channel| InputEvent::Axis(AxisSample { channel, value }))
                .into_iter()
                .collect(),
            _ => vec![],
        }
    }
}

/// Pad button → control button. Xbox face layout: South=A, East=B,
/// West=X, North=Y.
pub fn map_button(button: gilrs::Button) -> Option<Button> {
    use gilrs::Button as G;
    let b = match button {
        G::South => Button::A,
        G::East => Button::B,
        G::West => Button::X,
        G::North => Button::Y,
        G::LeftTrigger => Button::L1,
        G::RightTrigger => Button::R1,
        G::LeftTrigger2 => Button::L2,
        G::RightTrigger2 => Button::R2,
        G::Select => Button::Select,
        G::Start => Button::Start,
        G::DPadUp => Button::Up,
        G::DPadDown => Button::Down,
        G::DPadLeft => Button::Left,
        G::DPadRight => Button::Right,
        _ => return None,
    };
    Some(b)
}

pub fn map_axis(axis: Axis) -> Option<AxisChannel> {
    match axis {
        Axis::LeftStickX => Some(AxisChannel::LeftHorizontal),
        Axis::LeftStickY => Some(AxisChannel::LeftVertical),
        Axis::RightStickX => Some(AxisChannel::RightHorizontal),
        Axis::RightStickY => Some(AxisChannel::RightVertical),
        _ => None,
    }
}

fn dpad_direction(value: f32, negative: Button, positive: Button) -> Option<Button> {
    if value > AXIS_THRESHOLD {
        Some(positive)
    } else if value < -AXIS_THRESHOLD {
        Some(negative)
    } else {
        None
    }
}

/// Turn a d-pad axis change into release/press events.
fn transition(held: &mut Option<Button>, next: Option<Button>) -> Vec<InputEvent> {
    if *held == next {
        return vec![];
    }
    let mut out = Vec::with_capacity(2);
    if let Some(prev) = held.take() {
        out.push(InputEvent::ButtonUp(prev));
    }
    if let Some(b) = next {
        out.push(InputEvent::ButtonDown(b));
    }
    *held = next;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_buttons() {
        assert_eq!(map_button(gilrs::Button::South), Some(Button::A));
        assert_eq!(map_button(gilrs::Button::East), Some(Button::B));
        assert_eq!(map_button(gilrs::Button::LeftTrigger2), Some(Button::L2));
        assert_eq!(map_button(gilrs::Button::Mode), None);
    }

    #[test]
    fn test_sticks_map_to_channels() {
        assert_eq!(map_axis(Axis::LeftStickY), Some(AxisChannel::LeftVertical));
        assert_eq!(map_axis(Axis::RightStickX), Some(AxisChannel::RightHorizontal));
        assert_eq!(map_axis(Axis::LeftZ), None);
    }

    #[test]
    fn test_dpad_axis_becomes_presses() {
        let mut held = None;
        let dir = dpad_direction(1.0, Button::Left, Button::Right);
        assert_eq!(
            transition(&mut held, dir),
            vec![InputEvent::ButtonDown(Button::Right)]
        );
        // repeat reading is not a new press
        assert!(transition(&mut held, dir).is_empty());

        let dir = dpad_direction(-1.0, Button::Left, Button::Right);
        assert_eq!(
            transition(&mut held, dir),
            vec![
                InputEvent::ButtonUp(Button::Right),
                InputEvent::ButtonDown(Button::Left),
            ]
        );

        let dir = dpad_direction(0.0, Button::Left, Button::Right);
        assert_eq!(transition(&mut held, dir), vec![InputEvent::ButtonUp(Button::Left)]);
        assert_eq!(held, None);
    }
}
