use crate::types::*;
use crossbeam_channel::Sender;
use log::info;
use std::thread;
use std::time::Duration;

/// One scripted thing a player does with the pad.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Do nothing for a while.
    Wait { ms: u64 },
    /// Tap a button.
    Press(Button),
    /// Tap a button while holding B.
    PressModified(Button),
    /// Push a stick, hold it, let it spring back to center.
    Stick { channel: AxisChannel, value: f32, ms: u64 },
}

impl Gesture {
    /// Input events this gesture produces, with the pause after each one.
    pub fn events(&self) -> Vec<(InputEvent, Duration)> {
        let tap = Duration::from_millis(40);
        match self {
            Gesture::Wait { .. } => vec![],
            Gesture::Press(button) => vec![
                (InputEvent::ButtonDown(*button), tap),
                (InputEvent::ButtonUp(*button), Duration::ZERO),
            ],
            Gesture::PressModified(button) => vec![
                (InputEvent::ButtonDown(Button::B), tap),
                (InputEvent::ButtonDown(*button), tap),
                (InputEvent::ButtonUp(*button), tap),
                (InputEvent::ButtonUp(Button::B), Duration::ZERO),
            ],
            Gesture::Stick { channel, value, ms } => vec![
                (
                    InputEvent::Axis(AxisSample { channel: *channel, value: *value }),
                    Duration::from_millis(*ms),
                ),
                (
                    InputEvent::Axis(AxisSample { channel: *channel, value: 0.0 }),
                    Duration::ZERO,
                ),
            ],
        }
    }

    fn pause(&self) -> Duration {
        match self {
            Gesture::Wait { ms } => Duration::from_millis(*ms),
            _ => Duration::ZERO,
        }
    }
}

/// Plays a scripted tour of every control into the input channel, so the
/// whole pipeline runs without a gamepad.
pub struct Simulator {
    tx: Sender<InputEvent>,
    repeat: bool,
}

impl Simulator {
    pub fn new(tx: Sender<InputEvent>) -> Self {
        Self { tx, repeat: false }
    }

    /// Loop the demo forever instead of closing the channel at the end.
    pub fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Blocks the calling thread. Returns when the demo ends (the channel
    /// closes with it) or the coordinator hangs up.
    pub fn run(&self) {
        info!("Simulator starting demo sequence...");
        loop {
            for gesture in demo_sequence() {
                if !self.execute(&gesture) {
                    info!("Simulator: coordinator gone, stopping");
                    return;
                }
            }
            if !self.repeat {
                break;
            }
            info!("Simulator: demo complete, repeating");
        }
        info!("Simulator: demo complete");
    }

    fn execute(&self, gesture: &Gesture) -> bool {
        info!("  {:?}", gesture);
        for (event, after) in gesture.events() {
            if self.tx.send(event).is_err() {
                return false;
            }
            if !after.is_zero() {
                thread::sleep(after);
            }
        }
        let pause = gesture.pause();
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        true
    }
}

/// The default demo: a progression around the circle, a couple of
/// modulations, every arpeggio style, sus and slide colouring, and range
/// and tempo moves.
pub fn demo_sequence() -> Vec<Gesture> {
    use Button::*;
    use Gesture::*;

    let bar = 4000;
    vec![
        Wait { ms: bar },
        // I → IV → V → I
        Press(Up),
        Wait { ms: bar },
        Press(Right),
        Wait { ms: bar },
        Press(Up),
        Wait { ms: bar },
        // sevenths, down arpeggio
        Press(A),
        Press(X),
        Wait { ms: bar },
        // down a third to vi, up a fourth to ii
        PressModified(Left),
        Wait { ms: bar },
        Press(Up),
        Wait { ms: bar },
        // sus4 then sus2 on the ii
        Stick { channel: AxisChannel::LeftHorizontal, value: 1.0, ms: bar / 2 },
        Stick { channel: AxisChannel::LeftHorizontal, value: -1.0, ms: bar / 2 },
        // modulate up a fifth with a pivot chord
        Press(R1),
        Wait { ms: bar },
        // random arpeggio, chromatic passing chord, slide
        Press(X),
        PressModified(Up),
        Wait { ms: bar / 2 },
        Stick { channel: AxisChannel::LeftVertical, value: -1.0, ms: bar / 2 },
        PressModified(Down),
        Wait { ms: bar },
        // open the range wide, then narrow it
        Stick { channel: AxisChannel::RightHorizontal, value: 1.0, ms: bar / 2 },
        Stick { channel: AxisChannel::RightVertical, value: 0.6, ms: bar / 2 },
        // speed up, semitone lift, back to triads
        Press(Y),
        Press(Y),
        Press(Y),
        Press(R2),
        Wait { ms: bar },
        Press(A),
        Press(X),
        Wait { ms: bar },
        // back down a fifth and slow down
        Press(L1),
        PressModified(Y),
        PressModified(Y),
        Wait { ms: bar },
    ]
}
