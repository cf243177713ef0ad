use crate::arpeggio::ArpStyle;
use crate::modulation::{Slide, Sus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Reference note every sequence is built around (middle C).
pub const ROOT: i32 = 60;
/// Steps in one arpeggio cycle.
pub const SEQUENCE_LEN: usize = 16;
/// Note-on velocity for every step.
pub const NOTE_VELOCITY: u8 = 100;
/// Stick deflection beyond which an axis counts as pushed.
pub const AXIS_THRESHOLD: f32 = 0.5;

// ─── Chord size ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneCount {
    #[default]
    Triad,
    Seventh,
}

impl ToneCount {
    pub fn tones(self) -> usize {
        match self {
            ToneCount::Triad => 3,
            ToneCount::Seventh => 4,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ToneCount::Triad => ToneCount::Seventh,
            ToneCount::Seventh => ToneCount::Triad,
        }
    }
}

// ─── Controls ───────────────────────────────────────────────────────────────

/// Named pad buttons, already classified by the input source.
/// The d-pad directions arrive as buttons too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Select,
    Start,
    A,
    /// Held as the modifier; never dispatched as a command.
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Up,
    Down,
    Left,
    Right,
}

/// What a button press asks the engine to do. Each command is dispatched
/// together with the modifier state at the time of the press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Exit,
    TogglePlayback,
    ToggleToneCount,
    ChangeArpPattern,
    Tempo,
    ChordUpFourth,
    ChordDownFourth,
    ChordUpSecond,
    ChordDownSecond,
    TransposeFifthUp,
    TransposeFifthDown,
    TransposeSemitoneUp,
    TransposeSemitoneDown,
}

impl Command {
    /// Button → command mapping. `B` has no command.
    pub fn for_button(button: Button) -> Option<Command> {
        let cmd = match button {
            Button::Select => Command::Exit,
            Button::Start => Command::TogglePlayback,
            Button::A => Command::ToggleToneCount,
            Button::X => Command::ChangeArpPattern,
            Button::Y => Command::Tempo,
            Button::Up => Command::ChordUpFourth,
            Button::Down => Command::ChordDownFourth,
            Button::Right => Command::ChordUpSecond,
            Button::Left => Command::ChordDownSecond,
            Button::L1 => Command::TransposeFifthDown,
            Button::R1 => Command::TransposeFifthUp,
            Button::L2 => Command::TransposeSemitoneDown,
            Button::R2 => Command::TransposeSemitoneUp,
            Button::B => return None,
        };
        Some(cmd)
    }
}

/// Continuous control channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisChannel {
    /// Left stick X: right = sus4, left = sus2.
    LeftHorizontal,
    /// Left stick Y: up = slide up a semitone, down = slide down.
    LeftVertical,
    /// Right stick X: widen the playback window.
    RightHorizontal,
    /// Right stick Y: scale the playback window.
    RightVertical,
}

/// One axis reading in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSample {
    pub channel: AxisChannel,
    pub value: f32,
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    ButtonDown(Button),
    ButtonUp(Button),
    Axis(AxisSample),
    /// The physical controller went away; the source is waiting for it.
    DeviceLost,
    /// A controller is attached again.
    DeviceConnected,
}

/// A note for the output sink: play `pitch`, release it after `hold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub hold: Duration,
}

// ─── Engine snapshot ────────────────────────────────────────────────────────

/// Everything an observer needs to show the current musical state.
/// Produced by the coordinator after each change, consumed by the console
/// display and session logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub scale_root: u8,
    pub chord_degree: u8,
    /// e.g. "E (iii)"
    pub chord: String,
    /// e.g. "C"
    pub key: String,
    pub tone_count: ToneCount,
    pub sus: Sus,
    pub slide: Slide,
    pub arp_style: ArpStyle,
    pub tempo_hz: f64,
    pub window_low: i32,
    pub window_high: i32,
    pub midi_sequence: [i32; SEQUENCE_LEN],
    pub playing: bool,
}

impl fmt::Display for EngineSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key={:<2} chord={:<10} {:?} {:?} sus={:?} slide={:?} tempo={:.2}Hz window=[{}..{}]{}",
            self.key,
            self.chord,
            self.tone_count,
            self.arp_style,
            self.sus,
            self.slide,
            self.tempo_hz,
            self.window_low,
            self.window_high,
            if self.playing { "" } else { " (paused)" },
        )
    }
}
