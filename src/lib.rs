pub mod arpeggio;
pub mod chord_table;
pub mod compiler;
pub mod console_display;
pub mod coordinator;
pub mod engine;
pub mod heartbeat;
pub mod modulation;
pub mod note_sink;
pub mod pitch;
pub mod progression;
pub mod range;
pub mod session_log;
pub mod simulator;
pub mod tempo;
pub mod types;

#[cfg(feature = "gamepad")]
pub mod gamepad;
