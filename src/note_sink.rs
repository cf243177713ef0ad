use crate::pitch::midi_note_name;
use log::{debug, info};
use rosc::{OscMessage, OscPacket, OscType};
use std::net::UdpSocket;

/// Failure talking to the note output. Always recoverable from the
/// engine's point of view: its state is untouched and the caller retries.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OSC encode failed: {0}")]
    Encode(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("output not connected")]
    NotConnected,
}

/// Receiver of note-on / note-off pairs. Timing is the caller's job.
pub trait NoteSink {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SinkError>;

    fn note_off(&mut self, pitch: u8) -> Result<(), SinkError>;

    /// Re-acquire the underlying output after a failure.
    fn reconnect(&mut self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Silence anything still sounding, on shutdown.
    fn all_notes_off(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: NoteSink + ?Sized> NoteSink for Box<S> {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SinkError> {
        (**self).note_on(pitch, velocity)
    }

    fn note_off(&mut self, pitch: u8) -> Result<(), SinkError> {
        (**self).note_off(pitch)
    }

    fn reconnect(&mut self) -> Result<(), SinkError> {
        (**self).reconnect()
    }

    fn all_notes_off(&mut self) -> Result<(), SinkError> {
        (**self).all_notes_off()
    }
}

// ─── Log ────────────────────────────────────────────────────────────────────

/// Writes notes to the log. Handy headless and when no synth is attached.
#[derive(Debug, Default)]
pub struct LogSink;

impl NoteSink for LogSink {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SinkError> {
        info!("note on  {:>4} ({:>3}) vel {}", midi_note_name(pitch), pitch, velocity);
        Ok(())
    }

    fn note_off(&mut self, pitch: u8) -> Result<(), SinkError> {
        debug!("note off {:>4} ({:>3})", midi_note_name(pitch), pitch);
        Ok(())
    }
}

// ─── OSC ────────────────────────────────────────────────────────────────────

/// Sends notes as OSC over UDP:
///   /chord/note_on  <pitch:int> <velocity:int>
///   /chord/note_off <pitch:int>
///   /chord/all_off
pub struct OscSink {
    socket: UdpSocket,
    target: String,
}

impl OscSink {
    pub fn new(target: String) -> Result<Self, SinkError> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        info!("OSC output → {}", target);
        Ok(Self { socket, target })
    }

    fn send(&self, addr: &str, args: Vec<OscType>) -> Result<(), SinkError> {
        let msg = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        let buf = rosc::encoder::encode(&msg).map_err(|e| SinkError::Encode(e.to_string()))?;
        self.socket.send_to(&buf, &self.target)?;
        Ok(())
    }
}

impl NoteSink for OscSink {
    fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SinkError> {
        self.send(
            "/chord/note_on",
            vec![OscType::Int(pitch as i32), OscType::Int(velocity as i32)],
        )
    }

    fn note_off(&mut self, pitch: u8) -> Result<(), SinkError> {
        self.send("/chord/note_off", vec![OscType::Int(pitch as i32)])
    }

    fn reconnect(&mut self) -> Result<(), SinkError> {
        self.socket = UdpSocket::bind("0.0.0.0:0")?;
        info!("OSC output rebound → {}", self.target);
        Ok(())
    }

    fn all_notes_off(&mut self) -> Result<(), SinkError> {
        self.send("/chord/all_off", vec![])
    }
}

// ─── MIDI ───────────────────────────────────────────────────────────────────

#[cfg(feature = "midi")]
pub use midi::MidiSink;

#[cfg(feature = "midi")]
mod midi {
    use super::{NoteSink, SinkError};
    use log::info;
    use midir::{MidiOutput, MidiOutputConnection};

    const CLIENT_NAME: &str = "chord-pad";

    /// Raw MIDI note messages on channel 1 through midir.
    pub struct MidiSink {
        port_index: usize,
        connection: Option<MidiOutputConnection>,
    }

    impl MidiSink {
        pub fn available_ports() -> Vec<String> {
            match MidiOutput::new(CLIENT_NAME) {
                Ok(midi_out) => midi_out
                    .ports()
                    .iter()
                    .filter_map(|p| midi_out.port_name(p).ok())
                    .collect(),
                Err(_) => vec![],
            }
        }

        pub fn connect(port_index: usize) -> Result<Self, SinkError> {
            let mut sink = Self {
                port_index,
                connection: None,
            };
            sink.open()?;
            Ok(sink)
        }

        fn open(&mut self) -> Result<(), SinkError> {
            let midi_out = MidiOutput::new(CLIENT_NAME)
                .map_err(|e| SinkError::Midi(format!("create output: {}", e)))?;
            let ports = midi_out.ports();
            let port = ports
                .get(self.port_index)
                .ok_or_else(|| SinkError::Midi(format!("no MIDI port #{}", self.port_index)))?;
            let name = midi_out.port_name(port).unwrap_or_default();
            let connection = midi_out
                .connect(port, CLIENT_NAME)
                .map_err(|e| SinkError::Midi(format!("connect: {}", e)))?;
            info!("MIDI output → [{}] {}", self.port_index, name);
            self.connection = Some(connection);
            Ok(())
        }

        fn send(&mut self, message: &[u8]) -> Result<(), SinkError> {
            let conn = self.connection.as_mut().ok_or(SinkError::NotConnected)?;
            conn.send(message)
                .map_err(|e| SinkError::Midi(format!("send: {}", e)))
        }
    }

    impl NoteSink for MidiSink {
        fn note_on(&mut self, pitch: u8, velocity: u8) -> Result<(), SinkError> {
            self.send(&[0x90, pitch & 0x7F, velocity & 0x7F])
        }

        fn note_off(&mut self, pitch: u8) -> Result<(), SinkError> {
            self.send(&[0x80, pitch & 0x7F, 0])
        }

        fn reconnect(&mut self) -> Result<(), SinkError> {
            self.connection = None;
            self.open()
        }

        fn all_notes_off(&mut self) -> Result<(), SinkError> {
            // CC 123: All Notes Off
            self.send(&[0xB0, 123, 0])
        }
    }
}
