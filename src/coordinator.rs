use crate::engine::ChordEngine;
use crate::heartbeat::Heartbeat;
use crate::note_sink::{NoteSink, SinkError};
use crate::tempo::PROCESSING_MARGIN;
use crate::types::*;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info, trace, warn};
use std::thread;
use std::time::Duration;

/// Consecutive Select presses that stop the player.
pub const EXIT_PRESSES: u32 = 4;
/// Pause before re-acquiring a failed note output.
pub const SINK_RETRY_WAIT: Duration = Duration::from_secs(2);

/// What the loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Exit was pressed [`EXIT_PRESSES`] times in a row.
    Exit,
    /// Every input sender is gone.
    Disconnected,
}

/// The coordinator owns the engine and runs the single playback loop:
/// play one step, then drain whatever control input arrived meanwhile.
///
/// Input handling and note emission never overlap, so a change made while
/// draining takes effect from the very next step and no step ever sees a
/// half-updated sequence.
///
/// # Modifier
///
/// `B` is not a command. Its down/up events set and clear the modifier that
/// accompanies every other button press.
pub struct Coordinator<S: NoteSink> {
    input_rx: Receiver<InputEvent>,
    snapshot_txs: Vec<Sender<EngineSnapshot>>,
    engine: ChordEngine,
    sink: S,
    heartbeat: Option<Heartbeat>,
    modifier: bool,
    device_present: bool,
    exit_presses: u32,
    step: usize,
    /// If false, skip all waits (offline rendering and tests).
    pub realtime: bool,
}

impl<S: NoteSink> Coordinator<S> {
    pub fn new(
        input_rx: Receiver<InputEvent>,
        snapshot_txs: Vec<Sender<EngineSnapshot>>,
        engine: ChordEngine,
        sink: S,
    ) -> Self {
        Self {
            input_rx,
            snapshot_txs,
            engine,
            sink,
            heartbeat: None,
            modifier: false,
            device_present: true,
            exit_presses: 0,
            step: 0,
            realtime: true,
        }
    }

    pub fn with_realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    pub fn with_heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    pub fn engine(&self) -> &ChordEngine {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn modifier(&self) -> bool {
        self.modifier
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Play until Exit fires or the input channel closes. Output failures
    /// are logged and retried; they never touch engine state. While the
    /// output is down, input is still watched for Exit and hang-up.
    pub fn run(&mut self) {
        info!("Coordinator running ({})", self.engine.snapshot());
        if let Some(hb) = self.heartbeat.as_mut() {
            if let Err(e) = hb.remove() {
                warn!("Could not clear heartbeat {:?}: {}", hb.path(), e);
            }
        }
        self.publish();

        let mut steps: u64 = 0;
        loop {
            match self.tick() {
                Ok(Flow::Continue) => {
                    steps += 1;
                    if steps % 256 == 0 {
                        debug!("Coordinator: {} steps played", steps);
                    }
                }
                Ok(Flow::Exit) => {
                    info!("Exit requested");
                    break;
                }
                Ok(Flow::Disconnected) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    warn!("Note output failed: {} (retrying in {:?})", e, SINK_RETRY_WAIT);
                    self.wait(SINK_RETRY_WAIT);
                    match self.drain_muted() {
                        Flow::Continue => {
                            if let Err(e) = self.sink.reconnect() {
                                warn!("Reconnect failed: {}", e);
                            }
                        }
                        Flow::Exit => {
                            info!("Exit requested while output down");
                            break;
                        }
                        Flow::Disconnected => {
                            info!("Input closed while output down");
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.sink.all_notes_off() {
            debug!("all-notes-off on shutdown: {}", e);
        }
        if let Some(hb) = self.heartbeat.as_mut() {
            if let Err(e) = hb.remove() {
                debug!("heartbeat remove on shutdown: {}", e);
            }
        }
        info!("Coordinator shutting down after {} steps", steps);
    }

    /// One step: play the current note, drain pending input, then leave the
    /// processing margin. On an output error nothing else happens this step.
    pub fn tick(&mut self) -> Result<Flow, SinkError> {
        self.play_step()?;

        loop {
            match self.input_rx.try_recv() {
                Ok(event) => {
                    if self.handle_event(event) {
                        return Ok(Flow::Exit);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(Flow::Disconnected),
            }
        }

        self.wait(PROCESSING_MARGIN);
        Ok(Flow::Continue)
    }

    /// Drain input while the output is failing. Only the exit counter, the
    /// modifier and device state are updated; commands that would change the
    /// music are dropped so the engine stays as it was.
    fn drain_muted(&mut self) -> Flow {
        loop {
            match self.input_rx.try_recv() {
                Ok(event) => match event {
                    InputEvent::ButtonDown(Button::Select)
                    | InputEvent::ButtonDown(Button::B)
                    | InputEvent::ButtonUp(Button::B)
                    | InputEvent::DeviceLost
                    | InputEvent::DeviceConnected => {
                        if self.handle_event(event) {
                            return Flow::Exit;
                        }
                    }
                    InputEvent::ButtonDown(button) => {
                        self.exit_presses = 0;
                        debug!("Output down, dropping {:?}", button);
                    }
                    InputEvent::ButtonUp(_) | InputEvent::Axis(_) => {}
                },
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Disconnected,
            }
        }
    }

    fn play_step(&mut self) -> Result<(), SinkError> {
        let note = self.engine.note_event(self.step);
        if self.engine.is_playing() {
            self.sink.note_on(note.pitch, NOTE_VELOCITY)?;
            self.wait(note.hold);
            self.sink.note_off(note.pitch)?;
        } else {
            self.wait(note.hold);
        }
        trace!("step {:>2}: {}", self.step, note.pitch);

        self.step = (self.step + 1) % SEQUENCE_LEN;

        // No heartbeat while the controller is away
        if !self.device_present {
            return Ok(());
        }
        let tempo_hz = self.engine.tempo().hz();
        if let Some(hb) = self.heartbeat.as_mut() {
            if let Err(e) = hb.touch(tempo_hz) {
                debug!("heartbeat touch failed: {}", e);
            }
        }
        Ok(())
    }

    /// Apply one input event. Returns true when the exit counter fires.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        // Any press other than Select breaks an exit run, B included
        if let InputEvent::ButtonDown(button) = event {
            if button != Button::Select {
                self.exit_presses = 0;
            }
        }

        match event {
            InputEvent::ButtonDown(Button::B) => {
                self.modifier = true;
                debug!("Modifier on");
            }
            InputEvent::ButtonUp(Button::B) => {
                self.modifier = false;
                debug!("Modifier off");
            }
            InputEvent::ButtonUp(_) => {}
            InputEvent::ButtonDown(button) => {
                if let Some(command) = Command::for_button(button) {
                    return self.handle_command(command);
                }
            }
            InputEvent::Axis(sample) => {
                self.engine.apply_axis(sample);
                self.publish();
            }
            InputEvent::DeviceLost => {
                warn!("Controller lost");
                self.device_present = false;
                self.modifier = false;
                if let Some(hb) = self.heartbeat.as_mut() {
                    if let Err(e) = hb.remove() {
                        debug!("heartbeat remove failed: {}", e);
                    }
                }
            }
            InputEvent::DeviceConnected => {
                info!("Controller connected");
                self.device_present = true;
            }
        }
        false
    }

    fn handle_command(&mut self, command: Command) -> bool {
        debug!("{:?}{}", command, if self.modifier { " (modified)" } else { "" });

        if command == Command::Exit {
            self.exit_presses += 1;
            info!("Exit press {}/{}", self.exit_presses, EXIT_PRESSES);
            return self.exit_presses >= EXIT_PRESSES;
        }

        self.engine.dispatch(command, self.modifier);
        self.publish();
        false
    }

    /// Fan the current state out to observers. Slow observers lose snapshots
    /// instead of stalling playback.
    fn publish(&self) {
        if self.snapshot_txs.is_empty() {
            return;
        }
        let snapshot = self.engine.snapshot();
        for tx in &self.snapshot_txs {
            let _ = tx.try_send(snapshot.clone());
        }
    }

    fn wait(&self, duration: Duration) {
        if self.realtime && !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
