use chord_pad::console_display;
use chord_pad::coordinator;
use chord_pad::engine::ChordEngine;
#[cfg(feature = "gamepad")]
use chord_pad::gamepad;
use chord_pad::heartbeat::Heartbeat;
use chord_pad::note_sink::{LogSink, NoteSink, OscSink};
#[cfg(feature = "midi")]
use chord_pad::note_sink::MidiSink;
use chord_pad::session_log;
use chord_pad::simulator;
use chord_pad::tempo::{Tempo, DEFAULT_TEMPO_HZ};
use chord_pad::types::*;

use clap::{Parser, ValueEnum};
use crossbeam_channel::bounded;
use log::{error, info, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputSource {
    /// Scripted demo, no hardware
    Sim,
    /// First connected game controller (needs the `gamepad` feature)
    Gamepad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Print notes to the log
    Log,
    /// OSC over UDP
    Osc,
    /// MIDI output port (needs the `midi` feature)
    Midi,
}

#[derive(Parser)]
#[command(name = "chord-pad")]
#[command(about = "Gamepad-driven chord progression and arpeggio player")]
struct Cli {
    /// Where control input comes from
    #[arg(long, value_enum, default_value_t = InputSource::Sim)]
    input: InputSource,

    /// Where notes go
    #[arg(long, value_enum, default_value_t = OutputKind::Log)]
    output: OutputKind,

    /// OSC target address
    #[arg(long, default_value = "127.0.0.1:9000")]
    osc_target: String,

    /// MIDI output port index (see --list-midi)
    #[arg(long, default_value_t = 0)]
    midi_port: usize,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_midi: bool,

    /// Seed for random arpeggios (omit for a fresh one each run)
    #[arg(long)]
    seed: Option<u64>,

    /// Initial tempo in steps per second
    #[arg(long, default_value_t = DEFAULT_TEMPO_HZ)]
    tempo: f64,

    /// Enable console display (terminal dashboard)
    #[arg(long)]
    console: bool,

    /// Console display refresh rate (Hz)
    #[arg(long, default_value_t = 20)]
    display_hz: u32,

    /// Log engine snapshots to a JSONL session file
    #[arg(long)]
    log_data: bool,

    /// Output directory for logged sessions
    #[arg(long, default_value = "./sessions")]
    output_dir: PathBuf,

    /// Liveness file touched every step while a controller is attached
    #[arg(long)]
    heartbeat_file: Option<PathBuf>,

    /// Loop the simulator demo instead of stopping after one pass
    #[arg(long)]
    repeat: bool,

    /// Print a recorded session file and exit
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();

    if let Some(path) = &cli.dump {
        if let Err(e) = dump_session(path) {
            error!("{}", e);
            process::exit(1);
        }
        return;
    }

    if cli.list_midi {
        list_midi_ports();
        return;
    }

    info!("═══════════════════════════════════════════════");
    info!("  CHORD PAD v{}", env!("CARGO_PKG_VERSION"));
    info!("  Input:  {:?}", cli.input);
    info!("  Output: {:?}", cli.output);
    if cli.console { info!("  UI: Console dashboard"); }
    if cli.log_data { info!("  Session log: {:?}", cli.output_dir); }
    info!("═══════════════════════════════════════════════");

    let sink = match open_sink(&cli) {
        Ok(s) => s,
        Err(e) => {
            error!("Note output unavailable: {}", e);
            process::exit(1);
        }
    };

    // Channel: input source → coordinator
    let (input_tx, input_rx) = bounded::<InputEvent>(1024);

    // Channels: coordinator → observers
    let mut snapshot_txs = Vec::new();
    let mut handles = Vec::new();

    // ─── Console display ────────────────────────────────────────────
    if cli.console {
        let (tx, rx) = bounded::<EngineSnapshot>(64);
        snapshot_txs.push(tx);
        let hz = cli.display_hz;
        spawn(&mut handles, "display", move || {
            console_display::ConsoleDisplay::new(rx, hz).run();
        });
    }

    // ─── Session logger ─────────────────────────────────────────────
    if cli.log_data {
        let (tx, rx) = bounded::<EngineSnapshot>(1024);
        match session_log::SessionLogger::new(rx, &cli.output_dir) {
            Ok(logger) => {
                snapshot_txs.push(tx);
                spawn(&mut handles, "logger", move || logger.run());
            }
            Err(e) => warn!("Session logging disabled: {}", e),
        }
    }

    // ─── Input source ───────────────────────────────────────────────
    // Input threads are not joined; they notice the hang-up on their next send
    let mut inputs = Vec::new();
    match cli.input {
        InputSource::Sim => start_simulator(&mut inputs, input_tx, cli.repeat),
        InputSource::Gamepad => {
            #[cfg(feature = "gamepad")]
            {
                // gilrs is created on its own thread; dropping the sender on
                // failure ends the coordinator
                spawn(&mut inputs, "gamepad", move || {
                    match gamepad::GamepadInput::new(input_tx) {
                        Ok(mut pad) => pad.run(),
                        Err(e) => error!("{}", e),
                    }
                });
            }
            #[cfg(not(feature = "gamepad"))]
            {
                error!("Gamepad input requires the 'gamepad' feature. Falling back to simulator.");
                start_simulator(&mut inputs, input_tx, cli.repeat);
            }
        }
    }

    // ─── Coordinator (main thread) ──────────────────────────────────
    let engine = match cli.seed {
        Some(seed) => ChordEngine::new(seed),
        None => ChordEngine::unseeded(),
    }
    .with_tempo(Tempo::new(cli.tempo));

    let mut coord = coordinator::Coordinator::new(input_rx, snapshot_txs, engine, sink);
    if let Some(path) = cli.heartbeat_file.clone() {
        coord = coord.with_heartbeat(Heartbeat::new(path));
    }
    coord.run();

    // Dropping the coordinator closes the snapshot channels so observers finish
    drop(coord);
    for h in handles {
        let _ = h.join();
    }
}

fn spawn<F>(handles: &mut Vec<thread::JoinHandle<()>>, name: &str, body: F)
where
    F: FnOnce() + Send + 'static,
{
    match thread::Builder::new().name(name.into()).spawn(body) {
        Ok(h) => handles.push(h),
        Err(e) => {
            error!("Failed to start {} thread: {}", name, e);
            process::exit(1);
        }
    }
}

fn start_simulator(
    handles: &mut Vec<thread::JoinHandle<()>>,
    tx: crossbeam_channel::Sender<InputEvent>,
    repeat: bool,
) {
    info!("Starting simulator...");
    spawn(handles, "simulator", move || {
        simulator::Simulator::new(tx).with_repeat(repeat).run();
    });
}

fn open_sink(cli: &Cli) -> Result<Box<dyn NoteSink>, String> {
    match cli.output {
        OutputKind::Log => Ok(Box::new(LogSink)),
        OutputKind::Osc => OscSink::new(cli.osc_target.clone())
            .map(|s| Box::new(s) as Box<dyn NoteSink>)
            .map_err(|e| e.to_string()),
        OutputKind::Midi => {
            #[cfg(feature = "midi")]
            {
                MidiSink::connect(cli.midi_port)
                    .map(|s| Box::new(s) as Box<dyn NoteSink>)
                    .map_err(|e| e.to_string())
            }
            #[cfg(not(feature = "midi"))]
            {
                Err(format!(
                    "MIDI port {} requested but built without the 'midi' feature",
                    cli.midi_port
                ))
            }
        }
    }
}

fn list_midi_ports() {
    #[cfg(feature = "midi")]
    {
        let ports = MidiSink::available_ports();
        if ports.is_empty() {
            println!("No MIDI output ports");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("[{}] {}", i, name);
        }
    }
    #[cfg(not(feature = "midi"))]
    println!("Built without the 'midi' feature");
}

fn dump_session(path: &Path) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("open {:?}: {}", path, e))?;
    let mut reader = session_log::SessionReader::open(BufReader::new(file))?;
    println!("{} v{}", reader.header.format, reader.header.version);
    let mut n = 0;
    while let Some(result) = reader.next_snapshot() {
        match result {
            Ok(s) => {
                n += 1;
                println!("{:>5}  {}", n, s);
            }
            Err(e) => warn!("{}", e),
        }
    }
    Ok(())
}
