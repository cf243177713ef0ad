use crate::pitch::midi_note_name;
use crate::tempo::{MAX_TEMPO_HZ, MIN_TEMPO_HZ};
use crate::types::*;
use crossbeam_channel::Receiver;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

const INNER: usize = 58;

/// Renders a live ASCII dashboard of the engine state.
pub struct ConsoleDisplay {
    rx: Receiver<EngineSnapshot>,
    update_hz: u32,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<EngineSnapshot>, update_hz: u32) -> Self {
        Self { rx, update_hz }
    }

    /// Blocks until the coordinator drops its sender. Bursts of snapshots
    /// collapse into one redraw.
    pub fn run(&self) {
        let min_interval = if self.update_hz == 0 {
            Duration::from_millis(50)
        } else {
            Duration::from_millis((1000 / self.update_hz as u64).max(1))
        };
        let mut stdout = io::stdout();

        while let Ok(first) = self.rx.recv() {
            let snapshot = self.rx.try_iter().last().unwrap_or(first);

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H");
            print!("{}", render(&snapshot));
            let _ = stdout.flush();

            thread::sleep(min_interval);
        }
    }
}

/// One full frame of the dashboard.
pub fn render(s: &EngineSnapshot) -> String {
    let mut out = String::new();
    let rule = "═".repeat(INNER);

    let _ = writeln!(out, "╔{}╗", rule);
    line(&mut out, "  CHORD PAD  Live Monitor");
    let _ = writeln!(out, "╠{}╣", rule);

    line(&mut out, "");
    line(&mut out, &format!("  Key:    {}", s.key));
    line(&mut out, &format!("  Chord:  {}", s.chord));
    line(
        &mut out,
        &format!(
            "  Tones:  {:<8} Arp: {:?}",
            match s.tone_count {
                ToneCount::Triad => "triad",
                ToneCount::Seventh => "seventh",
            },
            s.arp_style
        ),
    );
    line(&mut out, &format!("  Sus:    {:<8} Slide: {:?}", format!("{:?}", s.sus), s.slide));

    line(&mut out, "");
    let t = ((s.tempo_hz - MIN_TEMPO_HZ) / (MAX_TEMPO_HZ - MIN_TEMPO_HZ)) as f32;
    line(
        &mut out,
        &format!("  Tempo:  {} {:.2} Hz", make_bar(t, 30), s.tempo_hz),
    );
    line(
        &mut out,
        &format!(
            "  Window: {} .. {}",
            midi_note_name(clamp_note(s.window_low)),
            midi_note_name(clamp_note(s.window_high))
        ),
    );
    line(
        &mut out,
        &format!("  State:  {}", if s.playing { "playing" } else { "paused" }),
    );

    line(&mut out, "");
    line(&mut out, "  Sequence:");
    for row in s.midi_sequence.chunks(8) {
        let names: Vec<String> = row
            .iter()
            .map(|&n| format!("{:>4}", midi_note_name(clamp_note(n))))
            .collect();
        line(&mut out, &format!("   {}", names.join(" ")));
    }

    let _ = writeln!(out, "╚{}╝", rule);
    out
}

fn line(out: &mut String, text: &str) {
    // Pad by char count; the box glyphs are multi-byte
    let body: String = text.chars().take(INNER).collect();
    let pad = INNER - body.chars().count();
    let _ = writeln!(out, "║{}{}║", body, " ".repeat(pad));
}

fn clamp_note(n: i32) -> u8 {
    n.clamp(0, 127) as u8
}

fn make_bar(val: f32, width: usize) -> String {
    let filled = (val.clamp(0.0, 1.0) * width as f32).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
