//! JSONL session files: one header line, then one engine snapshot per line.
//!
//! The logger writes them from the snapshot fan-out; the reader parses them
//! back for `--dump` and for tests. The reader works with any `BufRead`.

use crate::types::EngineSnapshot;
use crossbeam_channel::Receiver;
use log::{error, info};
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SESSION_FORMAT: &str = "chord-pad";
pub const SESSION_VERSION: u64 = 1;

// ─── Writing ────────────────────────────────────────────────────────────────

pub struct SessionLogger {
    rx: Receiver<EngineSnapshot>,
    path: PathBuf,
}

impl SessionLogger {
    /// Picks `session_<unix secs>.jsonl` under `output_dir`, creating the
    /// directory if needed.
    pub fn new(rx: Receiver<EngineSnapshot>, output_dir: &Path) -> Result<Self, String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("system clock: {}", e))?
            .as_secs();
        fs::create_dir_all(output_dir)
            .map_err(|e| format!("create {:?}: {}", output_dir, e))?;
        let path = output_dir.join(format!("session_{}.jsonl", timestamp));
        Ok(Self { rx, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the logger. Blocks the calling thread until the coordinator hangs up.
    pub fn run(&self) {
        info!("Session log → {:?}", self.path);

        let file = match File::create(&self.path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to create session log {:?}: {}", self.path, e);
                return;
            }
        };
        let mut writer = BufWriter::new(file);

        if let Err(e) = writeln!(writer, "{}", header_line()) {
            error!("Failed to write session header: {}", e);
            return;
        }

        let mut count: u64 = 0;
        for snapshot in self.rx.iter() {
            let line = match serde_json::to_string(&snapshot) {
                Ok(l) => l,
                Err(e) => {
                    error!("Failed to encode snapshot: {}", e);
                    continue;
                }
            };
            if let Err(e) = writeln!(writer, "{}", line) {
                error!("Session log write failed: {}", e);
                break;
            }
            count += 1;
            // Snapshots are sparse; flush each so a killed process loses nothing
            let _ = writer.flush();
        }

        let _ = writer.flush();
        info!("Session saved: {} snapshots → {:?}", count, self.path);
    }
}

fn header_line() -> String {
    json!({
        "format": SESSION_FORMAT,
        "version": SESSION_VERSION,
        "crate_version": env!("CARGO_PKG_VERSION"),
    })
    .to_string()
}

// ─── Reading ────────────────────────────────────────────────────────────────

/// Parsed first line of a session file.
#[derive(Debug)]
pub struct SessionHeader {
    pub format: String,
    pub version: u64,
    pub raw: serde_json::Value,
}

/// Line-by-line session reader.
pub struct SessionReader<R: BufRead> {
    reader: R,
    pub header: SessionHeader,
    line_buf: String,
}

impl<R: BufRead> SessionReader<R> {
    /// Read and validate the header line. Fails if it is missing,
    /// unparseable, or names another format.
    pub fn open(mut reader: R) -> Result<Self, String> {
        let mut first_line = String::new();
        reader
            .read_line(&mut first_line)
            .map_err(|e| format!("read header: {}", e))?;

        let first_line = first_line.trim();
        if first_line.is_empty() {
            return Err("empty file".into());
        }

        let raw: serde_json::Value =
            serde_json::from_str(first_line).map_err(|e| format!("parse header: {}", e))?;

        let format = raw["format"]
            .as_str()
            .ok_or("missing \"format\" field")?
            .to_string();
        if format != SESSION_FORMAT {
            return Err(format!("unknown format: {}", format));
        }
        let version = raw["version"].as_u64().unwrap_or(SESSION_VERSION);
        if version > SESSION_VERSION {
            return Err(format!("unsupported version: {}", version));
        }

        Ok(Self {
            reader,
            header: SessionHeader { format, version, raw },
            line_buf: String::new(),
        })
    }

    /// Next snapshot. `None` at EOF, `Err` for an unparseable line.
    pub fn next_snapshot(&mut self) -> Option<Result<EngineSnapshot, String>> {
        loop {
            self.line_buf.clear();
            match self.reader.read_line(&mut self.line_buf) {
                Ok(0) => return None,
                Ok(_) => {
                    let trimmed = self.line_buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(
                        serde_json::from_str::<EngineSnapshot>(trimmed)
                            .map_err(|e| format!("parse snapshot: {}", e)),
                    );
                }
                Err(e) => return Some(Err(format!("read line: {}", e))),
            }
        }
    }

    /// Read all remaining snapshots, skipping malformed lines.
    pub fn read_all(mut self) -> Vec<EngineSnapshot> {
        let mut snapshots = Vec::new();
        while let Some(result) = self.next_snapshot() {
            if let Ok(s) = result {
                snapshots.push(s);
            }
        }
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChordEngine;
    use crossbeam_channel::unbounded;
    use std::io::{BufReader, Cursor};

    fn snapshot_line(degree_steps: i32) -> String {
        let mut engine = ChordEngine::new(1);
        engine.chord_by_degree(degree_steps);
        serde_json::to_string(&engine.snapshot()).unwrap()
    }

    #[test]
    fn test_open_valid_header() {
        let data = header_line() + "\n";
        let reader = SessionReader::open(Cursor::new(data)).unwrap();
        assert_eq!(reader.header.format, "chord-pad");
        assert_eq!(reader.header.version, SESSION_VERSION);
    }

    #[test]
    fn test_open_missing_format() {
        let err = SessionReader::open(Cursor::new("{\"version\":1}\n"))
            .err()
            .unwrap();
        assert!(err.contains("format"), "got: {}", err);
    }

    #[test]
    fn test_open_wrong_format() {
        let err = SessionReader::open(Cursor::new("{\"format\":\"other\"}\n"))
            .err()
            .unwrap();
        assert!(err.contains("unknown format"), "got: {}", err);
    }

    #[test]
    fn test_open_newer_version() {
        let err = SessionReader::open(Cursor::new("{\"format\":\"chord-pad\",\"version\":99}\n"))
            .err()
            .unwrap();
        assert!(err.contains("version"), "got: {}", err);
    }

    #[test]
    fn test_open_empty_file() {
        assert!(SessionReader::open(Cursor::new("")).is_err());
    }

    #[test]
    fn test_read_all_skips_malformed() {
        let mut data = header_line() + "\n";
        data += &snapshot_line(0);
        data += "\n\nthis is not json\n";
        data += &snapshot_line(1);
        data += "\n";

        let snaps = SessionReader::open(Cursor::new(data)).unwrap().read_all();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].chord, "C (I)");
        assert_eq!(snaps[1].chord, "D (ii)");
    }

    #[test]
    fn test_next_snapshot_reports_error() {
        let data = header_line() + "\ngarbage\n";
        let mut reader = SessionReader::open(Cursor::new(data)).unwrap();
        assert!(reader.next_snapshot().unwrap().is_err());
        assert!(reader.next_snapshot().is_none());
    }

    #[test]
    fn test_logger_writes_readable_session() {
        let dir = std::env::temp_dir().join(format!("chord-pad-log-{}", std::process::id()));
        let (tx, rx) = unbounded();
        let logger = SessionLogger::new(rx, &dir).unwrap();

        let mut engine = ChordEngine::new(7);
        tx.send(engine.snapshot()).unwrap();
        engine.toggle_playback();
        tx.send(engine.snapshot()).unwrap();
        drop(tx);
        logger.run();

        let file = File::open(logger.path()).unwrap();
        let snaps = SessionReader::open(BufReader::new(file)).unwrap().read_all();
        assert_eq!(snaps.len(), 2);
        assert!(snaps[0].playing);
        assert!(!snaps[1].playing);
        assert_eq!(snaps[0].midi_sequence, engine.sequence().midi);

        let _ = fs::remove_dir_all(&dir);
    }
}
