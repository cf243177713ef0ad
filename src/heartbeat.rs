//! Liveness file for an external watchdog.
//!
//! While the player runs, the file's mtime is bumped every step. If someone
//! removes the file, it is recreated about once a minute rather than on every
//! step. The file is deleted on startup, shutdown, and whenever the input
//! device is lost, so its presence means "playing with a controller attached".

use log::debug;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct Heartbeat {
    path: PathBuf,
    missing_ticks: u64,
}

impl Heartbeat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            missing_ticks: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Call once per sequence step. `tempo_hz` is steps per second and sets
    /// how many steps make up the one-minute recreate interval.
    pub fn touch(&mut self, tempo_hz: f64) -> io::Result<()> {
        if self.path.exists() {
            let file = File::options().append(true).open(&self.path)?;
            file.set_modified(SystemTime::now())?;
            return Ok(());
        }

        if self.missing_ticks == 0 {
            debug!("Creating heartbeat file {:?}", self.path);
            File::create(&self.path)?;
        }
        self.missing_ticks += 1;
        if self.missing_ticks > (tempo_hz * 60.0) as u64 {
            self.missing_ticks = 0;
        }
        Ok(())
    }

    pub fn remove(&mut self) -> io::Result<()> {
        self.missing_ticks = 0;
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
