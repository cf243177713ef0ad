use std::time::Duration;

pub const MIN_TEMPO_HZ: f64 = 2.5;
pub const MAX_TEMPO_HZ: f64 = 8.0;
pub const DEFAULT_TEMPO_HZ: f64 = 3.6;
/// Relative change per tempo up/down press.
pub const TEMPO_RATE: f64 = 0.025;
/// Part of each step reserved for draining control input.
pub const PROCESSING_MARGIN: Duration = Duration::from_millis(100);

/// Playback rate in notes per second, kept within [`MIN_TEMPO_HZ`, `MAX_TEMPO_HZ`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    hz: f64,
}

impl Tempo {
    /// Out-of-range or non-finite rates are clamped (NaN falls back to the default).
    pub fn new(hz: f64) -> Self {
        let hz = if hz.is_nan() { DEFAULT_TEMPO_HZ } else { hz };
        Self { hz: hz.clamp(MIN_TEMPO_HZ, MAX_TEMPO_HZ) }
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }

    pub fn up(&mut self) {
        if self.hz < MAX_TEMPO_HZ {
            self.hz = (self.hz * (1.0 + TEMPO_RATE)).min(MAX_TEMPO_HZ);
        }
    }

    pub fn down(&mut self) {
        if self.hz > MIN_TEMPO_HZ {
            self.hz = (self.hz * (1.0 - TEMPO_RATE)).max(MIN_TEMPO_HZ);
        }
    }

    /// Full duration of one step.
    pub fn step_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.hz)
    }

    /// How long each note sounds: the step minus the input-processing margin.
    pub fn hold_duration(&self) -> Duration {
        self.step_duration().saturating_sub(PROCESSING_MARGIN)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { hz: DEFAULT_TEMPO_HZ }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert!((Tempo::default().hz() - 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_up_is_monotonic_and_bounded() {
        let mut t = Tempo::default();
        let mut prev = t.hz();
        for _ in 0..10 {
            t.up();
            assert!(t.hz() > prev);
            assert!(t.hz() <= MAX_TEMPO_HZ);
            prev = t.hz();
        }
    }

    #[test]
    fn test_up_saturates_at_max() {
        let mut t = Tempo::default();
        for _ in 0..100 {
            t.up();
        }
        assert_eq!(t.hz(), MAX_TEMPO_HZ);
        t.up();
        assert_eq!(t.hz(), MAX_TEMPO_HZ);
    }

    #[test]
    fn test_down_saturates_at_min() {
        let mut t = Tempo::default();
        for _ in 0..100 {
            t.down();
        }
        assert_eq!(t.hz(), MIN_TEMPO_HZ);
        t.down();
        assert_eq!(t.hz(), MIN_TEMPO_HZ);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(Tempo::new(100.0).hz(), MAX_TEMPO_HZ);
        assert_eq!(Tempo::new(0.0).hz(), MIN_TEMPO_HZ);
        assert!((Tempo::new(f64::NAN).hz() - DEFAULT_TEMPO_HZ).abs() < 1e-9);
    }

    #[test]
    fn test_hold_duration_leaves_margin() {
        let t = Tempo::new(4.0);
        assert_eq!(t.step_duration(), Duration::from_millis(250));
        assert_eq!(t.hold_duration(), Duration::from_millis(150));
    }
}
