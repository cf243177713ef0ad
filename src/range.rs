use crate::types::{AXIS_THRESHOLD, ROOT};

/// Default distance from [`ROOT`] to either edge of the window.
pub const DEFAULT_HALF_WIDTH: i32 = 16;
/// Widest half-width the horizontal axis can reach.
pub const MAX_HALF_WIDTH: i32 = 28;

/// Absolute pitch bounds, always symmetric around [`ROOT`] with `low < high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackWindow {
    half_width: i32,
}

impl PlaybackWindow {
    /// None for a collapsed (or inverted) window.
    pub fn new(half_width: i32) -> Option<Self> {
        if half_width >= 1 {
            Some(Self { half_width })
        } else {
            None
        }
    }

    pub fn half_width(&self) -> i32 {
        self.half_width
    }

    pub fn low(&self) -> i32 {
        ROOT - self.half_width
    }

    pub fn high(&self) -> i32 {
        ROOT + self.half_width
    }

    /// One-step octave correction. A pitch more than an octave outside the
    /// window is moved only once and may stay outside.
    pub fn correct(&self, pitch: i32) -> i32 {
        if pitch < self.low() {
            pitch + 12
        } else if pitch > self.high() {
            pitch - 12
        } else {
            pitch
        }
    }
}

impl Default for PlaybackWindow {
    fn default() -> Self {
        Self { half_width: DEFAULT_HALF_WIDTH }
    }
}

/// Right-stick control of the playback window.
///
/// The horizontal axis sets a base half-width (up to [`MAX_HALF_WIDTH`]);
/// the vertical axis scales that base. Only the magnitude of a deflection
/// matters, so the window can never invert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeController {
    window: PlaybackWindow,
    base_half_width: i32,
}

impl RangeController {
    pub fn new() -> Self {
        Self {
            window: PlaybackWindow::default(),
            base_half_width: DEFAULT_HALF_WIDTH,
        }
    }

    pub fn window(&self) -> PlaybackWindow {
        self.window
    }

    pub fn base_half_width(&self) -> i32 {
        self.base_half_width
    }

    /// Past the threshold, set the half-width to `MAX_HALF_WIDTH × |ratio|`
    /// and remember it as the base. Just past the threshold that is narrower
    /// than the default (14 at 0.51). Back at center, only the base returns
    /// to the default; the window itself is kept.
    pub fn horizontal(&mut self, ratio: f32) {
        let magnitude = deflection(ratio);
        if magnitude > AXIS_THRESHOLD {
            let half_width = (MAX_HALF_WIDTH as f32 * magnitude) as i32;
            self.set_window(half_width);
            self.base_half_width = self.window.half_width();
        } else {
            self.base_half_width = DEFAULT_HALF_WIDTH;
        }
    }

    /// Past the threshold, scale the base half-width by `|ratio|`. Back at
    /// center, reset to the default window regardless of the base.
    pub fn vertical(&mut self, ratio: f32) {
        let magnitude = deflection(ratio);
        if magnitude > AXIS_THRESHOLD {
            let half_width = (self.base_half_width as f32 * magnitude) as i32;
            self.set_window(half_width);
        } else {
            self.window = PlaybackWindow::default();
        }
    }

    fn set_window(&mut self, half_width: i32) {
        if let Some(window) = PlaybackWindow::new(half_width) {
            self.window = window;
        }
    }
}

/// Stick magnitude in [0, 1]; NaN reads as centered.
fn deflection(ratio: f32) -> f32 {
    if ratio.is_nan() {
        0.0
    } else {
        ratio.abs().min(1.0)
    }
}

impl Default for RangeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window() {
        let w = PlaybackWindow::default();
        assert_eq!((w.low(), w.high()), (44, 76));
    }

    #[test]
    fn test_collapsed_window_rejected() {
        assert!(PlaybackWindow::new(0).is_none());
        assert!(PlaybackWindow::new(-4).is_none());
        assert!(PlaybackWindow::new(1).is_some());
    }

    #[test]
    fn test_correction_is_single_step() {
        let w = PlaybackWindow::default();
        assert_eq!(w.correct(40), 52);
        assert_eq!(w.correct(20), 32);
        assert_eq!(w.correct(80), 68);
        assert_eq!(w.correct(100), 88);
        assert_eq!(w.correct(44), 44);
        assert_eq!(w.correct(76), 76);
    }

    #[test]
    fn test_horizontal_widens() {
        let mut r = RangeController::new();
        r.horizontal(1.0);
        assert_eq!((r.window().low(), r.window().high()), (32, 88));
        assert_eq!(r.base_half_width(), 28);

        r.horizontal(-0.75);
        assert_eq!(r.window().half_width(), 21);
    }

    #[test]
    fn test_horizontal_just_past_threshold_narrows() {
        let mut r = RangeController::new();
        r.horizontal(0.51);
        assert_eq!(r.window().half_width(), 14);
        assert_eq!(r.base_half_width(), 14);
        assert!(r.base_half_width() < DEFAULT_HALF_WIDTH);
    }

    #[test]
    fn test_horizontal_center_resets_base_only() {
        let mut r = RangeController::new();
        r.horizontal(1.0);
        r.horizontal(0.1);
        assert_eq!(r.base_half_width(), DEFAULT_HALF_WIDTH);
        assert_eq!(r.window().half_width(), 28);
    }

    #[test]
    fn test_vertical_scales_base() {
        let mut r = RangeController::new();
        r.horizontal(1.0);
        r.vertical(0.5001);
        assert_eq!(r.window().half_width(), 14);
        r.vertical(-1.0);
        assert_eq!(r.window().half_width(), 28);
    }

    #[test]
    fn test_vertical_center_resets_window() {
        let mut r = RangeController::new();
        r.horizontal(1.0);
        r.vertical(0.2);
        assert_eq!(r.window(), PlaybackWindow::default());
        // the widened base survives
        assert_eq!(r.base_half_width(), 28);
    }

    #[test]
    fn test_window_never_inverts() {
        let mut r = RangeController::new();
        for v in [-1.0, -0.9, -0.51, 0.0, 0.51, 0.9, 1.0, f32::NAN] {
            r.horizontal(v);
            assert!(r.window().low() < r.window().high());
            r.vertical(v);
            assert!(r.window().low() < r.window().high());
        }
    }
}
