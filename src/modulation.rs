use crate::pitch::normalize;
use serde::{Deserialize, Serialize};

/// Suspension applied to the chord's third.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sus {
    #[default]
    None,
    /// Third replaced by the major second above the root.
    Sus2,
    /// Third replaced by the fourth (a whole tone under the fifth).
    Sus4,
}

/// Whole-chord chromatic shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slide {
    Down,
    #[default]
    None,
    Up,
}

impl Slide {
    pub fn semitones(self) -> i32 {
        match self {
            Slide::Down => -1,
            Slide::None => 0,
            Slide::Up => 1,
        }
    }
}

/// Temporary colouring layered over the seed chord by the left stick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modulation {
    pub sus: Sus,
    pub slide: Slide,
}

impl Modulation {
    /// Apply slide then suspension to a seed chord and fold the result onto
    /// the pitch-class ring. The input is taken by value; the chord table is
    /// never touched.
    ///
    /// Tone 1 is always the slot rewritten by a suspension, and it is derived
    /// from the already-slid root (sus2) or fifth (sus4).
    pub fn apply(&self, seed: [u8; 4]) -> [u8; 4] {
        let shift = self.slide.semitones();
        let mut tones = seed.map(|pc| pc as i32 + shift);

        match self.sus {
            Sus::None => {}
            Sus::Sus2 => tones[1] = tones[0] + 2,
            Sus::Sus4 => tones[1] = tones[2] - 2,
        }

        tones.map(normalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord_table::seed_chord;

    fn modulate(sus: Sus, slide: Slide, degree: u8) -> [u8; 4] {
        Modulation { sus, slide }.apply(seed_chord(degree))
    }

    #[test]
    fn test_no_modulation_is_identity() {
        for degree in 0..12 {
            assert_eq!(modulate(Sus::None, Slide::None, degree), seed_chord(degree));
        }
    }

    #[test]
    fn test_slide_up_shifts_every_tone() {
        // Cmaj7 → C#maj7, B wraps to C
        assert_eq!(modulate(Sus::None, Slide::Up, 0), [1, 5, 8, 0]);
    }

    #[test]
    fn test_slide_down_wraps_below_zero() {
        // Cmaj7 → Bmaj7
        assert_eq!(modulate(Sus::None, Slide::Down, 0), [11, 3, 6, 10]);
    }

    #[test]
    fn test_sus2_replaces_third() {
        // C E G B → C D G B
        assert_eq!(modulate(Sus::Sus2, Slide::None, 0), [0, 2, 7, 11]);
    }

    #[test]
    fn test_sus4_replaces_third_from_fifth() {
        // D F A C → D G A C
        assert_eq!(modulate(Sus::Sus4, Slide::None, 2), [2, 7, 9, 0]);
    }

    #[test]
    fn test_sus4_wraps_when_fifth_is_low() {
        // IV: F A C E; fifth is C (0), so the fourth is Bb (10)
        assert_eq!(modulate(Sus::Sus4, Slide::None, 5), [5, 10, 0, 4]);
    }

    #[test]
    fn test_slide_and_sus_combine() {
        // G7 slid up: Ab C D# F#, then sus2 from Ab → Bb
        assert_eq!(modulate(Sus::Sus2, Slide::Up, 7), [8, 10, 3, 6]);
    }

    #[test]
    fn test_apply_does_not_alias_table() {
        let _ = modulate(Sus::Sus4, Slide::Up, 0);
        assert_eq!(seed_chord(0), [0, 4, 7, 11]);
    }
}
