use crate::chord_table::{diatonic_index, is_diatonic, MAJOR_SCALE};
use crate::pitch::normalize;

/// Scale root and the active chord degree relative to it.
///
/// Both values always stay on the 0–11 ring. The degree is an offset from
/// the root, not an absolute pitch, and may sit outside the major scale
/// (passing chords reached by chromatic steps).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChordProgression {
    scale_root: u8,
    chord_degree: u8,
}

impl ChordProgression {
    pub fn new(scale_root: u8, chord_degree: u8) -> Self {
        Self {
            scale_root: normalize(scale_root as i32),
            chord_degree: normalize(chord_degree as i32),
        }
    }

    pub fn scale_root(&self) -> u8 {
        self.scale_root
    }

    pub fn chord_degree(&self) -> u8 {
        self.chord_degree
    }

    /// Move the chord by `semitones`, ignoring the scale.
    pub fn by_step(&mut self, semitones: i32) {
        self.chord_degree = normalize(self.chord_degree as i32 + semitones);
    }

    /// Walk `steps` scale degrees along the major scale. A chromatic degree
    /// is first snapped up one semitone into the scale.
    pub fn by_degree(&mut self, steps: i32) {
        let idx = diatonic_index(self.chord_degree)
            .or_else(|| diatonic_index(normalize(self.chord_degree as i32 + 1)))
            .unwrap_or(0);
        let next = (idx as i32 + steps).rem_euclid(MAJOR_SCALE.len() as i32);
        self.chord_degree = MAJOR_SCALE[next as usize];
    }

    /// Transpose the scale by `semitones`.
    ///
    /// A semitone move keeps the chord degree, so the same chord function
    /// plays a half step away. Larger moves pivot: the old tonic becomes the
    /// new chord degree, pulled down a semitone if that lands off the scale.
    pub fn shift_scale(&mut self, semitones: i32) {
        let previous_root = self.scale_root;
        self.scale_root = normalize(self.scale_root as i32 + semitones);

        if semitones.abs() > 1 {
            self.chord_degree = normalize(previous_root as i32);
            if !is_diatonic(self.chord_degree) {
                self.chord_degree = normalize(self.chord_degree as i32 - 1);
            }
        }
    }

    /// Snap a chromatic chord degree up into the scale.
    pub fn snap_into_scale(&mut self) {
        if !is_diatonic(self.chord_degree) {
            self.chord_degree = normalize(self.chord_degree as i32 + 1);
        }
    }

    // ─── Directional commands ───────────────────────────────────────────

    /// Up a fourth along the scale; with modifier, up a semitone.
    pub fn up_fourth(&mut self, modifier: bool) {
        if modifier {
            self.by_step(1);
        } else {
            self.by_degree(3);
        }
    }

    /// Down a fourth along the scale; with modifier, down a semitone.
    pub fn down_fourth(&mut self, modifier: bool) {
        if modifier {
            self.by_step(-1);
        } else {
            self.by_degree(-3);
        }
    }

    /// Up a second; with modifier, up a third.
    pub fn up_second(&mut self, modifier: bool) {
        self.by_degree(if modifier { 2 } else { 1 });
    }

    /// Down a second; with modifier, down a third.
    pub fn down_second(&mut self, modifier: bool) {
        self.by_degree(if modifier { -2 } else { -1 });
    }

    /// Up a fifth; with modifier, up a minor third.
    pub fn transpose_fifth_up(&mut self, modifier: bool) {
        self.shift_scale(if modifier { 3 } else { 7 });
    }

    /// Down a fifth; with modifier, down a major third.
    pub fn transpose_fifth_down(&mut self, modifier: bool) {
        self.shift_scale(if modifier { -4 } else { -7 });
    }

    /// Up a semitone; with modifier, up a whole tone.
    pub fn transpose_semitone_up(&mut self, modifier: bool) {
        self.shift_scale(if modifier { 2 } else { 1 });
    }

    /// Down a semitone; with modifier, down a whole tone.
    pub fn transpose_semitone_down(&mut self, modifier: bool) {
        self.shift_scale(if modifier { -2 } else { -1 });
    }
}
