use crate::types::{ToneCount, SEQUENCE_LEN};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Arpeggio ordering. Un-modified pattern changes cycle Up → Down → Random.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArpStyle {
    #[default]
    Up,
    Down,
    Random,
}

impl ArpStyle {
    pub fn next(self) -> Self {
        match self {
            ArpStyle::Up => ArpStyle::Down,
            ArpStyle::Down => ArpStyle::Random,
            ArpStyle::Random => ArpStyle::Up,
        }
    }
}

/// One sequence step: which chord tone to play, shifted by how many semitones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpStep {
    pub tone: usize,
    /// Always a multiple of 12.
    pub octave_shift: i32,
}

/// Per-step tone/octave choices for both chord sizes.
///
/// A pattern is only regenerated on an explicit pattern change, so the same
/// groove carries across chord changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPattern {
    style: ArpStyle,
    triad: [ArpStep; SEQUENCE_LEN],
    seventh: [ArpStep; SEQUENCE_LEN],
}

impl ArpPattern {
    /// Build a pattern for `style`. `tone_count` only matters for `Random`,
    /// where it bounds the triad tone indices drawn at generation time.
    pub fn generate<R: Rng + ?Sized>(style: ArpStyle, tone_count: ToneCount, rng: &mut R) -> Self {
        let mut triad = [ArpStep::default(); SEQUENCE_LEN];
        let mut seventh = [ArpStep::default(); SEQUENCE_LEN];

        match style {
            ArpStyle::Up => {
                for i in 0..SEQUENCE_LEN {
                    let n = i as i32;
                    seventh[i] = ArpStep { tone: i % 4, octave_shift: (n / 4 - 2) * 12 };
                    triad[i] = ArpStep { tone: i % 3, octave_shift: (n / 3 - 3) * 12 };
                }
            }
            ArpStyle::Down => {
                for i in 0..SEQUENCE_LEN {
                    let n = i as i32;
                    seventh[i] = ArpStep { tone: 3 - i % 4, octave_shift: (2 - n / 4) * 12 };
                    triad[i] = ArpStep { tone: 2 - i % 3, octave_shift: (2 - n / 3) * 12 };
                }
            }
            ArpStyle::Random => fill_random(&mut triad, &mut seventh, tone_count, rng),
        }

        Self { style, triad, seventh }
    }

    pub fn style(&self) -> ArpStyle {
        self.style
    }

    /// Step `i` of the pattern used for a chord of `tone_count` tones.
    pub fn step(&self, tone_count: ToneCount, i: usize) -> ArpStep {
        match tone_count {
            ToneCount::Triad => self.triad[i % SEQUENCE_LEN],
            ToneCount::Seventh => self.seventh[i % SEQUENCE_LEN],
        }
    }

    pub fn triad(&self) -> &[ArpStep; SEQUENCE_LEN] {
        &self.triad
    }

    pub fn seventh(&self) -> &[ArpStep; SEQUENCE_LEN] {
        &self.seventh
    }
}

/// Random fill. Both arrays are fed from one stream of tone draws in 0..=3:
/// every draw lands in the seventh pattern until it is full, and every draw
/// other than 3 also adds an independent triad step. Generation stops once
/// the triad pattern is full.
///
/// Triad tone indices are drawn from `0..tone_count` as it stands now, so a
/// pattern rolled while in seventh mode can hold index 3 in its triad half.
/// Seed chords always have four tones, so that still reads a valid tone.
fn fill_random<R: Rng + ?Sized>(
    triad: &mut [ArpStep; SEQUENCE_LEN],
    seventh: &mut [ArpStep; SEQUENCE_LEN],
    tone_count: ToneCount,
    rng: &mut R,
) {
    let mut seventh_i = 0;
    let mut triad_i = 0;

    loop {
        let tone = rng.gen_range(0..=3usize);
        if seventh_i < SEQUENCE_LEN {
            seventh[seventh_i] = ArpStep { tone, octave_shift: random_octave(rng) };
            seventh_i += 1;
        }
        if tone != 3 {
            let triad_tone = rng.gen_range(0..tone_count.tones());
            triad[triad_i] = ArpStep { tone: triad_tone, octave_shift: random_octave(rng) };
            triad_i += 1;
            if triad_i >= SEQUENCE_LEN {
                break;
            }
        }
    }
}

fn random_octave<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(-1..=1) * 12
}
