use crate::arpeggio::ArpPattern;
use crate::chord_table::seed_chord;
use crate::modulation::Modulation;
use crate::pitch::normalize;
use crate::progression::ChordProgression;
use crate::range::PlaybackWindow;
use crate::types::{ToneCount, ROOT, SEQUENCE_LEN};

/// The 16-step sequence derived from the current musical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompiledSequence {
    /// Signed semitone offsets from [`ROOT`].
    pub offsets: [i32; SEQUENCE_LEN],
    /// Absolute MIDI pitches after the window's one-step octave correction.
    pub midi: [i32; SEQUENCE_LEN],
}

impl CompiledSequence {
    /// MIDI pitch for step `i`, clamped to the valid note range.
    pub fn note(&self, i: usize) -> u8 {
        self.midi[i % SEQUENCE_LEN].clamp(0, 127) as u8
    }
}

/// Everything the compiler reads. Borrowed from the engine for the duration
/// of one compile.
pub struct CompileInput<'a> {
    pub progression: &'a ChordProgression,
    pub modulation: Modulation,
    pub tone_count: ToneCount,
    pub pattern: &'a ArpPattern,
    pub window: PlaybackWindow,
}

/// Rebuild the whole sequence. Pure: same input, same output.
pub fn compile(input: &CompileInput<'_>) -> CompiledSequence {
    let seed = input
        .modulation
        .apply(seed_chord(input.progression.chord_degree()));
    let root = input.progression.scale_root() as i32;

    let mut offsets = [0i32; SEQUENCE_LEN];
    let mut midi = [0i32; SEQUENCE_LEN];

    for i in 0..SEQUENCE_LEN {
        let step = input.pattern.step(input.tone_count, i);
        let pitch_class = normalize(seed[step.tone] as i32 + root) as i32;
        offsets[i] = pitch_class + step.octave_shift;
        midi[i] = input.window.correct(ROOT + offsets[i]);
    }

    CompiledSequence { offsets, midi }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arpeggio::ArpStyle;
    use crate::modulation::{Slide, Sus};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pattern(style: ArpStyle) -> ArpPattern {
        ArpPattern::generate(style, ToneCount::Triad, &mut Pcg32::seed_from_u64(1))
    }

    fn compile_with(
        progression: ChordProgression,
        modulation: Modulation,
        tone_count: ToneCount,
        style: ArpStyle,
    ) -> CompiledSequence {
        let pattern = pattern(style);
        compile(&CompileInput {
            progression: &progression,
            modulation,
            tone_count,
            pattern: &pattern,
            window: PlaybackWindow::default(),
        })
    }

    #[test]
    fn test_c_major_triad_up() {
        let seq = compile_with(
            ChordProgression::new(0, 0),
            Modulation::default(),
            ToneCount::Triad,
            ArpStyle::Up,
        );
        // C E G at -36, -36, -36, then -24 ...
        assert_eq!(&seq.offsets[..6], &[-36, -32, -29, -24, -20, -17]);
        // 60-36 = 24 < 44 → +12 once = 36, still below the window
        assert_eq!(seq.midi[0], 36);
        // 60-24 = 36 → 48
        assert_eq!(seq.midi[3], 48);
        // 60+24 = 84 > 76 → 72
        assert_eq!(seq.offsets[15], 24);
        assert_eq!(seq.midi[15], 72);
    }

    #[test]
    fn test_seventh_uses_fourth_tone() {
        let seq = compile_with(
            ChordProgression::new(0, 7),
            Modulation::default(),
            ToneCount::Seventh,
            ArpStyle::Up,
        );
        // G B D F, starting two octaves down
        assert_eq!(&seq.offsets[..4], &[7 - 24, 11 - 24, 2 - 24, 5 - 24]);
    }

    #[test]
    fn test_scale_root_transposes() {
        let c = compile_with(
            ChordProgression::new(0, 0),
            Modulation::default(),
            ToneCount::Seventh,
            ArpStyle::Up,
        );
        let d = compile_with(
            ChordProgression::new(2, 0),
            Modulation::default(),
            ToneCount::Seventh,
            ArpStyle::Up,
        );
        // D maj7 = D F# A C#, the B of Cmaj7 wraps to C#
        assert_eq!(&d.offsets[..4], &[2 - 24, 6 - 24, 9 - 24, 1 - 24]);
        assert_ne!(c, d);
    }

    #[test]
    fn test_modulation_applies() {
        let seq = compile_with(
            ChordProgression::new(0, 0),
            Modulation { sus: Sus::Sus4, slide: Slide::None },
            ToneCount::Triad,
            ArpStyle::Down,
        );
        // Down triad starts on tone 2 (G) at +24, then tone 1 (F, sus4) at +24
        assert_eq!(seq.offsets[0], 7 + 24);
        assert_eq!(seq.offsets[1], 5 + 24);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let progression = ChordProgression::new(9, 5);
        let pattern = ArpPattern::generate(
            ArpStyle::Random,
            ToneCount::Seventh,
            &mut Pcg32::seed_from_u64(99),
        );
        let input = CompileInput {
            progression: &progression,
            modulation: Modulation { sus: Sus::Sus2, slide: Slide::Down },
            tone_count: ToneCount::Seventh,
            pattern: &pattern,
            window: PlaybackWindow::default(),
        };
        assert_eq!(compile(&input), compile(&input));
    }

    #[test]
    fn test_note_clamps_to_midi_range() {
        let seq = CompiledSequence {
            offsets: [0; SEQUENCE_LEN],
            midi: [200; SEQUENCE_LEN],
        };
        assert_eq!(seq.note(0), 127);
    }
}
