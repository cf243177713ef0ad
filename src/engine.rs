use crate::arpeggio::{ArpPattern, ArpStyle};
use crate::compiler::{compile, CompileInput, CompiledSequence};
use crate::modulation::{Modulation, Slide, Sus};
use crate::pitch::{chord_label, key_name};
use crate::progression::ChordProgression;
use crate::range::{PlaybackWindow, RangeController};
use crate::tempo::Tempo;
use crate::types::*;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Owns all musical state and rebuilds the sequence after every change.
///
/// Mutators never patch the sequence; they update state and recompile it
/// from scratch, so readers always see a sequence that matches the state.
pub struct ChordEngine {
    progression: ChordProgression,
    tone_count: ToneCount,
    modulation: Modulation,
    pattern: ArpPattern,
    tempo: Tempo,
    range: RangeController,
    playing: bool,
    rng: Pcg32,
    compiled: CompiledSequence,
}

impl ChordEngine {
    /// Start in C major on the I chord: triad, up-arpeggio, default tempo
    /// and window. The seed only affects random arpeggio patterns.
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let tone_count = ToneCount::Triad;
        let pattern = ArpPattern::generate(ArpStyle::Up, tone_count, &mut rng);
        let progression = ChordProgression::default();
        let modulation = Modulation::default();
        let range = RangeController::new();
        let compiled = compile(&CompileInput {
            progression: &progression,
            modulation,
            tone_count,
            pattern: &pattern,
            window: range.window(),
        });

        Self {
            progression,
            tone_count,
            modulation,
            pattern,
            tempo: Tempo::default(),
            range,
            playing: true,
            rng,
            compiled,
        }
    }

    /// Seed from the thread RNG when reproducibility isn't wanted.
    pub fn unseeded() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.tempo = tempo;
        self
    }

    // ─── Dispatch ───────────────────────────────────────────────────────

    /// Run one command. `Exit` is the coordinator's business and is ignored here.
    pub fn dispatch(&mut self, command: Command, modifier: bool) {
        match command {
            Command::Exit => {}
            Command::TogglePlayback => self.toggle_playback(),
            Command::ToggleToneCount => self.toggle_tone_count(modifier),
            Command::ChangeArpPattern => self.change_arp_pattern(modifier),
            Command::Tempo => {
                if modifier {
                    self.tempo_down();
                } else {
                    self.tempo_up();
                }
            }
            Command::ChordUpFourth => self.progress(|p| p.up_fourth(modifier)),
            Command::ChordDownFourth => self.progress(|p| p.down_fourth(modifier)),
            Command::ChordUpSecond => self.progress(|p| p.up_second(modifier)),
            Command::ChordDownSecond => self.progress(|p| p.down_second(modifier)),
            Command::TransposeFifthUp => self.progress(|p| p.transpose_fifth_up(modifier)),
            Command::TransposeFifthDown => self.progress(|p| p.transpose_fifth_down(modifier)),
            Command::TransposeSemitoneUp => self.progress(|p| p.transpose_semitone_up(modifier)),
            Command::TransposeSemitoneDown => {
                self.progress(|p| p.transpose_semitone_down(modifier))
            }
        }
    }

    /// Route an axis reading to sus, slide, or the range controller.
    pub fn apply_axis(&mut self, sample: AxisSample) {
        match sample.channel {
            AxisChannel::LeftHorizontal => {
                let sus = if sample.value > AXIS_THRESHOLD {
                    Sus::Sus4
                } else if sample.value < -AXIS_THRESHOLD {
                    Sus::Sus2
                } else {
                    Sus::None
                };
                self.set_sus(sus);
            }
            AxisChannel::LeftVertical => {
                let slide = if sample.value > AXIS_THRESHOLD {
                    Slide::Up
                } else if sample.value < -AXIS_THRESHOLD {
                    Slide::Down
                } else {
                    Slide::None
                };
                self.set_slide(slide);
            }
            AxisChannel::RightHorizontal => self.range_horizontal(sample.value),
            AxisChannel::RightVertical => self.range_vertical(sample.value),
        }
    }

    // ─── Progression ────────────────────────────────────────────────────

    fn progress(&mut self, step: impl FnOnce(&mut ChordProgression)) {
        step(&mut self.progression);
        self.recompile();
    }

    /// Move the chord by semitones, ignoring the scale.
    pub fn chord_by_step(&mut self, semitones: i32) {
        self.progress(|p| p.by_step(semitones));
    }

    /// Move the chord along the major scale.
    pub fn chord_by_degree(&mut self, steps: i32) {
        self.progress(|p| p.by_degree(steps));
    }

    pub fn shift_scale(&mut self, semitones: i32) {
        self.progress(|p| p.shift_scale(semitones));
    }

    // ─── Sequence shape ─────────────────────────────────────────────────

    /// Switch triad ↔ seventh. With modifier, also pull a chromatic chord
    /// back into the scale.
    pub fn toggle_tone_count(&mut self, modifier: bool) {
        self.tone_count = self.tone_count.toggled();
        if modifier {
            self.progression.snap_into_scale();
        }
        self.recompile();
    }

    /// Cycle to the next arpeggio style, or with modifier re-roll the current one.
    pub fn change_arp_pattern(&mut self, modifier: bool) {
        let style = if modifier {
            self.pattern.style()
        } else {
            self.pattern.style().next()
        };
        self.set_arp_style(style);
    }

    pub fn set_arp_style(&mut self, style: ArpStyle) {
        self.pattern = ArpPattern::generate(style, self.tone_count, &mut self.rng);
        debug!("Arpeggio pattern: {:?}", style);
        self.recompile();
    }

    pub fn set_sus(&mut self, sus: Sus) {
        if self.modulation.sus == sus {
            return;
        }
        self.modulation.sus = sus;
        self.recompile();
    }

    pub fn set_slide(&mut self, slide: Slide) {
        if self.modulation.slide == slide {
            return;
        }
        self.modulation.slide = slide;
        self.recompile();
    }

    pub fn range_horizontal(&mut self, ratio: f32) {
        self.range.horizontal(ratio);
        self.recompile();
    }

    pub fn range_vertical(&mut self, ratio: f32) {
        self.range.vertical(ratio);
        self.recompile();
    }

    // ─── Transport ──────────────────────────────────────────────────────

    pub fn tempo_up(&mut self) {
        self.tempo.up();
        debug!("Tempo up to {:.3} Hz", self.tempo.hz());
        self.recompile();
    }

    pub fn tempo_down(&mut self) {
        self.tempo.down();
        debug!("Tempo down to {:.3} Hz", self.tempo.hz());
        self.recompile();
    }

    pub fn toggle_playback(&mut self) {
        self.playing = !self.playing;
        debug!("Playback: {}", if self.playing { "on" } else { "off" });
    }

    // ─── Recompilation ──────────────────────────────────────────────────

    fn recompile(&mut self) {
        self.compiled = compile(&CompileInput {
            progression: &self.progression,
            modulation: self.modulation,
            tone_count: self.tone_count,
            pattern: &self.pattern,
            window: self.range.window(),
        });
        debug!(
            "Chord changed to {} in scale {}",
            chord_label(self.progression.scale_root(), self.progression.chord_degree()),
            key_name(self.progression.scale_root()),
        );
    }

    // ─── Reads ──────────────────────────────────────────────────────────

    pub fn sequence(&self) -> &CompiledSequence {
        &self.compiled
    }

    /// The note for step `i` with the current hold duration.
    pub fn note_event(&self, i: usize) -> NoteEvent {
        NoteEvent {
            pitch: self.compiled.note(i),
            hold: self.tempo.hold_duration(),
        }
    }

    /// All 16 steps as (pitch, hold) pairs.
    pub fn note_events(&self) -> [NoteEvent; SEQUENCE_LEN] {
        std::array::from_fn(|i| self.note_event(i))
    }

    pub fn progression(&self) -> &ChordProgression {
        &self.progression
    }

    pub fn tone_count(&self) -> ToneCount {
        self.tone_count
    }

    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    pub fn pattern(&self) -> &ArpPattern {
        &self.pattern
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn window(&self) -> PlaybackWindow {
        self.range.window()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let root = self.progression.scale_root();
        let degree = self.progression.chord_degree();
        let window = self.range.window();
        EngineSnapshot {
            scale_root: root,
            chord_degree: degree,
            chord: chord_label(root, degree),
            key: key_name(root).to_string(),
            tone_count: self.tone_count,
            sus: self.modulation.sus,
            slide: self.modulation.slide,
            arp_style: self.pattern.style(),
            tempo_hz: self.tempo.hz(),
            window_low: window.low(),
            window_high: window.high(),
            midi_sequence: self.compiled.midi,
            playing: self.playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::MAX_TEMPO_HZ;

    fn engine() -> ChordEngine {
        ChordEngine::new(0)
    }

    fn axis(channel: AxisChannel, value: f32) -> AxisSample {
        AxisSample { channel, value }
    }

    #[test]
    fn test_initial_state() {
        let e = engine();
        assert_eq!(e.progression().scale_root(), 0);
        assert_eq!(e.progression().chord_degree(), 0);
        assert_eq!(e.tone_count(), ToneCount::Triad);
        assert_eq!(e.pattern().style(), ArpStyle::Up);
        assert_eq!(e.modulation(), Modulation::default());
        assert!(e.is_playing());
        assert_eq!((e.window().low(), e.window().high()), (44, 76));
    }

    #[test]
    fn test_sequence_is_pure_of_state() {
        let mut a = engine();
        let b = engine();
        a.dispatch(Command::ChordUpFourth, false);
        a.dispatch(Command::ChordDownFourth, false);
        assert_eq!(a.sequence(), b.sequence());
    }

    #[test]
    fn test_fourth_up_changes_sequence() {
        let mut e = engine();
        let before = *e.sequence();
        e.dispatch(Command::ChordUpFourth, false);
        assert_eq!(e.progression().chord_degree(), 5);
        assert_ne!(*e.sequence(), before);
    }

    #[test]
    fn test_modifier_selects_variant() {
        let mut e = engine();
        e.dispatch(Command::ChordUpFourth, true);
        assert_eq!(e.progression().chord_degree(), 1);
        e.dispatch(Command::TransposeFifthUp, true);
        assert_eq!(e.progression().scale_root(), 3);
    }

    #[test]
    fn test_toggle_tone_count_with_snap() {
        let mut e = engine();
        e.chord_by_step(1);
        e.toggle_tone_count(false);
        assert_eq!(e.tone_count(), ToneCount::Seventh);
        assert_eq!(e.progression().chord_degree(), 1);
        e.toggle_tone_count(true);
        assert_eq!(e.tone_count(), ToneCount::Triad);
        assert_eq!(e.progression().chord_degree(), 2);
    }

    #[test]
    fn test_arp_pattern_cycles_and_rerolls() {
        let mut e = engine();
        e.dispatch(Command::ChangeArpPattern, false);
        assert_eq!(e.pattern().style(), ArpStyle::Down);
        e.dispatch(Command::ChangeArpPattern, true);
        assert_eq!(e.pattern().style(), ArpStyle::Down);
        e.dispatch(Command::ChangeArpPattern, false);
        assert_eq!(e.pattern().style(), ArpStyle::Random);
        let first = e.pattern().clone();
        e.dispatch(Command::ChangeArpPattern, true);
        assert_eq!(e.pattern().style(), ArpStyle::Random);
        // fresh draws from the same stream
        assert_ne!(*e.pattern(), first);
    }

    #[test]
    fn test_random_pattern_reproducible_per_seed() {
        let mut a = ChordEngine::new(5);
        let mut b = ChordEngine::new(5);
        for e in [&mut a, &mut b] {
            e.set_arp_style(ArpStyle::Random);
        }
        assert_eq!(a.sequence(), b.sequence());
    }

    #[test]
    fn test_pattern_survives_chord_change() {
        let mut e = engine();
        e.set_arp_style(ArpStyle::Random);
        let pattern = e.pattern().clone();
        e.dispatch(Command::ChordUpSecond, false);
        e.dispatch(Command::TransposeFifthDown, false);
        assert_eq!(*e.pattern(), pattern);
    }

    #[test]
    fn test_tempo_command() {
        let mut e = engine();
        e.dispatch(Command::Tempo, false);
        assert!(e.tempo().hz() > 3.6);
        e.dispatch(Command::Tempo, true);
        e.dispatch(Command::Tempo, true);
        assert!(e.tempo().hz() < 3.6);
        for _ in 0..200 {
            e.dispatch(Command::Tempo, false);
        }
        assert_eq!(e.tempo().hz(), MAX_TEMPO_HZ);
    }

    #[test]
    fn test_left_stick_sus_and_slide() {
        let mut e = engine();
        e.apply_axis(axis(AxisChannel::LeftHorizontal, 0.9));
        assert_eq!(e.modulation().sus, Sus::Sus4);
        e.apply_axis(axis(AxisChannel::LeftHorizontal, -0.9));
        assert_eq!(e.modulation().sus, Sus::Sus2);
        e.apply_axis(axis(AxisChannel::LeftHorizontal, 0.3));
        assert_eq!(e.modulation().sus, Sus::None);

        e.apply_axis(axis(AxisChannel::LeftVertical, 0.8));
        assert_eq!(e.modulation().slide, Slide::Up);
        e.apply_axis(axis(AxisChannel::LeftVertical, -0.8));
        assert_eq!(e.modulation().slide, Slide::Down);
        e.apply_axis(axis(AxisChannel::LeftVertical, 0.5));
        assert_eq!(e.modulation().slide, Slide::None);
    }

    #[test]
    fn test_right_stick_recompiles_with_new_window() {
        let mut e = engine();
        // Up triad step 0 is C at -36 → 24, corrected once to 36.
        assert_eq!(e.sequence().midi[0], 36);
        e.apply_axis(axis(AxisChannel::RightHorizontal, 1.0));
        assert_eq!(e.window().low(), 32);
        // 24 < 32 still → 36
        assert_eq!(e.sequence().midi[0], 36);
        // step 15: 84 now fits under 88
        assert_eq!(e.sequence().midi[15], 84);
    }

    #[test]
    fn test_note_events_carry_hold() {
        let e = engine();
        let events = e.note_events();
        assert_eq!(events.len(), SEQUENCE_LEN);
        for (i, ev) in events.iter().enumerate() {
            assert_eq!(ev.pitch as i32, e.sequence().midi[i]);
            assert_eq!(ev.hold, e.tempo().hold_duration());
        }
    }

    #[test]
    fn test_playback_toggle_keeps_sequence() {
        let mut e = engine();
        let seq = *e.sequence();
        e.dispatch(Command::TogglePlayback, false);
        assert!(!e.is_playing());
        assert_eq!(*e.sequence(), seq);
    }

    #[test]
    fn test_snapshot_names() {
        let mut e = engine();
        e.dispatch(Command::ChordUpSecond, false);
        e.dispatch(Command::ChordUpSecond, false);
        let s = e.snapshot();
        assert_eq!(s.key, "C");
        assert_eq!(s.chord, "E (iii)");
        assert_eq!(s.midi_sequence, e.sequence().midi);
    }

    #[test]
    fn test_random_rolled_in_seventh_reads_fourth_tone_as_triad() {
        // Rolled with four tones, the triad half may point at tone 3; read
        // back in triad mode that step plays the chord's seventh.
        let mut checked = 0;
        for seed in 0..32 {
            let mut e = ChordEngine::new(seed);
            e.toggle_tone_count(false);
            e.set_arp_style(ArpStyle::Random);
            e.toggle_tone_count(false);
            assert_eq!(e.tone_count(), ToneCount::Triad);

            for (i, step) in e.pattern().triad().iter().enumerate() {
                if step.tone == 3 {
                    // C major seventh: tone 3 is B
                    assert_eq!(e.sequence().offsets[i], 11 + step.octave_shift);
                    checked += 1;
                }
            }
        }
        assert!(checked > 0, "no triad step drew tone 3");
    }
}
