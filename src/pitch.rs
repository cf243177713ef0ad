/// Key names indexed by pitch class (0 = C).
pub const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Roman-numeral chord function for each chord degree, relative to the scale root.
pub const CHORD_ROMAN: [&str; 12] = [
    "I", "I#", "ii", "IIIb", "iii", "IV", "iv#", "V", "VIb", "vi", "VIIb", "vii",
];

/// Fold an integer onto the 0–11 pitch-class ring.
pub fn normalize(n: i32) -> u8 {
    n.rem_euclid(12) as u8
}

/// Name of the key whose tonic is `pitch_class`.
pub fn key_name(pitch_class: u8) -> &'static str {
    KEY_NAMES[normalize(pitch_class as i32) as usize]
}

/// Absolute chord name plus its function, e.g. `"E (iii)"` for degree 4 in C.
pub fn chord_label(scale_root: u8, chord_degree: u8) -> String {
    let absolute = normalize(scale_root as i32 + chord_degree as i32);
    format!(
        "{} ({})",
        key_name(absolute),
        CHORD_ROMAN[normalize(chord_degree as i32) as usize]
    )
}

/// Scientific pitch name for a MIDI note number. MIDI 60 = C4.
pub fn midi_note_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", KEY_NAMES[(note % 12) as usize], octave)
}
