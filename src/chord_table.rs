/// Scale degrees (semitones above the scale root) that belong to the major scale.
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Seed chord for each chord degree, spelled as if the scale root were C.
///
/// Every chord is four tones: root, third, fifth, seventh. Triads use the first three.
pub const CHORDS: [[u8; 4]; 12] = [
    [0, 4, 7, 11],  // I     (Cmaj7)
    [1, 5, 8, 11],  // I#
    [2, 5, 9, 0],   // ii    (Dm7)
    [3, 7, 10, 2],  // IIIb
    [4, 7, 11, 2],  // iii   (Em7)
    [5, 9, 0, 4],   // IV    (Fmaj7)
    [6, 9, 1, 4],   // iv#
    [7, 11, 2, 5],  // V     (G7)
    [8, 0, 3, 7],   // VIb
    [9, 0, 4, 7],   // vi    (Am7)
    [10, 2, 5, 9],  // VIIb
    [11, 2, 5, 9],  // vii   (Bm7b5)
];

/// Copy of the seed chord for `degree` (any value, folded onto the ring).
pub fn seed_chord(degree: u8) -> [u8; 4] {
    CHORDS[(degree % 12) as usize]
}

pub fn is_diatonic(degree: u8) -> bool {
    MAJOR_SCALE.contains(&degree)
}

/// Position of `degree` within [`MAJOR_SCALE`], or None for chromatic degrees.
pub fn diatonic_index(degree: u8) -> Option<usize> {
    MAJOR_SCALE.iter().position(|&d| d == degree)
}
