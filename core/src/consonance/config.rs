/// Options for building a `ConsonanceEngine`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ConsonanceConfig {
    /// MIDI note number of the lowest note in range. 60 = C4.
    ///
    /// Default: `21`
    pub notestart: u8,

    /// Count of notes in range, starting at `notestart`.
    /// `notestart + notecount - 1` must be a valid MIDI note number.
    ///
    /// Default: `88`
    pub notecount: usize,

    /// The maximum dissonance (numerator * denominator) of the rational numbers
    /// taken into account. High values cause longer initialization times.
    ///
    /// Default: `256`
    pub maxfrac: u32,

    /// The width of the bell curve each rational number gets fuzzified with,
    /// in semitones. Must be greater than 0.
    ///
    /// Default: `0.25`
    pub bell_width: f64,
}

impl Default for ConsonanceConfig {
    fn default() -> Self {
        Self {
            notestart: 21,
            notecount: 88,
            maxfrac: 16 * 16,
            bell_width: 0.25,
        }
    }
}
