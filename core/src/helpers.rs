/// Converts a frequency ratio to its distance in 12-TET semitones.
#[inline(always)]
pub fn ratio_to_semitones(ratio: f64) -> f64 {
    12.0 * ratio.log2()
}

/// Maps a 7 bit MIDI data byte (velocity, controller value) to `0.0..=1.0`.
#[inline(always)]
pub fn midi_value_to_unit(value: u8) -> f64 {
    value.min(127) as f64 / 127.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_to_semitones() {
        assert_eq!(ratio_to_semitones(1.0), 0.0);
        assert_eq!(ratio_to_semitones(2.0), 12.0);
        assert_eq!(ratio_to_semitones(0.5), -12.0);
    }

    #[test]
    fn test_midi_value_to_unit() {
        assert_eq!(midi_value_to_unit(0), 0.0);
        assert_eq!(midi_value_to_unit(127), 1.0);
        assert_eq!(midi_value_to_unit(200), 1.0);
    }
}
