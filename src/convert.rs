/// Pitch of the reference note, in Hz.
pub const REF_A_HZ: f64 = 440.0;

/// Note index of the reference pitch.
pub const REF_A_NOTE: f64 = 69.0;

/// Frequency change per step of the 16-bit oscillator frequency register.
pub const HZ_PER_STEP: f64 = 0.0596;

/// Equal-tempered frequency of a (possibly fractional) note index.
pub fn note_to_frequency_hz(note: f64) -> f64 {
    REF_A_HZ * 2.0f64.powf((note - REF_A_NOTE) / 12.0)
}

/// Converts a frequency to the oscillator register word, rounding to the
/// nearest step. Frequencies beyond the register range saturate to
/// `0..=0xffff`.
pub fn frequency_to_register_word(hz: f64) -> u16 {
    (hz / HZ_PER_STEP).round() as u16
}

/// Linearly maps `value` in `0..=in_max` onto a nibble, `floor(value * 15 / in_max)`.
///
/// Values above `in_max` produce results above 15; callers validate first.
/// An empty input range (`in_max == 0`) maps everything to 0.
pub fn scale_to_nibble(value: u8, in_max: u8) -> u8 {
    (value as u32 * 15).checked_div(in_max as u32).unwrap_or(0) as u8
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_pitch() {
        assert_eq!(note_to_frequency_hz(69.0), 440.0);
        assert!((note_to_frequency_hz(57.0) - 220.0).abs() < 1e-9);
        assert!((note_to_frequency_hz(81.0) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn fractional_notes_bend_between_semitones() {
        let lo = note_to_frequency_hz(60.0);
        let hi = note_to_frequency_hz(61.0);
        let mid = note_to_frequency_hz(60.5);
        assert!(lo < mid && mid < hi);
        assert!((mid * mid - lo * hi).abs() < 1e-6);
    }

    #[test]
    fn register_words_for_known_notes() {
        assert_eq!(frequency_to_register_word(note_to_frequency_hz(57.0)), 0x0e6b);
        assert_eq!(frequency_to_register_word(note_to_frequency_hz(48.0)), 0x0893);
        assert_eq!(frequency_to_register_word(note_to_frequency_hz(14.0)), 0x0134);
    }

    #[test]
    fn register_word_rounds_instead_of_truncating() {
        // 130.81 Hz / 0.0596 = 2194.8..., truncation would give 0x0892.
        assert_eq!(frequency_to_register_word(130.8128), 2195);
        assert_eq!(frequency_to_register_word(0.0596 * 10.4), 10);
        assert_eq!(frequency_to_register_word(0.0596 * 10.6), 11);
    }

    #[test]
    fn register_word_saturates() {
        assert_eq!(frequency_to_register_word(0.0), 0);
        assert_eq!(frequency_to_register_word(1.0e6), 0xffff);
        assert_eq!(frequency_to_register_word(-5.0), 0);
    }

    #[test]
    fn nibble_scaling_covers_full_range() {
        assert_eq!(scale_to_nibble(0, 127), 0);
        assert_eq!(scale_to_nibble(8, 127), 0);
        assert_eq!(scale_to_nibble(9, 127), 1);
        assert_eq!(scale_to_nibble(64, 127), 7);
        assert_eq!(scale_to_nibble(127, 127), 15);
        for v in 0..=127u8 {
            let n = scale_to_nibble(v, 127);
            assert_eq!(n as u32, v as u32 * 15 / 127);
            assert!(n <= 15);
        }
    }

    #[test]
    fn nibble_scaling_other_input_ranges() {
        assert_eq!(scale_to_nibble(255, 255), 15);
        assert_eq!(scale_to_nibble(15, 15), 15);
        assert_eq!(scale_to_nibble(1, 2), 7);
    }

    #[test]
    fn nibble_scaling_empty_range_is_zero() {
        assert_eq!(scale_to_nibble(0, 0), 0);
        assert_eq!(scale_to_nibble(127, 0), 0);
    }
}
