/// Highest valid MIDI note number.
pub const MAX_MIDI_NOTE: u8 = 127;

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Accept a host-supplied note number if it names a MIDI note.
pub fn validate_note(note: i32) -> Option<u8> {
    u8::try_from(note).ok().filter(|&n| n <= MAX_MIDI_NOTE)
}

/// Black keys of the piano (C#, D#, F#, G#, A#).
pub fn is_black_key(note: u8) -> bool {
    matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}

/// Note name with octave, e.g. `C4` for MIDI 60.
pub fn note_name(note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = note as i32 / 12 - 1;
    format!("{}{}", NAMES[(note % 12) as usize], octave)
}
