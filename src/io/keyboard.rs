//! Piano keyboard boundary.
//!
//! A keyboard view shows a note range and highlights the sounding notes; mouse
//! or key presses come back as `(note, is_down)` events that the host hands to
//! [`Engine::handle_key_event`](crate::Engine::handle_key_event).

use crate::io::midi::{validate_note, MAX_MIDI_NOTE};

/// Inclusive MIDI note range shown by a keyboard view.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub start: u8,
    pub end: u8,
}

impl KeyRange {
    /// Build a range, swapping reversed bounds and clamping to valid notes.
    pub fn new(start: u8, end: u8) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start: start.min(MAX_MIDI_NOTE),
            end: end.min(MAX_MIDI_NOTE),
        }
    }

    pub fn contains(&self, note: u8) -> bool {
        (self.start..=self.end).contains(&note)
    }

    pub fn notes(&self) -> impl Iterator<Item = u8> {
        self.start..=self.end
    }

    /// Number of keys; a range always holds at least one.
    pub fn note_count(&self) -> usize {
        (self.end - self.start) as usize + 1
    }
}

impl Default for KeyRange {
    /// C4 to C6, two octaves around middle C.
    fn default() -> Self {
        Self { start: 60, end: 84 }
    }
}

/// A key going down or up, as reported by a keyboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub note: i32,
    pub down: bool,
}

impl KeyEvent {
    pub fn new(note: i32, down: bool) -> Self {
        Self { note, down }
    }

    pub fn down(note: i32) -> Self {
        Self::new(note, true)
    }

    pub fn up(note: i32) -> Self {
        Self::new(note, false)
    }

    /// The event's note, if it is a valid MIDI note.
    pub fn midi_note(&self) -> Option<u8> {
        validate_note(self.note)
    }
}

/// Set of sounding notes, stored as a 128-bit mask so UI polling never allocates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveNoteSet(u128);

impl ActiveNoteSet {
    pub fn insert(&mut self, note: u8) {
        if note <= MAX_MIDI_NOTE {
            self.0 |= 1u128 << note;
        }
    }

    pub fn contains(&self, note: u8) -> bool {
        note <= MAX_MIDI_NOTE && self.0 & (1u128 << note) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=MAX_MIDI_NOTE).filter(move |&note| self.contains(note))
    }
}

impl FromIterator<u8> for ActiveNoteSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::default();
        for note in iter {
            set.insert(note);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_two_octaves_from_middle_c() {
        let range = KeyRange::default();
        assert_eq!(range.note_count(), 25);
        assert_eq!(range.notes().count(), range.note_count());
        assert!(range.contains(60) && range.contains(84));
        assert!(!range.contains(85));
    }

    #[test]
    fn reversed_range_is_normalised() {
        assert_eq!(KeyRange::new(72, 48), KeyRange::new(48, 72));
        assert_eq!(KeyRange::new(0, 200).end, 127);
    }

    #[test]
    fn key_events_validate_notes() {
        assert_eq!(KeyEvent::down(60).midi_note(), Some(60));
        assert_eq!(KeyEvent::up(300).midi_note(), None);
    }

    #[test]
    fn active_set_tracks_membership() {
        let set: ActiveNoteSet = [60u8, 64, 67, 200].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert!(set.contains(64));
        assert!(!set.contains(65));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![60, 64, 67]);
    }
}
