//! Control-side voice bookkeeping.
//!
//! The pool decides which render slot plays which note. Each decision is
//! committed as a single [`VoiceCommand`] pushed onto the render queue, so the
//! render thread only ever sees whole bindings. The renderer reports back
//! through [`SharedState`]: a slot whose `finished_generation` matches its
//! booking has fallen silent and is free again.
//!
//! Stealing policy when every slot is busy:
//!   1. a releasing voice with the lowest current level
//!   2. otherwise the voice with the oldest note-on

use std::sync::Arc;

use log::{debug, warn};
use rtrb::Producer;

use crate::engine::shared::SharedState;
use crate::synth::message::VoiceCommand;

#[derive(Debug, Clone, Copy, Default)]
struct Booking {
    note: Option<u8>,
    generation: u32,
    started_at: u64,
    releasing: bool,
}

/// Outcome of a successful [`VoicePool::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub slot: usize,
    /// Note that was cut off to make room, if any
    pub stolen: Option<u8>,
    /// The note already had a voice and was retriggered
    pub retriggered: bool,
}

pub struct VoicePool {
    bookings: Vec<Booking>,
    tx: Producer<VoiceCommand>,
    shared: Arc<SharedState>,
    note_counter: u64,
}

impl VoicePool {
    pub fn new(tx: Producer<VoiceCommand>, shared: Arc<SharedState>) -> Self {
        Self {
            bookings: vec![Booking::default(); shared.slot_count()],
            tx,
            shared,
            note_counter: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bookings.len()
    }

    /// Bind `note` to a voice, retriggering, taking a free slot or stealing.
    ///
    /// Returns `None` only when the command could not be queued; the pool is
    /// then left exactly as it was.
    pub fn allocate(&mut self, note: u8) -> Option<Allocation> {
        self.reap();

        let (slot, stolen, retriggered) = match self.slot_of(note) {
            Some(slot) => (slot, None, true),
            None => match self.free_slot() {
                Some(slot) => (slot, None, false),
                None => {
                    let slot = self.choose_victim();
                    (slot, self.bookings[slot].note, false)
                }
            },
        };

        let previous = self.bookings[slot];
        let generation = match previous.generation.wrapping_add(1) {
            0 => 1,
            g => g,
        };
        self.note_counter += 1;
        self.bookings[slot] = Booking {
            note: Some(note),
            generation,
            started_at: self.note_counter,
            releasing: false,
        };

        let command = VoiceCommand::Start {
            slot,
            note,
            generation,
            epoch: self.shared.epoch(),
        };
        if !self.send(command) {
            self.bookings[slot] = previous;
            return None;
        }

        if let Some(victim) = stolen {
            debug!("voice {slot} stolen from note {victim} for note {note}");
        }

        Some(Allocation {
            slot,
            stolen,
            retriggered,
        })
    }

    /// Move the voice bound to `note` into its release. Unknown notes are ignored.
    pub fn release(&mut self, note: u8) -> Option<usize> {
        self.reap();

        let slot = self.slot_of(note)?;
        let booking = self.bookings[slot];
        if booking.releasing {
            return Some(slot);
        }

        self.bookings[slot].releasing = true;
        let command = VoiceCommand::Release {
            slot,
            generation: booking.generation,
            epoch: self.shared.epoch(),
        };
        if !self.send(command) {
            self.bookings[slot] = booking;
            return None;
        }
        Some(slot)
    }

    /// Force every bound voice into its release.
    pub fn release_all(&mut self, fast: bool) {
        self.reap();

        let saved = self.bookings.clone();
        for booking in self.bookings.iter_mut().filter(|b| b.note.is_some()) {
            booking.releasing = true;
        }

        let command = VoiceCommand::ReleaseAll {
            fast,
            epoch: self.shared.epoch(),
        };
        if !self.send(command) {
            self.bookings = saved;
        }
    }

    /// Forget every binding. The renderer is reset separately through the epoch.
    pub fn reset(&mut self) {
        for booking in &mut self.bookings {
            booking.note = None;
            booking.releasing = false;
        }
    }

    /// Number of voices that are not Idle (including releasing ones).
    pub fn active_count(&self) -> usize {
        (0..self.bookings.len())
            .filter(|&slot| !self.is_idle(slot))
            .count()
    }

    /// Notes of every voice that is not Idle.
    pub fn active_notes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.bookings.len())
            .filter(|&slot| !self.is_idle(slot))
            .filter_map(|slot| self.bookings[slot].note)
    }

    /// Slot currently sounding `note`.
    pub fn slot_of(&self, note: u8) -> Option<usize> {
        (0..self.bookings.len())
            .find(|&slot| self.bookings[slot].note == Some(note) && !self.is_idle(slot))
    }

    /// Whether the voice for `note` has been released but is still audible.
    pub fn is_releasing(&self, note: u8) -> bool {
        self.slot_of(note)
            .is_some_and(|slot| self.bookings[slot].releasing)
    }

    fn is_idle(&self, slot: usize) -> bool {
        let booking = &self.bookings[slot];
        booking.note.is_none()
            || self.shared.slot(slot).finished_generation() == booking.generation
    }

    fn reap(&mut self) {
        for slot in 0..self.bookings.len() {
            if self.bookings[slot].note.is_some() && self.is_idle(slot) {
                self.bookings[slot].note = None;
                self.bookings[slot].releasing = false;
            }
        }
    }

    fn free_slot(&self) -> Option<usize> {
        (0..self.bookings.len()).find(|&slot| self.bookings[slot].note.is_none())
    }

    fn choose_victim(&self) -> usize {
        let quietest_releasing = (0..self.bookings.len())
            .filter(|&slot| self.bookings[slot].releasing)
            .min_by(|&a, &b| {
                let la = self.shared.slot(a).level();
                let lb = self.shared.slot(b).level();
                la.total_cmp(&lb)
                    .then(self.bookings[a].started_at.cmp(&self.bookings[b].started_at))
            });

        quietest_releasing.unwrap_or_else(|| {
            (0..self.bookings.len())
                .min_by_key(|&slot| self.bookings[slot].started_at)
                .unwrap_or(0)
        })
    }

    fn send(&mut self, command: VoiceCommand) -> bool {
        match self.tx.push(command) {
            Ok(()) => true,
            Err(_) => {
                warn!("voice command queue full, dropping {command:?}");
                false
            }
        }
    }
}
