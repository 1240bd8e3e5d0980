//! Voice slot table and allocation policy.
//!
//! The scheduler is pure bookkeeping plus synchronous callback dispatch: it
//! picks which slot handles each note event and tells the receiver, but it
//! never touches audio or graphs itself. Allocation walks the slot table
//! round-robin from a cursor so recently released voices get time to ring
//! out; when every slot is taken, the globally oldest voice is stolen
//! (unless stealing is disabled, in which case the event is dropped).

use chorale_graph::ModulationParameters;

/// Hard maximum number of voice slots.
pub const MAX_VOICES: usize = 16;

/// Sentinel pitch marking a slot as unoccupied.
pub const PITCH_FREE: i32 = -1;

/// Bookkeeping record for one voice slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotInfo {
    /// Pitch held by this slot, or [`PITCH_FREE`].
    pub pitch: i32,
    /// Start time of the note currently (or last) held.
    pub time: f64,
    /// True between note-on and note-off.
    pub note_on: bool,
}

impl SlotInfo {
    const fn empty() -> Self {
        Self {
            pitch: PITCH_FREE,
            time: 0.0,
            note_on: false,
        }
    }

    /// Returns true if the slot is unoccupied.
    pub fn is_free(&self) -> bool {
        self.pitch == PITCH_FREE
    }
}

/// Downstream contract the scheduler dispatches into.
///
/// The receiver is passed per call rather than stored, so an engine that
/// owns both the scheduler and the voice state can hand the scheduler a
/// split borrow of itself.
pub trait PolyphonyReceiver {
    /// A slot was assigned to a note-on.
    fn start_voice(
        &mut self,
        voice: usize,
        time: f64,
        pitch: i32,
        amount: f32,
        modulation: ModulationParameters,
    );

    /// A slot was released. `pitch` is the slot's pitch field at dispatch
    /// time and `time` is the note's original start time — see
    /// [`PolyphonyScheduler::stop`].
    fn stop_voice(&mut self, voice: usize, pitch: i32, time: f64);
}

/// Fixed-capacity voice allocator with round-robin search and oldest-voice
/// stealing.
#[derive(Debug, Clone)]
pub struct PolyphonyScheduler {
    slots: Vec<SlotInfo>,
    allow_stealing: bool,
    last_voice: Option<usize>,
    voice_limit: usize,
}

impl PolyphonyScheduler {
    /// Creates a scheduler with `capacity` slots, clamped to
    /// `1..=`[`MAX_VOICES`]. Capacity is fixed for the scheduler's lifetime;
    /// use [`set_voice_limit`](Self::set_voice_limit) to throttle below it.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_VOICES);
        Self {
            slots: vec![SlotInfo::empty(); capacity],
            allow_stealing: true,
            last_voice: None,
            voice_limit: capacity,
        }
    }

    /// Returns the fixed slot count.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the current allocation window.
    pub fn voice_limit(&self) -> usize {
        self.voice_limit
    }

    /// Bounds subsequent allocation to the first `limit` slots, clamped to
    /// `1..=capacity`. Slots beyond the limit are left untouched.
    pub fn set_voice_limit(&mut self, limit: usize) {
        self.voice_limit = limit.clamp(1, self.slots.len());
    }

    /// Enables or disables voice stealing.
    pub fn set_stealing(&mut self, allow: bool) {
        self.allow_stealing = allow;
    }

    /// Returns true if voice stealing is enabled.
    pub fn allows_stealing(&self) -> bool {
        self.allow_stealing
    }

    /// Handles a note-on: picks a slot, records it, and dispatches
    /// `start_voice`.
    ///
    /// With an explicit `voice`, that slot is used regardless of occupancy
    /// (retrigger semantics). Otherwise the table is scanned round-robin
    /// from just past the previous assignment; if every slot in the window
    /// is occupied the globally oldest start time is stolen, or the event
    /// is silently dropped when stealing is disabled. The round-robin
    /// cursor advances on every assignment, explicit and stolen included.
    pub fn start(
        &mut self,
        rx: &mut impl PolyphonyReceiver,
        time: f64,
        pitch: i32,
        amount: f32,
        voice: Option<usize>,
        modulation: ModulationParameters,
    ) {
        let slot = match voice {
            Some(idx) => {
                if idx >= self.slots.len() {
                    tracing::warn!(voice = idx, "explicit voice index out of range; note dropped");
                    return;
                }
                idx
            }
            None => match self.find_slot() {
                Some(idx) => idx,
                // All used and stealing disabled: drop the event.
                None => return,
            },
        };

        self.last_voice = Some(slot);
        self.slots[slot] = SlotInfo {
            pitch,
            time,
            note_on: true,
        };
        rx.start_voice(slot, time, pitch, amount, modulation);
    }

    fn find_slot(&self) -> Option<usize> {
        // Keep incrementing through the table so released voices get the
        // longest possible tail before reuse.
        let offset = self.last_voice.map_or(0, |last| last + 1);
        for i in 0..self.voice_limit {
            let check = (i + offset) % self.voice_limit;
            if self.slots[check].is_free() {
                return Some(check);
            }
        }

        if !self.allow_stealing {
            return None;
        }

        // Steal the globally oldest start time; ties go to the lowest index.
        let mut oldest = 0;
        for i in 1..self.voice_limit {
            if self.slots[i].time < self.slots[oldest].time {
                oldest = i;
            }
        }
        Some(oldest)
    }

    /// Handles a note-off.
    ///
    /// Without an explicit `voice`, the oldest slot holding `pitch` with its
    /// note still on is selected. A matching slot is cleared *before*
    /// `stop_voice` fires, so the callback observes the slot's pitch field
    /// as [`PITCH_FREE`] along with the note's original start time. `_time`
    /// is accepted for interface symmetry; teardown keys off the slot.
    pub fn stop(
        &mut self,
        rx: &mut impl PolyphonyReceiver,
        _time: f64,
        pitch: i32,
        voice: Option<usize>,
    ) {
        let slot = match voice {
            Some(idx) => {
                if idx >= self.slots.len() {
                    tracing::warn!(voice = idx, "explicit voice index out of range; stop ignored");
                    return;
                }
                Some(idx)
            }
            None => {
                let mut found = None;
                let mut oldest = f64::MAX;
                for (i, slot) in self.slots.iter().enumerate() {
                    if slot.pitch == pitch && slot.note_on && slot.time < oldest {
                        oldest = slot.time;
                        found = Some(i);
                    }
                }
                found
            }
        };

        if let Some(idx) = slot
            && self.slots[idx].pitch == pitch
            && self.slots[idx].note_on
        {
            self.slots[idx].note_on = false;
            self.slots[idx].pitch = PITCH_FREE;

            rx.stop_voice(idx, self.slots[idx].pitch, self.slots[idx].time);
        }
    }

    /// Releases every slot whose note is on, dispatching `stop_voice` once
    /// per previously-active slot. Covers the full capacity, not just the
    /// voice-limit window.
    pub fn kill_all(&mut self, rx: &mut impl PolyphonyReceiver) {
        for i in 0..self.slots.len() {
            if self.slots[i].note_on {
                self.slots[i].note_on = false;
                self.slots[i].pitch = PITCH_FREE;

                rx.stop_voice(i, self.slots[i].pitch, self.slots[i].time);
            }
        }
    }

    /// Read-only view of the slot table.
    pub fn slots(&self) -> &[SlotInfo] {
        &self.slots
    }

    /// Returns the number of slots whose note is currently on.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.note_on).count()
    }

    /// Renders one line of text per slot for debug display.
    pub fn debug_lines(&self) -> Vec<String> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                if slot.pitch == PITCH_FREE {
                    format!("voice {i} unused")
                } else if slot.note_on {
                    format!("voice {i} used: {} (note on)", slot.pitch)
                } else {
                    format!("voice {i} used: {} (note off)", slot.pitch)
                }
            })
            .collect()
    }
}

impl Default for PolyphonyScheduler {
    fn default() -> Self {
        Self::new(MAX_VOICES)
    }
}
