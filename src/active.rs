//! Active pitch-class state
//!
//! Twelve on/off slots, one per pitch class. Octaves are discarded. The set
//! changes in one of two ways per call:
//! - direct: `set_active` / `handle_event` from clicks or an external player
//! - time query: `update_at` scans a score for notes sounding at `t`

use std::fmt;

use crate::lattice::{PitchClass, PITCH_CLASS_COUNT};
use crate::score::Score;

/// Seconds each pitch class stays lit in the no-score animation
pub const FALLBACK_INTERVAL: f64 = 0.5;

/// Direction of a note event delivered by a playback engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// Where the result of a time query came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveOrigin {
    /// Notes from a real score
    Score,
    /// No score loaded; one pitch class cycling as a placeholder
    Fallback,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActivePitchSet {
    slots: [bool; PITCH_CLASS_COUNT],
}

impl ActivePitchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary integer pitches (reduced mod 12)
    pub fn from_pitches(pitches: &[i32]) -> Self {
        let mut set = Self::new();
        set.set_active(pitches);
        set
    }

    /// Replace the whole set: clear, then light every given pitch
    pub fn set_active(&mut self, pitches: &[i32]) {
        self.clear_all();
        for &pitch in pitches {
            self.insert(PitchClass::from_semitone(pitch as i64));
        }
    }

    pub fn clear_all(&mut self) {
        self.slots = [false; PITCH_CLASS_COUNT];
    }

    pub fn insert(&mut self, pc: PitchClass) {
        self.slots[pc.semitone() as usize] = true;
    }

    pub fn remove(&mut self, pc: PitchClass) {
        self.slots[pc.semitone() as usize] = false;
    }

    /// Apply a note-on / note-off from a playback engine
    pub fn handle_event(&mut self, pitch: i32, direction: KeyDirection) {
        let pc = PitchClass::from_semitone(pitch as i64);
        match direction {
            KeyDirection::Down => self.insert(pc),
            KeyDirection::Up => self.remove(pc),
        }
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        self.slots[pc.semitone() as usize]
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|&&on| on).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active pitch classes in ascending order
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        PitchClass::all()
            .into_iter()
            .filter(|&pc| self.contains(pc))
            .collect()
    }

    pub fn slots(&self) -> [bool; PITCH_CLASS_COUNT] {
        self.slots
    }

    /// Recompute from `score` at `time`
    ///
    /// With no score, exactly one pitch class is lit and it advances every
    /// `fallback_interval` seconds, so the view is never blank.
    pub fn update_at(
        &mut self,
        score: Option<&Score>,
        time: f64,
        fallback_interval: f64,
    ) -> ActiveOrigin {
        self.clear_all();
        match score {
            Some(score) => {
                for note in score.notes() {
                    if note.is_sounding_at(time) {
                        self.insert(PitchClass::from_semitone(note.pitch_class as i64));
                    }
                }
                ActiveOrigin::Score
            }
            None => {
                self.insert(fallback_pitch_class(time, fallback_interval));
                ActiveOrigin::Fallback
            }
        }
    }
}

/// Pitch class lit by the placeholder animation at `time`
pub fn fallback_pitch_class(time: f64, interval: f64) -> PitchClass {
    let interval = if interval > 0.0 { interval } else { FALLBACK_INTERVAL };
    if !time.is_finite() {
        return PitchClass::C;
    }
    PitchClass::from_semitone((time / interval).floor() as i64)
}

/// Active set for `score` at `time`, using the default fallback interval
pub fn compute_active_at(score: Option<&Score>, time: f64) -> ActivePitchSet {
    let mut set = ActivePitchSet::new();
    set.update_at(score, time, FALLBACK_INTERVAL);
    set
}

impl fmt::Debug for ActivePitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.pitch_classes()).finish()
    }
}
