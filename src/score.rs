//! Time-indexed note events
//!
//! A `Score` is produced by an external parser (MIDI, audio-to-note, ...) and
//! is read-only here. The JSON loader exists for the command-line tools.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// A single sounding note
///
/// Active over the half-open interval `[start_time, start_time + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Any integer pitch (e.g. a MIDI note number); reduced mod 12 when queried
    pub pitch_class: i32,
    /// Seconds
    pub start_time: f64,
    /// Seconds
    pub duration: f64,
    #[serde(default = "default_velocity")]
    pub velocity: f64,
}

fn default_velocity() -> f64 {
    1.0
}

impl NoteEvent {
    pub fn new(pitch_class: i32, start_time: f64, duration: f64) -> Self {
        Self {
            pitch_class,
            start_time,
            duration,
            velocity: default_velocity(),
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn is_sounding_at(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub notes: Vec<NoteEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Beats per minute, informational only
    #[serde(default)]
    pub tempo: f64,
    /// Seconds; zero means "derive from the notes"
    #[serde(default)]
    pub duration: f64,
}

impl Score {
    pub fn from_json_str(text: &str) -> Result<Self, ScoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Latest point that needs rendering: the declared duration or the end
    /// of the last note, whichever is later
    pub fn end_time(&self) -> f64 {
        self.notes()
            .map(NoteEvent::end_time)
            .fold(self.duration.max(0.0), f64::max)
    }

    /// Every note across all tracks
    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.tracks.iter().flat_map(|t| t.notes.iter())
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_half_open_interval() {
        let note = NoteEvent::new(3, 1.0, 0.5);
        assert!(!note.is_sounding_at(0.999));
        assert!(note.is_sounding_at(1.0));
        assert!(note.is_sounding_at(1.4999));
        assert!(!note.is_sounding_at(1.5));
    }

    #[test]
    fn test_zero_duration_never_sounds() {
        let note = NoteEvent::new(0, 2.0, 0.0);
        assert!(!note.is_sounding_at(2.0));
    }

    #[test]
    fn test_parse_json_score() {
        let text = r#"{
            "tracks": [
                { "notes": [
                    { "pitch_class": 60, "start_time": 0.0, "duration": 1.0, "velocity": 0.8 },
                    { "pitch_class": 64, "start_time": 0.5, "duration": 2.0 }
                ] },
                { "notes": [] }
            ],
            "tempo": 120.0,
            "duration": 2.0
        }"#;

        let score = Score::from_json_str(text).unwrap();
        assert_eq!(score.tracks.len(), 2);
        assert_eq!(score.note_count(), 2);
        assert_eq!(score.tracks[0].notes[1].velocity, 1.0);
        assert_eq!(score.end_time(), 2.5);
    }

    #[test]
    fn test_missing_fields_default() {
        let score = Score::from_json_str("{}").unwrap();
        assert!(score.tracks.is_empty());
        assert_eq!(score.end_time(), 0.0);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            Score::from_json_str("{ \"tracks\": 3 }"),
            Err(ScoreError::Json(_))
        ));
    }

    #[test]
    fn test_declared_duration_wins_when_longer() {
        let score = Score {
            tracks: vec![Track {
                notes: vec![NoteEvent::new(0, 0.0, 1.0)],
            }],
            tempo: 90.0,
            duration: 4.0,
        };
        assert_eq!(score.end_time(), 4.0);
    }
}
