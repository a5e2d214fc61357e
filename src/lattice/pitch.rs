//! Pitch classes
//!
//! Octave-independent note identities. Text input accepts lowercase or
//! uppercase names with a `#` sharp or a `b` flat suffix (`c`, `C#`, `eb`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of pitch classes in an octave
pub const PITCH_CLASS_COUNT: usize = 12;

/// The twelve pitch classes, spelled with sharps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

const ALL: [PitchClass; PITCH_CLASS_COUNT] = [
    PitchClass::C,
    PitchClass::CSharp,
    PitchClass::D,
    PitchClass::DSharp,
    PitchClass::E,
    PitchClass::F,
    PitchClass::FSharp,
    PitchClass::G,
    PitchClass::GSharp,
    PitchClass::A,
    PitchClass::ASharp,
    PitchClass::B,
];

impl PitchClass {
    /// All pitch classes in ascending semitone order
    pub fn all() -> [PitchClass; PITCH_CLASS_COUNT] {
        ALL
    }

    /// Convert pitch class to semitone number (C=0, C#=1, D=2, ...)
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Reduce any integer semitone (negative or beyond one octave) to a pitch class
    pub fn from_semitone(semitone: i64) -> Self {
        ALL[semitone.rem_euclid(PITCH_CLASS_COUNT as i64) as usize]
    }

    /// Shift by `semitones`, wrapping around the octave
    pub fn transpose(self, semitones: i64) -> Self {
        Self::from_semitone(self.semitone() as i64 + semitones)
    }

    /// Label drawn on lattice nodes
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchClassError {
    #[error("invalid pitch class: {0}")]
    Invalid(String),
}

impl FromStr for PitchClass {
    type Err = PitchClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<i64>() {
            return Ok(Self::from_semitone(number));
        }

        let mut chars = trimmed.chars();
        let letter = chars
            .next()
            .ok_or_else(|| PitchClassError::Invalid(s.to_string()))?;
        let natural = match letter.to_ascii_lowercase() {
            'c' => PitchClass::C,
            'd' => PitchClass::D,
            'e' => PitchClass::E,
            'f' => PitchClass::F,
            'g' => PitchClass::G,
            'a' => PitchClass::A,
            'b' => PitchClass::B,
            _ => return Err(PitchClassError::Invalid(s.to_string())),
        };
        match chars.as_str() {
            "" => Ok(natural),
            "#" => Ok(natural.transpose(1)),
            "b" => Ok(natural.transpose(-1)),
            _ => Err(PitchClassError::Invalid(s.to_string())),
        }
    }
}
