//! Note table and the computer-keyboard layout.
//!
//! One octave starting at middle C. The home row plays the naturals and the
//! row above it plays the sharps, the way a piano's black keys sit above the
//! white ones:
//!
//! ```text
//!    w  e     t  y  u
//!   C# D#    F# G# A#
//!  a  s  d  f  g  h  j
//!  C  D  E  F  G  A  B
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PianoError;

/// The twelve pitch classes of the octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
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

    /// Semitones above C.
    pub fn semitone(self) -> i32 {
        self as i32
    }

    /// MIDI note number of this pitch class in the given octave (C4 = 60).
    pub fn midi(self, octave: i32) -> i32 {
        (octave + 1) * 12 + self.semitone()
    }

    /// The table entry for this pitch class.
    pub fn note(self) -> &'static Note {
        &NOTES[self as usize]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = PianoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| PianoError::UnknownNote(s.to_string()))
    }
}

/// A key of the on-screen piano.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "note")]
    pub pitch: PitchClass,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Sharps render as the raised black keys.
    pub is_sharp: bool,
}

const fn note(pitch: PitchClass, frequency: f64, is_sharp: bool) -> Note {
    Note {
        pitch,
        frequency,
        is_sharp,
    }
}

/// The fourth octave, in key order.
pub static NOTES: [Note; 12] = [
    note(PitchClass::C, 261.63, false),
    note(PitchClass::CSharp, 277.18, true),
    note(PitchClass::D, 293.66, false),
    note(PitchClass::DSharp, 311.13, true),
    note(PitchClass::E, 329.63, false),
    note(PitchClass::F, 349.23, false),
    note(PitchClass::FSharp, 369.99, true),
    note(PitchClass::G, 392.00, false),
    note(PitchClass::GSharp, 415.30, true),
    note(PitchClass::A, 440.00, false),
    note(PitchClass::ASharp, 466.16, true),
    note(PitchClass::B, 493.88, false),
];

/// Octave the table is pitched in.
pub const TABLE_OCTAVE: i32 = 4;

/// Keyboard character to note.
pub static KEY_MAP: [(char, PitchClass); 12] = [
    ('a', PitchClass::C),
    ('w', PitchClass::CSharp),
    ('s', PitchClass::D),
    ('e', PitchClass::DSharp),
    ('d', PitchClass::E),
    ('f', PitchClass::F),
    ('t', PitchClass::FSharp),
    ('g', PitchClass::G),
    ('y', PitchClass::GSharp),
    ('h', PitchClass::A),
    ('u', PitchClass::ASharp),
    ('j', PitchClass::B),
];

/// Map a keyboard event's key value (e.g. `"a"`, `"A"`, `"Shift"`) to a note.
///
/// Case-insensitive; named keys never match.
pub fn note_for_key(key: &str) -> Option<PitchClass> {
    let mut chars = key.chars();
    let ch = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let ch = ch.to_ascii_lowercase();
    KEY_MAP.iter().find(|(k, _)| *k == ch).map(|&(_, p)| p)
}

/// The keyboard character that plays `pitch`.
pub fn key_for_note(pitch: PitchClass) -> Option<char> {
    KEY_MAP.iter().find(|(_, p)| *p == pitch).map(|&(k, _)| k)
}

/// Convert a MIDI note number to frequency.
///
/// `tuning_pitch` is the frequency of A4 (MIDI 69).
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * (2.0_f64).powf((midi as f64 - 69.0) / 12.0)
}

/// Frequency of `pitch`: the table value, or equal temperament against
/// `tuning_pitch` when one is given.
pub fn frequency_of(pitch: PitchClass, tuning_pitch: Option<f64>) -> f64 {
    match tuning_pitch {
        Some(a4) => midi_to_frequency(pitch.midi(TABLE_OCTAVE), a4),
        None => pitch.note().frequency,
    }
}
