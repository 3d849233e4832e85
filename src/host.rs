//! The audio backend the piano drives.
//!
//! A host owns the audio clock and the sounding tones. The piano only asks
//! it for the time, starts a tone at a timestamp, and releases it at a
//! timestamp; the envelope and the stop after the fade-out belong to the host.

use crate::error::PianoError;

pub trait AudioHost {
    /// Opaque handle to a started tone.
    type Tone;

    /// Current time on the host's audio clock, in seconds.
    fn current_time(&self) -> f64;

    /// Start a tone at `frequency` Hz, fading in from `at`.
    fn start_tone(&mut self, frequency: f64, at: f64) -> Result<Self::Tone, PianoError>;

    /// Fade the tone out from `at`, then stop it.
    fn release_tone(&mut self, tone: Self::Tone, at: f64);
}
