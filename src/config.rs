//! Piano configuration.
//!
//! Every field has a default, so `{}` is a complete config. The defaults
//! reproduce the original page: a sine tone that fades in to 0.3 over
//! 10 ms, settles at 0.2 by 100 ms, and fades out over 300 ms.

use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::Waveform;
use crate::error::PianoError;

/// Highest accepted `sampleRate`, in Hz.
pub const MAX_SAMPLE_RATE: f64 = 192_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PianoConfig {
    /// Engine sample rate in Hz.
    pub sample_rate: f64,
    pub waveform: Waveform,
    pub envelope: EnvelopeConfig,
    /// Output gain applied before soft clipping.
    pub master_gain: f64,
    /// Sounding voices allowed at once, releasing ones included.
    pub max_voices: usize,
    /// A4 in Hz. When set, notes are tuned by equal temperament instead
    /// of the fixed table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning_pitch: Option<f64>,
}

impl Default for PianoConfig {
    fn default() -> Self {
        PianoConfig {
            sample_rate: 44100.0,
            waveform: Waveform::Sine,
            envelope: EnvelopeConfig::default(),
            master_gain: 1.0,
            max_voices: 32,
            tuning_pitch: None,
        }
    }
}

/// Envelope times in seconds, levels as linear gain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub decay: f64,
    pub peak: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            attack: 0.01,
            decay: 0.09,
            peak: 0.3,
            sustain: 0.2,
            release: 0.3,
        }
    }
}

impl PianoConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, PianoError> {
        let config: PianoConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PianoError> {
        if !(self.sample_rate > 0.0 && self.sample_rate <= MAX_SAMPLE_RATE) {
            return Err(invalid(format!(
                "sampleRate must be within (0, {MAX_SAMPLE_RATE}], got {}",
                self.sample_rate
            )));
        }
        if !(self.master_gain >= 0.0) || !self.master_gain.is_finite() {
            return Err(invalid(format!("masterGain must not be negative, got {}", self.master_gain)));
        }
        if self.max_voices == 0 {
            return Err(invalid("maxVoices must be at least 1".to_string()));
        }
        if let Some(pitch) = self.tuning_pitch {
            if !(pitch > 0.0) || !pitch.is_finite() {
                return Err(invalid(format!("tuningPitch must be positive, got {pitch}")));
            }
        }
        self.envelope.validate()
    }
}

impl EnvelopeConfig {
    pub fn validate(&self) -> Result<(), PianoError> {
        for (name, seconds) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !(seconds >= 0.0) || !seconds.is_finite() {
                return Err(invalid(format!("envelope.{name} must be a non-negative time, got {seconds}")));
            }
        }
        for (name, level) in [("peak", self.peak), ("sustain", self.sustain)] {
            if !(0.0..=1.0).contains(&level) {
                return Err(invalid(format!("envelope.{name} must be within [0, 1], got {level}")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: String) -> PianoError {
    PianoError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = PianoConfig::from_json("{}").unwrap();
        assert_eq!(config, PianoConfig::default());
    }

    #[test]
    fn partial_envelope_keeps_other_defaults() {
        let config =
            PianoConfig::from_json(r#"{"waveform":"triangle","envelope":{"release":1.5}}"#).unwrap();
        assert_eq!(config.waveform, Waveform::Triangle);
        assert_eq!(config.envelope.release, 1.5);
        assert_eq!(config.envelope.attack, 0.01);
        assert_eq!(config.envelope.sustain, 0.2);
    }

    #[test]
    fn camel_case_fields() {
        let config =
            PianoConfig::from_json(r#"{"sampleRate":48000,"maxVoices":4,"tuningPitch":432}"#)
                .unwrap();
        assert_eq!(config.sample_rate, 48000.0);
        assert_eq!(config.max_voices, 4);
        assert_eq!(config.tuning_pitch, Some(432.0));
    }

    #[test]
    fn rejects_bad_values() {
        for json in [
            r#"{"sampleRate":0}"#,
            r#"{"maxVoices":0}"#,
            r#"{"masterGain":-1}"#,
            r#"{"tuningPitch":-440}"#,
            r#"{"envelope":{"attack":-0.1}}"#,
            r#"{"envelope":{"sustain":1.5}}"#,
            r#"{"waveform":"noise"}"#,
            r#"{"sampleRate":2.0e9}"#,
            r#"{"sampleRate":1e308}"#,
        ] {
            let result = PianoConfig::from_json(json);
            assert!(
                matches!(result, Err(PianoError::InvalidConfig(_))),
                "{json} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn rejects_non_finite_values() {
        for config in [
            PianoConfig { sample_rate: f64::INFINITY, ..PianoConfig::default() },
            PianoConfig { sample_rate: f64::NAN, ..PianoConfig::default() },
            PianoConfig { master_gain: f64::INFINITY, ..PianoConfig::default() },
            PianoConfig { tuning_pitch: Some(f64::INFINITY), ..PianoConfig::default() },
        ] {
            let result = config.validate();
            assert!(
                matches!(result, Err(PianoError::InvalidConfig(_))),
                "{config:?} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn accepts_the_highest_sample_rate() {
        let config = PianoConfig { sample_rate: MAX_SAMPLE_RATE, ..PianoConfig::default() };
        assert!(config.validate().is_ok());
    }
}
