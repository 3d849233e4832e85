//! Offline renderer: plays a scripted performance through a [`Piano`] on a
//! [`SynthEngine`] and encodes the result as WAV.

use serde::{Deserialize, Serialize};

use crate::config::PianoConfig;
use crate::error::PianoError;
use crate::input::InputEvent;
use crate::piano::Piano;

use super::engine::SynthEngine;

/// A timed list of input events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub events: Vec<TimedInput>,
    /// Seconds rendered after the last event.
    #[serde(default = "default_tail")]
    pub tail: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedInput {
    /// Seconds from the start of the performance.
    pub time: f64,
    #[serde(flatten)]
    pub input: InputEvent,
}

/// Longest performance accepted, tail included, in seconds.
pub const MAX_PERFORMANCE_SECONDS: f64 = 600.0;

fn default_tail() -> f64 {
    0.5
}

impl Performance {
    pub fn from_json(json: &str) -> Result<Self, PianoError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Event times and the tail must be finite, and the whole render must
    /// end within [`MAX_PERFORMANCE_SECONDS`]. Negative times count as 0.
    pub fn validate(&self) -> Result<(), PianoError> {
        let mut last: f64 = 0.0;
        for event in &self.events {
            if !event.time.is_finite() || event.time > MAX_PERFORMANCE_SECONDS {
                return Err(PianoError::InvalidConfig(format!(
                    "event time must be within {MAX_PERFORMANCE_SECONDS} s, got {}",
                    event.time
                )));
            }
            last = last.max(event.time);
        }
        if !self.tail.is_finite() || last + self.tail.max(0.0) > MAX_PERFORMANCE_SECONDS {
            return Err(PianoError::InvalidConfig(format!(
                "tail {} after {last} s runs past {MAX_PERFORMANCE_SECONDS} s",
                self.tail
            )));
        }
        Ok(())
    }
}

/// Render a performance to mono samples.
///
/// Events are applied in time order; each lands on the first frame at or
/// after its timestamp. The context opens on the first gesture, as in the
/// browser, so presses before any gesture fail the render.
pub fn render_performance(
    performance: &Performance,
    config: &PianoConfig,
) -> Result<Vec<f32>, PianoError> {
    config.validate()?;
    performance.validate()?;
    let sample_rate = config.sample_rate;
    let engine_config = config.clone();
    let mut piano = Piano::new(move || Ok(SynthEngine::new(engine_config.clone())))
        .with_tuning(config.tuning_pitch);

    let mut events: Vec<&TimedInput> = performance.events.iter().collect();
    events.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut output = Vec::new();
    for event in events {
        let target = (event.time.max(0.0) * sample_rate).round() as usize;
        advance(&mut piano, &mut output, target);
        match piano.handle(&event.input) {
            Ok(_) => {}
            // A full engine drops the note, like a browser out of voices.
            Err(PianoError::VoiceLimit { max }) => {
                log::warn!("t={:.3}s: {max} voices busy, note dropped", event.time);
            }
            Err(e) => return Err(e),
        }
    }

    let end = output.len() + (performance.tail.max(0.0) * sample_rate).round() as usize;
    advance(&mut piano, &mut output, end);
    log::debug!(
        "rendered {} frames, {} voices still sounding",
        output.len(),
        piano.host().map_or(0, |e| e.active_voices())
    );
    Ok(output)
}

/// Render until `output` holds `target` frames. Before the context opens
/// the page is silent.
fn advance(piano: &mut Piano<SynthEngine>, output: &mut Vec<f32>, target: usize) {
    if target <= output.len() {
        return;
    }
    let start = output.len();
    output.resize(target, 0.0);
    piano.render(&mut output[start..]);
}

/// Render a performance to a 16-bit stereo WAV file image.
pub fn render_wav(performance: &Performance, config: &PianoConfig) -> Result<Vec<u8>, PianoError> {
    let mono = render_performance(performance, config)?;
    let mut pcm = Vec::with_capacity(mono.len() * 2);
    for s in mono {
        let v = (s as f64 * 32767.0).round().clamp(-32768.0, 32767.0) as i16;
        pcm.push(v); // L
        pcm.push(v); // R
    }
    encode_wav(&pcm, config.sample_rate.round() as u32, 2)
}

/// Size of the `data` chunk for `samples` 16-bit samples, if the RIFF
/// header can describe it.
fn wav_data_size(samples: usize) -> Result<u32, PianoError> {
    samples
        .checked_mul(2)
        .and_then(|bytes| u32::try_from(bytes).ok())
        .filter(|&bytes| bytes <= u32::MAX - 36)
        .ok_or_else(|| PianoError::InvalidConfig(format!("{samples} samples do not fit in a WAV file")))
}

/// Encode interleaved i16 PCM samples as a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>, PianoError> {
    let bits_per_sample: u16 = 16;
    let block_align = channels * (bits_per_sample / 8);
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| PianoError::InvalidConfig(format!("byte rate overflows at {sample_rate} Hz")))?;
    let data_size = wav_data_size(samples.len())?;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    Ok(buf)
}
