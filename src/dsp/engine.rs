//! Synthesis engine: the built-in [`AudioHost`].
//!
//! The engine's clock is the number of frames rendered so far. Tone starts
//! and releases are queued with a timestamp and applied on the first frame
//! at or after it, so callers on the UI side only ever hand over times read
//! from [`AudioHost::current_time`]. Voices are dropped once their release
//! fade has run out.

use std::collections::VecDeque;

use crate::config::PianoConfig;
use crate::error::PianoError;
use crate::host::AudioHost;
use crate::piano::Piano;

use super::mixer::Mixer;
use super::voice::Voice;

/// Handle to a tone started on a [`SynthEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneId(u64);

#[derive(Debug, Clone, Copy)]
enum Command {
    Start { tone: ToneId, frequency: f64 },
    Release { tone: ToneId },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    frame: u64,
    command: Command,
}

pub struct SynthEngine {
    config: PianoConfig,
    mixer: Mixer,
    voices: Vec<(ToneId, Voice)>,
    /// Ordered by frame; commands for the same frame keep submission order.
    pending: VecDeque<Scheduled>,
    clock: u64,
    next_tone: u64,
}

impl SynthEngine {
    pub fn new(config: PianoConfig) -> Self {
        SynthEngine {
            mixer: Mixer::new(config.master_gain),
            config,
            voices: Vec::new(),
            pending: VecDeque::new(),
            clock: 0,
            next_tone: 0,
        }
    }

    /// Voices currently producing sound, fading ones included.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Render the next `out.len()` mono frames.
    pub fn render(&mut self, out: &mut [f32]) {
        self.mixer.clear(out.len());
        for i in 0..out.len() {
            self.apply_due();
            for (_, voice) in self.voices.iter_mut() {
                self.mixer.add(i, voice.next_sample());
            }
            self.clock += 1;
        }
        self.voices.retain(|(_, v)| !v.is_finished());
        self.mixer.write_to(out);
    }

    /// Render `frames` mono frames into a new buffer.
    pub fn render_frames(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.render(&mut out);
        out
    }

    fn frame_at(&self, at: f64) -> u64 {
        let frame = (at * self.config.sample_rate).round();
        if frame <= self.clock as f64 {
            self.clock
        } else {
            frame as u64
        }
    }

    fn schedule(&mut self, frame: u64, command: Command) {
        let idx = self.pending.partition_point(|s| s.frame <= frame);
        self.pending.insert(idx, Scheduled { frame, command });
    }

    fn pending_starts(&self) -> usize {
        self.pending
            .iter()
            .filter(|s| matches!(s.command, Command::Start { .. }))
            .count()
    }

    fn pending_start_frame(&self, tone: ToneId) -> Option<u64> {
        self.pending.iter().find_map(|s| match s.command {
            Command::Start { tone: t, .. } if t == tone => Some(s.frame),
            _ => None,
        })
    }

    fn apply_due(&mut self) {
        while self.pending.front().is_some_and(|s| s.frame <= self.clock) {
            let Some(Scheduled { command, .. }) = self.pending.pop_front() else {
                break;
            };
            match command {
                Command::Start { tone, frequency } => {
                    self.voices.push((tone, Voice::start(&self.config, frequency)));
                }
                Command::Release { tone } => {
                    match self.voices.iter_mut().find(|(id, _)| *id == tone) {
                        Some((_, voice)) => voice.release(),
                        None => log::debug!("release for silent tone {tone:?} ignored"),
                    }
                }
            }
        }
    }
}

impl AudioHost for SynthEngine {
    type Tone = ToneId;

    fn current_time(&self) -> f64 {
        self.clock as f64 / self.config.sample_rate
    }

    fn start_tone(&mut self, frequency: f64, at: f64) -> Result<ToneId, PianoError> {
        let max = self.config.max_voices;
        if self.voices.len() + self.pending_starts() >= max {
            return Err(PianoError::VoiceLimit { max });
        }
        let tone = ToneId(self.next_tone);
        self.next_tone += 1;
        let frame = self.frame_at(at);
        log::debug!("tone {tone:?} at {frequency:.2} Hz starts on frame {frame}");
        self.schedule(frame, Command::Start { tone, frequency });
        Ok(tone)
    }

    fn release_tone(&mut self, tone: ToneId, at: f64) {
        // Never ahead of the tone's own start, or the release would find
        // no voice and the tone would hold forever.
        let frame = self.frame_at(at).max(self.pending_start_frame(tone).unwrap_or(0));
        log::debug!("tone {tone:?} releases on frame {frame}");
        self.schedule(frame, Command::Release { tone });
    }
}

impl Piano<SynthEngine> {
    /// Render the next `out.len()` frames. Silent until a gesture has
    /// opened the engine; the clock only starts running from there.
    pub fn render(&mut self, out: &mut [f32]) {
        match self.host_mut() {
            Some(engine) => engine.render(out),
            None => out.fill(0.0),
        }
    }

    pub fn render_frames(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.render(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputEvent;

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn silent_without_tones() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        let out = engine.render_frames(1024);
        assert_eq!(peak(&out), 0.0);
        assert!((engine.current_time() - 1024.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn started_tone_sounds_until_released() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        let now = engine.current_time();
        let tone = engine.start_tone(440.0, now).unwrap();

        let held = engine.render_frames(4410);
        assert!(peak(&held) > 0.15, "Held tone should be audible, peak {}", peak(&held));
        assert_eq!(engine.active_voices(), 1);

        let now = engine.current_time();
        engine.release_tone(tone, now);
        // Still fading 100 ms into the 300 ms release
        engine.render_frames(4410);
        assert_eq!(engine.active_voices(), 1);

        engine.render_frames(13230);
        assert_eq!(engine.active_voices(), 0, "Voice should be dropped after the fade");
        assert_eq!(peak(&engine.render_frames(256)), 0.0);
    }

    #[test]
    fn future_start_waits_for_its_frame() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        engine.start_tone(440.0, 0.01).unwrap();
        let before = engine.render_frames(441);
        assert_eq!(peak(&before), 0.0, "Nothing should sound before 10 ms");
        let after = engine.render_frames(4410);
        assert!(peak(&after) > 0.1);
    }

    #[test]
    fn past_timestamps_apply_immediately() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        engine.render_frames(4410);
        engine.start_tone(440.0, 0.0).unwrap();
        engine.render_frames(1);
        assert_eq!(engine.active_voices(), 1);
    }

    #[test]
    fn refuses_voices_past_the_limit() {
        let config = PianoConfig {
            max_voices: 2,
            ..PianoConfig::default()
        };
        let mut engine = SynthEngine::new(config);
        let a = engine.start_tone(261.63, 0.0).unwrap();
        engine.start_tone(293.66, 0.0).unwrap();
        assert_eq!(
            engine.start_tone(329.63, 0.0),
            Err(PianoError::VoiceLimit { max: 2 })
        );

        // A releasing voice still counts until its fade is over.
        engine.release_tone(a, 0.0);
        engine.render_frames(64);
        assert!(engine.start_tone(329.63, engine.current_time()).is_err());
        engine.render_frames(13230);
        assert!(engine.start_tone(329.63, engine.current_time()).is_ok());
    }

    #[test]
    fn release_before_a_pending_start_still_stops_the_tone() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        let tone = engine.start_tone(440.0, 0.01).unwrap();
        engine.release_tone(tone, 0.0);

        engine.render_frames(88200);
        assert_eq!(engine.active_voices(), 0, "Released tone must not hold forever");
        assert_eq!(peak(&engine.render_frames(256)), 0.0);
    }

    #[test]
    fn releasing_unknown_tone_is_ignored() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        engine.release_tone(ToneId(99), 0.0);
        let out = engine.render_frames(128);
        assert_eq!(peak(&out), 0.0);
    }

    #[test]
    fn piano_is_silent_until_a_gesture_opens_the_engine() {
        let mut piano = Piano::new(|| Ok(SynthEngine::new(PianoConfig::default())));
        let mut out = [1.0_f32; 512];
        piano.render(&mut out);
        assert_eq!(peak(&out), 0.0, "Closed piano should write silence");

        let down = InputEvent::KeyDown { key: "h".into(), repeat: false };
        assert!(piano.handle(&down).unwrap());
        let held = piano.render_frames(4410);
        assert!(peak(&held) > 0.15, "Key down should sound, peak {}", peak(&held));
        assert_eq!(piano.host().map(|e| e.active_voices()), Some(1));
    }

    #[test]
    fn two_tones_mix() {
        let mut engine = SynthEngine::new(PianoConfig::default());
        engine.start_tone(261.63, 0.0).unwrap();
        engine.start_tone(392.0, 0.0).unwrap();
        let out = engine.render_frames(4410);
        assert_eq!(engine.active_voices(), 2);
        assert!(peak(&out) > 0.3, "Two voices should exceed one voice's peak");
        assert!(peak(&out) < 1.0);
    }
}
