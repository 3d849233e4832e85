//! Key envelope: linear fade-in to a peak, settle to a held level, and a
//! linear fade-out from wherever the level is when the key is let go.

use crate::config::EnvelopeConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    /// Seconds from silence to `peak`.
    pub attack: f64,
    /// Seconds from `peak` down to `sustain`.
    pub decay: f64,
    pub peak: f64,
    pub sustain: f64,
    /// Seconds from the release level down to silence.
    pub release: f64,

    stage: Stage,
    level: f64,
    sample_rate: f64,
    stage_len: usize,
    stage_pos: usize,
    /// Level the current ramp started from.
    from: f64,
}

impl Envelope {
    pub fn new(config: &EnvelopeConfig, sample_rate: f64) -> Self {
        Envelope {
            attack: config.attack,
            decay: config.decay,
            peak: config.peak,
            sustain: config.sustain,
            release: config.release,
            stage: Stage::Idle,
            level: 0.0,
            sample_rate,
            stage_len: 0,
            stage_pos: 0,
            from: 0.0,
        }
    }

    pub fn gate_on(&mut self) {
        self.enter(Stage::Attack, self.attack);
    }

    pub fn gate_off(&mut self) {
        if self.stage == Stage::Idle || self.stage == Stage::Release {
            return;
        }
        self.enter(Stage::Release, self.release);
    }

    /// True once a release has run out (or before the first gate).
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Idle
    }

    pub fn next_sample(&mut self) -> f64 {
        match self.stage {
            Stage::Idle => self.level = 0.0,
            Stage::Sustain => self.level = self.sustain,
            Stage::Attack => {
                if self.ramp(self.peak) {
                    self.enter(Stage::Decay, self.decay);
                }
            }
            Stage::Decay => {
                if self.ramp(self.sustain) {
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Release => {
                if self.ramp(0.0) {
                    self.stage = Stage::Idle;
                }
            }
        }
        self.level
    }

    fn enter(&mut self, stage: Stage, seconds: f64) {
        self.stage = stage;
        self.stage_len = (seconds * self.sample_rate).round() as usize;
        self.stage_pos = 0;
        self.from = self.level;
    }

    /// Step the current linear ramp towards `target`. Returns true when the
    /// ramp has landed on it.
    fn ramp(&mut self, target: f64) -> bool {
        if self.stage_pos >= self.stage_len {
            self.level = target;
            return true;
        }
        let t = self.stage_pos as f64 / self.stage_len as f64;
        self.level = self.from + (target - self.from) * t;
        self.stage_pos += 1;
        if self.stage_pos >= self.stage_len {
            self.level = target;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 44100.0;

    fn default_env() -> Envelope {
        Envelope::new(&EnvelopeConfig::default(), SR)
    }

    #[test]
    fn idle_until_gated() {
        let mut env = default_env();
        assert!(env.is_finished());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn fades_in_to_peak_then_settles() {
        let mut env = default_env();
        env.gate_on();

        // 10 ms attack
        let first = env.next_sample();
        assert_eq!(first, 0.0, "Attack should start from silence");
        let mut max_level: f64 = 0.0;
        for _ in 0..441 {
            max_level = max_level.max(env.next_sample());
        }
        assert!((max_level - 0.3).abs() < 1e-9, "Peak should be 0.3, got {max_level}");

        // 100 ms after the start it holds at 0.2
        for _ in 0..4000 {
            env.next_sample();
        }
        let s = env.next_sample();
        assert!((s - 0.2).abs() < 1e-9, "Should hold at 0.2, got {s}");
        assert!(!env.is_finished());
    }

    #[test]
    fn attack_is_linear() {
        let mut env = default_env();
        env.gate_on();
        let samples: Vec<f64> = (0..200).map(|_| env.next_sample()).collect();
        let step = samples[1] - samples[0];
        for w in samples.windows(2) {
            assert!((w[1] - w[0] - step).abs() < 1e-12, "Attack should rise linearly");
        }
    }

    #[test]
    fn release_fades_to_silence() {
        let mut env = default_env();
        env.gate_on();
        for _ in 0..10_000 {
            env.next_sample();
        }
        env.gate_off();
        assert_eq!(env.stage, Stage::Release);

        // 300 ms release
        let mut prev = env.level;
        for _ in 0..13_230 {
            let s = env.next_sample();
            assert!(s <= prev + 1e-12, "Release should never rise");
            prev = s;
        }
        assert!(env.is_finished(), "Should be idle after the release");
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn release_during_attack_starts_from_current_level() {
        let mut env = default_env();
        env.gate_on();
        for _ in 0..100 {
            env.next_sample();
        }
        let level = env.level;
        assert!(level > 0.0 && level < 0.3);

        env.gate_off();
        let s = env.next_sample();
        assert!((s - level).abs() < 1e-12, "Release should start at {level}, got {s}");
    }

    #[test]
    fn gate_off_while_releasing_does_not_restart() {
        let mut env = default_env();
        env.gate_on();
        for _ in 0..5000 {
            env.next_sample();
        }
        env.gate_off();
        for _ in 0..6615 {
            env.next_sample();
        }
        env.gate_off();
        for _ in 0..6615 {
            env.next_sample();
        }
        assert!(env.is_finished(), "Second gate_off must not extend the release");
    }

    #[test]
    fn zero_length_stages_jump() {
        let config = EnvelopeConfig {
            attack: 0.0,
            decay: 0.0,
            release: 0.0,
            ..EnvelopeConfig::default()
        };
        let mut env = Envelope::new(&config, SR);
        env.gate_on();
        assert_eq!(env.next_sample(), 0.3);
        assert_eq!(env.next_sample(), 0.2);
        env.gate_off();
        assert_eq!(env.next_sample(), 0.0);
        assert!(env.is_finished());
    }
}
