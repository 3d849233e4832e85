//! Voice: one oscillator shaped by its key envelope.

use crate::config::PianoConfig;

use super::envelope::Envelope;
use super::oscillator::Oscillator;

#[derive(Debug, Clone)]
pub struct Voice {
    pub oscillator: Oscillator,
    pub envelope: Envelope,
}

impl Voice {
    /// A gated voice at `frequency`, shaped by the configured waveform
    /// and envelope.
    pub fn start(config: &PianoConfig, frequency: f64) -> Self {
        let mut envelope = Envelope::new(&config.envelope, config.sample_rate);
        envelope.gate_on();
        Voice {
            oscillator: Oscillator::new(config.waveform, frequency, config.sample_rate),
            envelope,
        }
    }

    pub fn release(&mut self) {
        self.envelope.gate_off();
    }

    pub fn next_sample(&mut self) -> f64 {
        if self.envelope.is_finished() {
            return 0.0;
        }
        let gain = self.envelope.next_sample();
        self.oscillator.next_sample() * gain
    }

    /// The release has run out and the voice can be dropped.
    pub fn is_finished(&self) -> bool {
        self.envelope.is_finished()
    }
}
