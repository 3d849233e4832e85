//! Mixer: sums voices into a block with master gain and soft clipping.

#[derive(Debug, Clone)]
pub struct Mixer {
    pub master_gain: f64,
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new(master_gain: f64) -> Self {
        Mixer {
            master_gain,
            buffer: Vec::new(),
        }
    }

    /// Start a new block of `frames` silent samples.
    pub fn clear(&mut self, frames: usize) {
        self.buffer.clear();
        self.buffer.resize(frames, 0.0);
    }

    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Write the mixed block into `out`, gained and soft clipped.
    pub fn write_to(&self, out: &mut [f32]) {
        for (dst, &s) in out.iter_mut().zip(&self.buffer) {
            *dst = soft_clip(s * self.master_gain) as f32;
        }
    }
}

fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_block() {
        let mut m = Mixer::new(1.0);
        m.clear(64);
        let mut out = [1.0_f32; 64];
        m.write_to(&mut out);
        assert!(out.iter().all(|&s| s == 0.0), "Cleared block should overwrite with silence");
    }

    #[test]
    fn sums_overlapping_voices() {
        let mut m = Mixer::new(1.0);
        m.clear(3);
        m.add(0, 0.2);
        m.add(0, 0.2);
        m.add(1, -0.3);
        m.add(7, 1.0);
        let mut out = [0.0_f32; 3];
        m.write_to(&mut out);
        assert!((out[0] as f64 - soft_clip(0.4)).abs() < 1e-6);
        assert!((out[1] as f64 - soft_clip(-0.3)).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn clips_softly() {
        let mut m = Mixer::new(2.0);
        m.clear(1);
        m.add(0, 50.0);
        let mut out = [0.0_f32; 1];
        m.write_to(&mut out);
        assert!(out[0] <= 1.0, "Soft clip should keep output <= 1.0, got {}", out[0]);
    }
}
