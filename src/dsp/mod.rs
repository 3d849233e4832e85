//! DSP engine: pure Rust tone synthesis.
//!
//! The same code feeds the browser (an AudioWorklet pulling samples over
//! WASM) and the offline WAV renderer.

pub mod engine;
pub mod envelope;
pub mod mixer;
pub mod oscillator;
pub mod renderer;
pub mod voice;
