pub mod config;
pub mod dsp;
pub mod error;
pub mod host;
pub mod input;
pub mod notes;
pub mod piano;

use crate::config::PianoConfig;
use crate::dsp::engine::SynthEngine;
use crate::error::PianoError;
use crate::input::InputEvent;
use crate::notes::PitchClass;
use crate::piano::Piano;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the crate version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: the note table, as `[{note, frequency, isSharp}]`.
#[wasm_bindgen(js_name = notes)]
pub fn note_table() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&notes::NOTES[..]).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn js_err(e: PianoError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed piano. The page forwards its DOM events here and an
/// AudioWorklet pulls samples with [`WebPiano::render`].
#[wasm_bindgen]
pub struct WebPiano {
    piano: Piano<SynthEngine>,
    sample_rate: f64,
}

#[wasm_bindgen]
impl WebPiano {
    /// `config` is an optional `PianoConfig` object; `undefined` or `null`
    /// selects the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WebPiano, JsValue> {
        let config: PianoConfig = if config.is_undefined() || config.is_null() {
            PianoConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| js_err(PianoError::InvalidConfig(format!("{e}"))))?
        };
        config.validate().map_err(js_err)?;

        let sample_rate = config.sample_rate;
        let tuning_pitch = config.tuning_pitch;
        let piano = Piano::new(move || Ok(SynthEngine::new(config.clone()))).with_tuning(tuning_pitch);
        Ok(WebPiano { piano, sample_rate })
    }

    /// Dispatch a tagged event object, e.g. `{type: "keyDown", key: "a"}`.
    /// Returns true when the pressed keys changed.
    pub fn handle_event(&mut self, event: JsValue) -> Result<bool, JsValue> {
        let event: InputEvent =
            serde_wasm_bindgen::from_value(event).map_err(|e| JsValue::from_str(&format!("{e}")))?;
        self.dispatch(event)
    }

    pub fn click(&mut self) -> Result<bool, JsValue> {
        self.dispatch(InputEvent::Click)
    }

    pub fn key_down(&mut self, key: String, repeat: bool) -> Result<bool, JsValue> {
        self.dispatch(InputEvent::KeyDown { key, repeat })
    }

    pub fn key_up(&mut self, key: String) -> Result<bool, JsValue> {
        self.dispatch(InputEvent::KeyUp { key })
    }

    pub fn mouse_down(&mut self, note: &str) -> Result<bool, JsValue> {
        let note = parse_note(note)?;
        self.dispatch(InputEvent::MouseDown { note })
    }

    pub fn mouse_up(&mut self, note: &str) -> Result<bool, JsValue> {
        let note = parse_note(note)?;
        self.dispatch(InputEvent::MouseUp { note })
    }

    pub fn mouse_leave(&mut self, note: &str) -> Result<bool, JsValue> {
        let note = parse_note(note)?;
        self.dispatch(InputEvent::MouseLeave { note })
    }

    pub fn touch_start(&mut self, note: &str) -> Result<bool, JsValue> {
        let note = parse_note(note)?;
        self.dispatch(InputEvent::TouchStart { note })
    }

    pub fn touch_end(&mut self, note: &str) -> Result<bool, JsValue> {
        let note = parse_note(note)?;
        self.dispatch(InputEvent::TouchEnd { note })
    }

    /// Render the next `frames` mono samples. Silent until the first
    /// gesture has opened the audio context.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        self.piano.render_frames(frames)
    }

    pub fn is_ready(&self) -> bool {
        self.piano.is_ready()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Render state for each key: `[{note, isSharp, pressed, shortcut, className}]`.
    pub fn keys(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.piano.keys()).map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    pub fn pressed_notes(&self) -> Vec<String> {
        self.piano.pressed().map(|n| n.to_string()).collect()
    }
}

impl WebPiano {
    fn dispatch(&mut self, event: InputEvent) -> Result<bool, JsValue> {
        self.piano.handle(&event).map_err(js_err)
    }
}

fn parse_note(note: &str) -> Result<PitchClass, JsValue> {
    note.parse().map_err(js_err)
}
