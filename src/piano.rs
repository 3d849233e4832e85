//! The piano: input dispatch and the per-note tone registry.
//!
//! Browsers refuse to open audio output before the user has interacted with
//! the page, so the host is built lazily by the first gesture. Every input
//! funnels into two operations, [`Piano::press`] and [`Piano::release`].
//! A note is pressed exactly while the registry holds a tone for it; a
//! press on a held note is dropped instead of retriggering.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::PianoError;
use crate::host::AudioHost;
use crate::input::InputEvent;
use crate::notes::{self, NOTES, PitchClass};

type Connect<H> = Box<dyn FnMut() -> Result<H, PianoError>>;

pub struct Piano<H: AudioHost> {
    connect: Connect<H>,
    host: Option<H>,
    active: BTreeMap<PitchClass, H::Tone>,
    tuning_pitch: Option<f64>,
}

/// Render state of one on-screen key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyView {
    pub note: PitchClass,
    pub is_sharp: bool,
    pub pressed: bool,
    /// Computer key that plays this note.
    pub shortcut: Option<char>,
    pub class_name: String,
}

impl<H: AudioHost> Piano<H> {
    /// `connect` opens the audio host. It runs on the first user gesture,
    /// and again on later gestures only if it failed.
    pub fn new(connect: impl FnMut() -> Result<H, PianoError> + 'static) -> Self {
        Piano {
            connect: Box::new(connect),
            host: None,
            active: BTreeMap::new(),
            tuning_pitch: None,
        }
    }

    /// Tune notes by equal temperament against this A4 instead of the
    /// fixed table.
    pub fn with_tuning(mut self, tuning_pitch: Option<f64>) -> Self {
        self.tuning_pitch = tuning_pitch;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.host.is_some()
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    /// Open the audio host if it isn't open yet.
    pub fn ensure_context(&mut self) -> Result<(), PianoError> {
        if self.host.is_some() {
            return Ok(());
        }
        match (self.connect)() {
            Ok(host) => {
                log::info!("audio context created");
                self.host = Some(host);
                Ok(())
            }
            Err(e) => {
                log::warn!("audio context unavailable: {e}");
                Err(e)
            }
        }
    }

    /// Start `note`. Returns false if it was already sounding.
    pub fn press(&mut self, note: PitchClass) -> Result<bool, PianoError> {
        let Some(host) = self.host.as_mut() else {
            return Err(PianoError::ContextUnavailable);
        };
        if self.active.contains_key(&note) {
            return Ok(false);
        }

        let frequency = notes::frequency_of(note, self.tuning_pitch);
        let now = host.current_time();
        let tone = host.start_tone(frequency, now).inspect_err(|e| {
            log::warn!("{note} not started: {e}");
        })?;
        self.active.insert(note, tone);
        log::debug!("{note} on ({frequency:.2} Hz)");
        Ok(true)
    }

    /// Fade out and forget `note`. Returns false if it wasn't sounding.
    pub fn release(&mut self, note: PitchClass) -> bool {
        let Some(tone) = self.active.remove(&note) else {
            return false;
        };
        if let Some(host) = self.host.as_mut() {
            let now = host.current_time();
            host.release_tone(tone, now);
        }
        log::debug!("{note} off");
        true
    }

    /// Dispatch one input event. Returns whether the set of pressed notes
    /// changed.
    pub fn handle(&mut self, event: &InputEvent) -> Result<bool, PianoError> {
        if event.is_gesture() {
            self.ensure_context()?;
        }
        match event {
            InputEvent::Click => Ok(false),
            InputEvent::KeyDown { key, repeat } => match notes::note_for_key(key) {
                Some(note) if !*repeat => self.press(note),
                _ => Ok(false),
            },
            InputEvent::KeyUp { key } => {
                Ok(notes::note_for_key(key).is_some_and(|note| self.release(note)))
            }
            InputEvent::MouseDown { note } | InputEvent::TouchStart { note } => self.press(*note),
            InputEvent::MouseUp { note }
            | InputEvent::MouseLeave { note }
            | InputEvent::TouchEnd { note } => Ok(self.release(*note)),
        }
    }

    pub fn is_pressed(&self, note: PitchClass) -> bool {
        self.active.contains_key(&note)
    }

    /// Pressed notes in pitch order.
    pub fn pressed(&self) -> impl Iterator<Item = PitchClass> + '_ {
        self.active.keys().copied()
    }

    /// One view per key, in keyboard order.
    pub fn keys(&self) -> Vec<KeyView> {
        NOTES
            .iter()
            .map(|n| {
                let pressed = self.is_pressed(n.pitch);
                let mut class_name =
                    String::from(if n.is_sharp { "key sharpKey" } else { "key naturalKey" });
                if pressed {
                    class_name.push_str(" pressed");
                }
                KeyView {
                    note: n.pitch,
                    is_sharp: n.is_sharp,
                    pressed,
                    shortcut: notes::key_for_note(n.pitch),
                    class_name,
                }
            })
            .collect()
    }
}
