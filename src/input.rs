//! Input events forwarded from the page.
//!
//! Serialized with a `type` tag so the browser side can post plain objects,
//! e.g. `{"type":"keyDown","key":"a","repeat":false}` or
//! `{"type":"mouseDown","note":"C#"}`.

use serde::{Deserialize, Serialize};

use crate::notes::PitchClass;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Any click on the page. Only used to open the audio context.
    Click,
    KeyDown {
        key: String,
        #[serde(default)]
        repeat: bool,
    },
    KeyUp {
        key: String,
    },
    MouseDown {
        note: PitchClass,
    },
    MouseUp {
        note: PitchClass,
    },
    MouseLeave {
        note: PitchClass,
    },
    TouchStart {
        note: PitchClass,
    },
    TouchEnd {
        note: PitchClass,
    },
}

impl InputEvent {
    /// Whether the browser counts this event as a user gesture that may
    /// unlock audio output.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            InputEvent::Click
                | InputEvent::KeyDown { .. }
                | InputEvent::MouseDown { .. }
                | InputEvent::TouchStart { .. }
        )
    }
}
