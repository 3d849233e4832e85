use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PianoError {
    /// A tone was requested before the audio context was created.
    ContextUnavailable,
    UnknownNote(String),
    VoiceLimit { max: usize },
    InvalidConfig(String),
    Io(String),
}

impl fmt::Display for PianoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PianoError::ContextUnavailable => write!(f, "Audio context has not been created yet"),
            PianoError::UnknownNote(name) => write!(f, "Unknown note '{name}'"),
            PianoError::VoiceLimit { max } => write!(f, "Voice limit of {max} reached"),
            PianoError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
            PianoError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PianoError {}

impl From<serde_json::Error> for PianoError {
    fn from(e: serde_json::Error) -> Self {
        PianoError::InvalidConfig(e.to_string())
    }
}

impl From<std::io::Error> for PianoError {
    fn from(e: std::io::Error) -> Self {
        PianoError::Io(e.to_string())
    }
}
