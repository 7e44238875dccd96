use super::SynthesisBackend;
use crate::config::EngineKind;
use crate::error::SynthesisError;
use std::path::Path;

/// Stands in for an engine that could not be constructed. Every page fails
/// with `NotInitialized`.
pub struct UnavailableBackend {
    kind: EngineKind,
    reason: String,
}

impl UnavailableBackend {
    pub fn new(kind: EngineKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl SynthesisBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        match self.kind {
            EngineKind::Offline => "offline",
            EngineKind::Remote => "remote",
        }
    }

    fn extension(&self) -> &'static str {
        match self.kind {
            EngineKind::Offline => "wav",
            EngineKind::Remote => "mp3",
        }
    }

    fn separator(&self) -> &'static str {
        match self.kind {
            EngineKind::Offline => "\n\n",
            EngineKind::Remote => " ",
        }
    }

    fn synthesize(&mut self, _text: &str, _dest: &Path) -> Result<(), SynthesisError> {
        Err(SynthesisError::NotInitialized(self.reason.clone()))
    }
}
