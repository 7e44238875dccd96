pub mod offline;
pub mod remote;
pub mod types;
pub mod unavailable;

use crate::config::{Config, EngineKind};
use crate::error::SynthesisError;
use std::path::Path;

pub use offline::OfflineBackend;
pub use remote::RemoteBackend;
pub use types::Voice;
pub use unavailable::UnavailableBackend;

/// A text-to-speech engine session. Not reentrant: one job drives it at a
/// time.
pub trait SynthesisBackend: Send {
    fn name(&self) -> &'static str;

    /// File extension of the audio this backend writes.
    fn extension(&self) -> &'static str;

    /// Separator used when a page's chunks are joined into one request.
    fn separator(&self) -> &'static str;

    fn configure_rate(&mut self, _rate: u32) -> Result<(), SynthesisError> {
        Ok(())
    }

    fn configure_voice(&mut self, _id: &str) -> Result<(), SynthesisError> {
        Ok(())
    }

    fn voices(&self) -> &[Voice] {
        &[]
    }

    /// Writes the audio for `text` to `dest`. On failure `dest` may or may
    /// not exist.
    fn synthesize(&mut self, text: &str, dest: &Path) -> Result<(), SynthesisError>;
}

impl<B: SynthesisBackend + ?Sized> SynthesisBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }
    fn extension(&self) -> &'static str {
        (**self).extension()
    }
    fn separator(&self) -> &'static str {
        (**self).separator()
    }
    fn configure_rate(&mut self, rate: u32) -> Result<(), SynthesisError> {
        (**self).configure_rate(rate)
    }
    fn configure_voice(&mut self, id: &str) -> Result<(), SynthesisError> {
        (**self).configure_voice(id)
    }
    fn voices(&self) -> &[Voice] {
        (**self).voices()
    }
    fn synthesize(&mut self, text: &str, dest: &Path) -> Result<(), SynthesisError> {
        (**self).synthesize(text, dest)
    }
}

pub fn build_backend(cfg: &Config) -> Result<Box<dyn SynthesisBackend>, SynthesisError> {
    match cfg.job.engine {
        EngineKind::Offline => Ok(Box::new(OfflineBackend::new(&cfg.offline)?)),
        EngineKind::Remote => Ok(Box::new(RemoteBackend::new(&cfg.remote)?)),
    }
}

/// Like [`build_backend`], but a construction failure yields a backend that
/// fails each page with `NotInitialized` instead of aborting the job.
pub fn build_backend_or_unavailable(cfg: &Config) -> Box<dyn SynthesisBackend> {
    build_backend(cfg).unwrap_or_else(|err| {
        tracing::warn!("{:?} engine unavailable: {err}", cfg.job.engine);
        Box::new(UnavailableBackend::new(cfg.job.engine, err.to_string()))
    })
}
