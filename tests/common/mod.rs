#![allow(dead_code)]

use page_voice::backend::SynthesisBackend;
use page_voice::error::SynthesisError;
use page_voice::progress::{ProgressEvent, ProgressSink};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub text: String,
    pub dest: PathBuf,
}

/// What a scripted page does on each attempt.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Network,
    Engine,
    /// Network error for the first `n` attempts, then success.
    NetworkTimes(usize),
}

/// In-memory backend. Fails pages listed in `script`, writes a small file
/// for everything else.
#[derive(Clone, Default)]
pub struct FakeBackend {
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub rate: Arc<Mutex<Option<u32>>>,
    script: HashMap<u32, Script>,
    attempts: Arc<Mutex<HashMap<u32, usize>>>,
    separator: &'static str,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            separator: "\n\n",
            ..Default::default()
        }
    }

    pub fn with_separator(mut self, separator: &'static str) -> Self {
        self.separator = separator;
        self
    }

    pub fn script(mut self, page: u32, what: Script) -> Self {
        self.script.insert(page, what);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

fn page_of(dest: &Path) -> u32 {
    dest.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("page_"))
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

impl SynthesisBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    fn separator(&self) -> &'static str {
        self.separator
    }

    fn configure_rate(&mut self, rate: u32) -> Result<(), SynthesisError> {
        *self.rate.lock().unwrap() = Some(rate);
        Ok(())
    }

    fn synthesize(&mut self, text: &str, dest: &Path) -> Result<(), SynthesisError> {
        self.calls.lock().unwrap().push(Call {
            text: text.to_string(),
            dest: dest.to_path_buf(),
        });
        let page = page_of(dest);
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(page).or_insert(0);
            *n += 1;
            *n
        };
        match self.script.get(&page) {
            Some(Script::Network) => return Err(SynthesisError::Network("connection reset".into())),
            Some(Script::Engine) => return Err(SynthesisError::Engine("bad input".into())),
            Some(Script::NetworkTimes(n)) if attempt <= *n => {
                return Err(SynthesisError::Network("timed out".into()));
            }
            _ => {}
        }
        std::fs::write(dest, text.as_bytes()).map_err(|source| SynthesisError::ExportIo {
            path: dest.to_path_buf(),
            source,
        })
    }
}
