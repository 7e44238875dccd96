//! Progress reporting.
//!
//! Sinks receive events in pipeline order. A sink can display, forward or
//! drop them; nothing it does is observed by the pipeline.

use crate::error::FailureKind;
use crate::util::now_rfc3339;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    PageExtracted { page: u32, chars: usize },
    PageSkipped { page: u32 },
    ExtractionFinished { pages: usize },
    ConversionStarted { pages: usize, engine: &'static str },
    PageStarted { page: u32, chunks: usize, path: PathBuf },
    PageExported { page: u32, path: PathBuf },
    PageFailed { page: u32, kind: FailureKind, message: String },
    ConversionFinished { succeeded: usize, failed: usize },
    JobFailed { reason: String },
}

impl ProgressEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PageFailed { .. } | Self::JobFailed { .. })
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageExtracted { page, chars } => write!(f, "Page {page}: {chars} chars"),
            Self::PageSkipped { page } => write!(f, "Page {page}: (empty) skipped"),
            Self::ExtractionFinished { pages } => {
                write!(f, "Extraction complete: {pages} pages")
            }
            Self::ConversionStarted { pages, engine } => {
                write!(f, "Starting conversion of {pages} pages via {engine}")
            }
            Self::PageStarted { page, chunks, path } => write!(
                f,
                "Saving page {page} ({chunks} chunks) -> {}",
                path.display()
            ),
            Self::PageExported { page, path } => {
                write!(f, "Page {page} exported: {}", path.display())
            }
            Self::PageFailed {
                page,
                kind,
                message,
            } => write!(f, "Error saving page {page} ({kind:?}): {message}"),
            Self::ConversionFinished { succeeded, failed } => write!(
                f,
                "Conversion finished: {succeeded} exported, {failed} failed"
            ),
            Self::JobFailed { reason } => write!(f, "Job failed: {reason}"),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&self, _event: &ProgressEvent) {}
}

/// Forwards events to the `tracing` subscriber.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn report(&self, event: &ProgressEvent) {
        if event.is_failure() {
            warn!(target: "page_voice::progress", "{event}");
        } else {
            info!(target: "page_voice::progress", "{event}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub at: String,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at, self.message)
    }
}

/// Timestamps events and sends them over a channel. A closed receiver is
/// ignored.
pub struct ChannelSink {
    tx: Sender<LogLine>,
}

impl ChannelSink {
    pub fn new(tx: Sender<LogLine>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, event: &ProgressEvent) {
        let _ = self.tx.send(LogLine {
            at: now_rfc3339(),
            message: event.to_string(),
        });
    }
}
