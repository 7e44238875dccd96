use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any page work starts.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("cannot open document {path}: {detail}")]
    Open { path: PathBuf, detail: String },

    #[error("invalid page range {input:?}: expected \"<start>\" or \"<start>-<end>\" with 1 <= start <= end")]
    InvalidPageRange { input: String },
}

impl DocumentError {
    pub fn open(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

/// Per-page failures. Recorded on the page's artifact, never fatal to a job.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("synthesis engine not initialized: {0}")]
    NotInitialized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("cannot write {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SynthesisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotInitialized(_) => FailureKind::NotInitialized,
            Self::Network(_) => FailureKind::Network,
            Self::Engine(_) => FailureKind::Engine,
            Self::ExportIo { .. } => FailureKind::ExportIo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotInitialized,
    Network,
    Engine,
    ExportIo,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("invalid job configuration: {0}")]
    Config(String),

    #[error("cannot {operation} while job is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: crate::job::JobState,
    },

    #[error("another job is already running")]
    Busy,

    #[error("background worker exited without a result")]
    WorkerLost,
}
