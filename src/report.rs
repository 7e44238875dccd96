use crate::error::{FailureKind, SynthesisError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// Outcome for one extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub page_number: u32,
    pub path: PathBuf,
    pub succeeded: bool,
    pub error: Option<FailureKind>,
    pub message: Option<String>,
}

impl ExportArtifact {
    pub fn exported(page_number: u32, path: PathBuf) -> Self {
        Self {
            page_number,
            path,
            succeeded: true,
            error: None,
            message: None,
        }
    }

    pub fn failed(page_number: u32, path: PathBuf, err: &SynthesisError) -> Self {
        Self {
            page_number,
            path,
            succeeded: false,
            error: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    pub artifacts: Vec<ExportArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl JobResult {
    pub fn completed(artifacts: Vec<ExportArtifact>) -> Self {
        Self {
            status: JobStatus::Completed,
            artifacts,
            failure: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            artifacts: Vec::new(),
            failure: Some(reason.into()),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.artifacts.len() - self.succeeded_count()
    }

    /// Completed with every page exported.
    pub fn is_clean(&self) -> bool {
        self.status == JobStatus::Completed && self.failed_count() == 0
    }
}
