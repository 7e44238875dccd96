pub mod backend;
pub mod chunker;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod job;
pub mod progress;
pub mod report;
pub mod util;
pub mod worker;

pub use error::{DocumentError, FailureKind, JobError, SynthesisError};
