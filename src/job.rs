use crate::{
    backend::SynthesisBackend,
    chunker,
    config::JobConfig,
    document::{PageRange, PageSource, open_document},
    error::{JobError, SynthesisError},
    extract::{ExtractOptions, Page, extract_pages},
    progress::{ProgressEvent, ProgressSink},
    report::{ExportArtifact, JobResult},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Extracting,
    Ready,
    Converting,
    Completed,
    Failed,
}

/// One document-to-audio run. Owns its backend session for its whole life.
pub struct ConversionJob<B: SynthesisBackend> {
    config: JobConfig,
    extract_opts: ExtractOptions,
    backend: B,
    state: JobState,
    pages: Vec<Page>,
}

impl<B: SynthesisBackend> ConversionJob<B> {
    pub fn new(config: JobConfig, backend: B) -> Result<Self, JobError> {
        config.validate()?;
        Ok(Self {
            config,
            extract_opts: ExtractOptions::default(),
            backend,
            state: JobState::Idle,
            pages: Vec::new(),
        })
    }

    pub fn with_extract_options(mut self, opts: ExtractOptions) -> Self {
        self.extract_opts = opts;
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Output path for a page number.
    pub fn artifact_path(&self, page_number: u32) -> PathBuf {
        artifact_path(&self.config.out_dir, page_number, self.backend.extension())
    }

    pub fn extract(
        &mut self,
        doc: &dyn PageSource,
        range: Option<PageRange>,
        sink: &dyn ProgressSink,
    ) -> Result<usize, JobError> {
        self.expect_state("extract", JobState::Idle)?;
        self.state = JobState::Extracting;
        self.extract_from(doc, range, sink)
    }

    /// Opens `path` and extracts it. An unreadable document fails the job.
    pub fn extract_file(
        &mut self,
        path: &Path,
        range: Option<PageRange>,
        sink: &dyn ProgressSink,
    ) -> Result<usize, JobError> {
        self.expect_state("extract", JobState::Idle)?;
        self.state = JobState::Extracting;
        info!("opening {}", path.display());
        let doc = match open_document(path) {
            Ok(doc) => doc,
            Err(err) => return Err(self.fail(err.into(), sink)),
        };
        self.extract_from(doc.as_ref(), range, sink)
    }

    fn extract_from(
        &mut self,
        doc: &dyn PageSource,
        range: Option<PageRange>,
        sink: &dyn ProgressSink,
    ) -> Result<usize, JobError> {
        match extract_pages(doc, range, self.extract_opts, sink) {
            Ok(pages) => {
                info!(
                    "extracted {} of {} pages range={:?}",
                    pages.len(),
                    doc.page_count(),
                    range
                );
                self.pages = pages;
                self.state = JobState::Ready;
                Ok(self.pages.len())
            }
            Err(err) => Err(self.fail(err.into(), sink)),
        }
    }

    /// Synthesizes every extracted page in ascending order. Page failures are
    /// recorded on their artifact and the job moves on.
    pub fn convert(&mut self, sink: &dyn ProgressSink) -> Result<JobResult, JobError> {
        self.expect_state("convert", JobState::Ready)?;
        self.state = JobState::Converting;
        let started = Instant::now();

        let Self {
            config,
            backend,
            pages,
            ..
        } = &mut *self;

        info!(
            "converting {} pages engine={} rate={} chunk_size={} out={}",
            pages.len(),
            backend.name(),
            config.rate,
            config.chunk_size,
            config.out_dir.display()
        );
        sink.report(&ProgressEvent::ConversionStarted {
            pages: pages.len(),
            engine: backend.name(),
        });

        if let Err(err) = backend.configure_rate(config.rate) {
            warn!("backend rejected rate {}: {err}", config.rate);
        }

        let mut artifacts = Vec::with_capacity(pages.len());
        for page in pages.iter() {
            let path = artifact_path(&config.out_dir, page.number, backend.extension());
            let chunks = chunker::split(&page.text, config.chunk_size);
            sink.report(&ProgressEvent::PageStarted {
                page: page.number,
                chunks: chunks.len(),
                path: path.clone(),
            });

            let text = chunker::join(&chunks, backend.separator());
            let artifact = match export_page(backend, config, &text, &path) {
                Ok(()) => {
                    sink.report(&ProgressEvent::PageExported {
                        page: page.number,
                        path: path.clone(),
                    });
                    ExportArtifact::exported(page.number, path)
                }
                Err(err) => {
                    warn!("page {} failed: {err}", page.number);
                    sink.report(&ProgressEvent::PageFailed {
                        page: page.number,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                    ExportArtifact::failed(page.number, path, &err)
                }
            };
            artifacts.push(artifact);
        }

        let result = JobResult::completed(artifacts);
        sink.report(&ProgressEvent::ConversionFinished {
            succeeded: result.succeeded_count(),
            failed: result.failed_count(),
        });
        info!(
            "conversion done exported={} failed={} elapsed={:?}",
            result.succeeded_count(),
            result.failed_count(),
            started.elapsed()
        );
        self.state = JobState::Completed;
        Ok(result)
    }

    /// Extracts and converts in one go. Fatal errors come back as a failed
    /// result.
    pub fn run(
        &mut self,
        doc: &dyn PageSource,
        range: Option<PageRange>,
        sink: &dyn ProgressSink,
    ) -> JobResult {
        let outcome = self
            .extract(doc, range, sink)
            .and_then(|_| self.convert(sink));
        match outcome {
            Ok(result) => result,
            Err(err) => JobResult::failed(err.to_string()),
        }
    }

    fn expect_state(&self, operation: &'static str, want: JobState) -> Result<(), JobError> {
        if self.state != want {
            return Err(JobError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn fail(&mut self, err: JobError, sink: &dyn ProgressSink) -> JobError {
        error!("job failed: {err}");
        self.state = JobState::Failed;
        sink.report(&ProgressEvent::JobFailed {
            reason: err.to_string(),
        });
        err
    }
}

pub fn artifact_path(out_dir: &Path, page_number: u32, ext: &str) -> PathBuf {
    out_dir.join(format!("page_{page_number}.{ext}"))
}

fn export_page<B: SynthesisBackend>(
    backend: &mut B,
    config: &JobConfig,
    text: &str,
    path: &Path,
) -> Result<(), SynthesisError> {
    std::fs::create_dir_all(&config.out_dir).map_err(|source| SynthesisError::ExportIo {
        path: config.out_dir.clone(),
        source,
    })?;

    let mut attempt = 0;
    loop {
        match backend.synthesize(text, path) {
            Err(SynthesisError::Network(msg)) if attempt < config.network_retries => {
                attempt += 1;
                debug!("network error on {} (retry {attempt}): {msg}", path.display());
            }
            other => return other,
        }
    }
}
