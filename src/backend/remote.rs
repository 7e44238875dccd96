use super::SynthesisBackend;
use crate::chunker;
use crate::config::Remote;
use crate::error::SynthesisError;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Longest text the translate endpoint accepts in one request.
pub const MAX_REQUEST_CHARS: usize = 100;

/// Google Translate text-to-speech. Every `synthesize` call is a fresh set
/// of requests; nothing is retried here.
pub struct RemoteBackend {
    client: Client,
    endpoint: String,
    lang: String,
}

impl RemoteBackend {
    pub fn new(cfg: &Remote) -> Result<Self, SynthesisError> {
        if cfg.lang.trim().is_empty() {
            return Err(SynthesisError::NotInitialized("remote.lang is empty".into()));
        }
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if cfg.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(cfg.timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SynthesisError::NotInitialized(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            lang: cfg.lang.trim().to_string(),
        })
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    fn fetch(&self, piece: &str, idx: usize, total: usize) -> Result<Vec<u8>, SynthesisError> {
        let textlen = piece.chars().count().to_string();
        let (idx, total) = (idx.to_string(), total.to_string());
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", piece),
                ("textlen", textlen.as_str()),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
            ])
            .send()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let body = resp
            .bytes()
            .map_err(|e| SynthesisError::Network(format!("reading response: {e}")))?;
        Ok(body.to_vec())
    }
}

/// Server-side and rate-limit statuses count as network failures.
pub fn status_error(status: StatusCode) -> SynthesisError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        SynthesisError::Network(format!("HTTP {status}"))
    } else {
        SynthesisError::Engine(format!("HTTP {status}"))
    }
}

/// Splits `text` into request-sized pieces on whitespace, dropping blank
/// pieces.
pub fn request_pieces(text: &str) -> Vec<String> {
    chunker::split(text, MAX_REQUEST_CHARS)
        .into_iter()
        .map(|c| c.text.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl SynthesisBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn extension(&self) -> &'static str {
        "mp3"
    }

    fn separator(&self) -> &'static str {
        " "
    }

    fn synthesize(&mut self, text: &str, dest: &Path) -> Result<(), SynthesisError> {
        let pieces = request_pieces(text);
        if pieces.is_empty() {
            return Err(SynthesisError::Engine("no text to speak".into()));
        }
        debug!(requests = pieces.len(), lang = %self.lang, "remote synthesize");

        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            audio.extend(self.fetch(piece, i, pieces.len())?);
        }

        let export_err = |source| SynthesisError::ExportIo {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = File::create(dest).map_err(export_err)?;
        file.write_all(&audio).map_err(export_err)?;
        file.flush().map_err(export_err)?;
        Ok(())
    }
}
