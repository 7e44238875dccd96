use crate::error::JobError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const RATE_RANGE: std::ops::RangeInclusive<u32> = 80..=300;
pub const CHUNK_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1000..=15000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub extract: Extract,
    #[serde(default)]
    pub offline: Offline,
    #[serde(default)]
    pub remote: Remote,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Local speech engine process, no network.
    Offline,
    /// Network text-to-speech service.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub engine: EngineKind,
    pub rate: u32,
    pub chunk_size: usize,
    pub out_dir: PathBuf,
    pub network_retries: u32,
    pub write_report: bool,
}

impl JobConfig {
    pub fn validate(&self) -> std::result::Result<(), JobError> {
        if !RATE_RANGE.contains(&self.rate) {
            return Err(JobError::Config(format!(
                "rate {} outside {}..={}",
                self.rate,
                RATE_RANGE.start(),
                RATE_RANGE.end()
            )));
        }
        if !CHUNK_SIZE_RANGE.contains(&self.chunk_size) {
            return Err(JobError::Config(format!(
                "chunk_size {} outside {}..={}",
                self.chunk_size,
                CHUNK_SIZE_RANGE.start(),
                CHUNK_SIZE_RANGE.end()
            )));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err(JobError::Config("out_dir is empty".into()));
        }
        Ok(())
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::Offline,
            rate: 160,
            chunk_size: 3500,
            out_dir: PathBuf::from("out"),
            network_retries: 0,
            write_report: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extract {
    pub normalize_unicode: bool,
    pub preview_chars: usize,
}
impl Default for Extract {
    fn default() -> Self {
        Self {
            normalize_unicode: false,
            preview_chars: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Offline {
    pub program: String,
    pub voice: String,
    pub volume: f32,
    pub timeout_seconds: u64,
}
impl Default for Offline {
    fn default() -> Self {
        Self {
            program: "espeak-ng".into(),
            voice: "".into(),
            volume: 1.0,
            timeout_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Remote {
    pub endpoint: String,
    pub lang: String,
    pub timeout_seconds: u64,
}
impl Default for Remote {
    fn default() -> Self {
        Self {
            endpoint: "https://translate.google.com/translate_tts".into(),
            lang: "en".into(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}
