use crate::{
    backend::{OfflineBackend, SynthesisBackend, build_backend_or_unavailable},
    config::{Config, EngineKind},
    document::{PageRange, open_document, parse_page_range},
    extract::{ExtractOptions, extract_pages},
    job::ConversionJob,
    progress::{ChannelSink, LogLine, ProgressSink, TracingSink},
    report::{JobResult, JobStatus},
    util::{ensure_dir, looks_like_url, now_rfc3339, preview},
    worker::{JobHandle, JobRunner},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "page-voice")]
#[command(about = "Convert document pages into per-page audio files")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./page-voice.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the offline engine and list its voices.
    Doctor {},
    /// Extract cleaned page text and print a summary.
    Extract {
        #[arg(long)]
        input: PathBuf,
        /// "N" or "N-M", 1-based inclusive. Omit for all pages.
        #[arg(long)]
        pages: Option<String>,
    },
    /// Extract and synthesize one audio file per page.
    Convert {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        pages: Option<String>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum)]
        engine: Option<EngineKind>,
        #[arg(long)]
        rate: Option<u32>,
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Offline engine voice id.
        #[arg(long)]
        voice: Option<String>,
        /// Remote engine language code.
        #[arg(long)]
        lang: Option<String>,
        /// Print timestamped progress lines to stderr.
        #[arg(long)]
        progress: bool,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    // Reject a malformed range before the log file is created.
    let range = match &args.cmd {
        Command::Doctor {} => None,
        Command::Extract { pages, .. } | Command::Convert { pages, .. } => {
            parse_page_range(pages.as_deref())?
        }
    };
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Extract { input, .. } => {
            validate_input(&cfg, &input)?;
            extract(&cfg, input, range)
        }
        Command::Convert {
            input,
            pages: _,
            out_dir,
            engine,
            rate,
            chunk_size,
            voice,
            lang,
            progress,
        } => {
            validate_input(&cfg, &input)?;
            if let Some(v) = out_dir {
                cfg.job.out_dir = v;
            }
            if let Some(v) = engine {
                cfg.job.engine = v;
            }
            if let Some(v) = rate {
                cfg.job.rate = v;
            }
            if let Some(v) = chunk_size {
                cfg.job.chunk_size = v;
            }
            if let Some(v) = voice {
                cfg.offline.voice = v;
            }
            if let Some(v) = lang {
                cfg.remote.lang = v;
            }
            cfg.job.validate()?;
            convert(&cfg, input, range, progress)
        }
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    for candidate in ["page-voice.toml", "page-voice.example.toml"] {
        let p = Path::new(candidate);
        if p.exists() {
            return Config::load(p);
        }
    }
    Ok(Config::default())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON result, so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(cfg.job.out_dir.join("page-voice.log"))
}

fn validate_input(cfg: &Config, input: &Path) -> Result<()> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    let offline = match OfflineBackend::new(&cfg.offline) {
        Ok(b) => serde_json::json!({
            "ok": true,
            "program": cfg.offline.program,
            "voices": b.voices(),
        }),
        Err(e) => serde_json::json!({
            "ok": false,
            "program": cfg.offline.program,
            "error": e.to_string(),
        }),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "offline": offline,
            "remote": {
                "endpoint": cfg.remote.endpoint,
                "lang": cfg.remote.lang,
            },
        }))?
    );
    Ok(())
}

fn extract(cfg: &Config, input: PathBuf, range: Option<PageRange>) -> Result<()> {
    let opts = ExtractOptions {
        normalize_unicode: cfg.extract.normalize_unicode,
    };
    let runner = JobRunner::new();
    let handle = runner.submit("extract", move || {
        let doc = open_document(&input)?;
        extract_pages(doc.as_ref(), range, opts, &TracingSink)
    })?;
    let pages = handle.wait()??;

    let listing: Vec<_> = pages
        .iter()
        .map(|p| {
            serde_json::json!({
                "page": p.number,
                "chars": p.text.chars().count(),
                "preview": preview(&p.text, cfg.extract.preview_chars),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn convert(cfg: &Config, input: PathBuf, range: Option<PageRange>, progress: bool) -> Result<()> {
    let started = now_rfc3339();
    let (sink, lines): (Arc<dyn ProgressSink>, Option<Receiver<LogLine>>) = if progress {
        let (tx, rx) = mpsc::channel();
        (Arc::new(ChannelSink::new(tx)), Some(rx))
    } else {
        (Arc::new(TracingSink), None)
    };

    let backend = build_backend_or_unavailable(cfg);
    let mut job = ConversionJob::new(cfg.job.clone(), backend)?.with_extract_options(
        ExtractOptions {
            normalize_unicode: cfg.extract.normalize_unicode,
        },
    );
    let runner = JobRunner::new();

    let extract_sink = sink.clone();
    let handle = runner.submit("extract", move || {
        let res = job.extract_file(&input, range, extract_sink.as_ref());
        (job, res)
    })?;
    let (mut job, extracted) = wait_printing(handle, lines.as_ref())?;

    let result = match extracted {
        Ok(n) => {
            info!("{n} pages ready for conversion");
            let convert_sink = sink.clone();
            let handle = runner.submit("convert", move || job.convert(convert_sink.as_ref()))?;
            wait_printing(handle, lines.as_ref())??
        }
        Err(err) => JobResult::failed(err.to_string()),
    };

    if cfg.job.write_report && result.status == JobStatus::Completed {
        let report_path = cfg.job.out_dir.join("report.json");
        ensure_dir(&cfg.job.out_dir)?;
        let report = serde_json::json!({
            "started": started,
            "finished": now_rfc3339(),
            "engine": cfg.job.engine,
            "result": &result,
        });
        if let Err(e) = std::fs::write(&report_path, serde_json::to_string_pretty(&report)?) {
            warn!("could not write {}: {e}", report_path.display());
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": result.status,
            "out_dir": cfg.job.out_dir,
            "exported": result.succeeded_count(),
            "failed": result.failed_count(),
            "failure": result.failure,
        }))?
    );

    match result.failure {
        Some(reason) => Err(anyhow!(reason)),
        None => Ok(()),
    }
}

/// Waits for `handle`, echoing progress lines to stderr when a channel is
/// attached.
fn wait_printing<T>(handle: JobHandle<T>, lines: Option<&Receiver<LogLine>>) -> Result<T> {
    let Some(rx) = lines else {
        return Ok(handle.wait()?);
    };
    loop {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(line) => eprintln!("{line}"),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        if let Some(out) = handle.try_wait()? {
            for line in rx.try_iter() {
                eprintln!("{line}");
            }
            return Ok(out);
        }
    }
}
