use super::{SynthesisBackend, types::Voice};
use crate::config::Offline;
use crate::error::SynthesisError;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Drives a local `espeak-ng` compatible program. Voices are listed once at
/// construction.
pub struct OfflineBackend {
    program: PathBuf,
    voices: Vec<Voice>,
    voice: Option<String>,
    rate: u32,
    amplitude: u32,
    timeout: Option<Duration>,
}

impl OfflineBackend {
    pub fn new(cfg: &Offline) -> Result<Self, SynthesisError> {
        let program = PathBuf::from(cfg.program.trim());
        if program.as_os_str().is_empty() {
            return Err(SynthesisError::NotInitialized(
                "offline.program is empty".into(),
            ));
        }

        let output = Command::new(&program)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                SynthesisError::NotInitialized(format!("spawning {}: {e}", program.display()))
            })?;
        if !output.status.success() {
            return Err(SynthesisError::NotInitialized(format!(
                "{} --voices failed: {}",
                program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!(program = %program.display(), voices = voices.len(), "offline engine ready");

        let mut backend = Self {
            program,
            voices,
            voice: None,
            rate: 160,
            amplitude: amplitude_for(cfg.volume),
            timeout: (cfg.timeout_seconds > 0).then(|| Duration::from_secs(cfg.timeout_seconds)),
        };
        if !cfg.voice.trim().is_empty() {
            backend
                .configure_voice(cfg.voice.trim())
                .map_err(|e| SynthesisError::NotInitialized(e.to_string()))?;
        }
        Ok(backend)
    }

    pub fn args(&self, dest: &Path) -> Vec<String> {
        let mut args = vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            self.amplitude.to_string(),
        ];
        if let Some(v) = &self.voice {
            args.push("-v".into());
            args.push(v.clone());
        }
        args.push("-w".into());
        args.push(dest.display().to_string());
        args.push("--stdin".into());
        args
    }
}

/// Maps a 0.0..=1.0 volume onto espeak amplitude, where 100 is the engine
/// default.
pub fn amplitude_for(volume: f32) -> u32 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Parses the table printed by `espeak-ng --voices`.
pub fn parse_voice_list(raw: &str) -> Vec<Voice> {
    raw.lines()
        .skip_while(|l| !l.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 4 {
                return None;
            }
            let gender = cols[2]
                .split_once('/')
                .map(|(_, g)| g.to_string())
                .filter(|g| !g.is_empty() && g != "-");
            Some(Voice {
                id: cols[1].to_string(),
                name: cols[3].replace('_', " "),
                gender,
            })
        })
        .collect()
}

impl SynthesisBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn extension(&self) -> &'static str {
        "wav"
    }

    fn separator(&self) -> &'static str {
        "\n\n"
    }

    fn configure_rate(&mut self, rate: u32) -> Result<(), SynthesisError> {
        self.rate = rate;
        Ok(())
    }

    fn configure_voice(&mut self, id: &str) -> Result<(), SynthesisError> {
        let known = self.voices.is_empty()
            || self
                .voices
                .iter()
                .any(|v| v.id.eq_ignore_ascii_case(id) || v.name.eq_ignore_ascii_case(id));
        if !known {
            return Err(SynthesisError::Engine(format!("unknown voice: {id}")));
        }
        self.voice = Some(id.to_string());
        Ok(())
    }

    fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn synthesize(&mut self, text: &str, dest: &Path) -> Result<(), SynthesisError> {
        let args = self.args(dest);
        debug!("offline run {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SynthesisError::Engine(format!("spawning {}: {e}", self.program.display())))?;

        // stdin drops after the write so the engine sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(text.as_bytes())
                .map_err(|e| format!("writing text to engine: {e}")),
            None => Err("no stdin".to_string()),
        };
        if let Err(msg) = written {
            let _ = child.kill();
            let (_, stderr) = wait_with_timeout(&mut child, self.timeout)?;
            return Err(SynthesisError::Engine(format!(
                "{msg}; stderr: {}",
                stderr.trim()
            )));
        }

        let (status, stderr) = wait_with_timeout(&mut child, self.timeout)?;
        if !status.success() {
            return Err(SynthesisError::Engine(format!(
                "{} exited with {status}: {}",
                self.program.display(),
                stderr.trim()
            )));
        }
        if !dest.is_file() {
            return Err(SynthesisError::Engine(format!(
                "engine reported success but wrote no file: {}",
                dest.display()
            )));
        }
        Ok(())
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<(ExitStatus, String), SynthesisError> {
    // Drain stderr while waiting so a chatty engine can't block on a full pipe.
    let stderr_reader = child.stderr.take();
    let stderr_thread = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            let _ = err.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    });
    let join_stderr = |t: std::thread::JoinHandle<String>| t.join().unwrap_or_default();

    let start = Instant::now();
    loop {
        let polled = child
            .try_wait()
            .map_err(|e| SynthesisError::Engine(format!("try_wait: {e}")))?;
        if let Some(status) = polled {
            return Ok((status, join_stderr(stderr_thread)));
        }

        if let Some(limit) = timeout {
            if start.elapsed() > limit {
                warn!("offline engine timed out after {:?}", limit);
                let _ = child.kill();
                let _ = child.wait();
                let stderr = join_stderr(stderr_thread);
                return Err(SynthesisError::Engine(format!(
                    "engine exceeded timeout ({limit:?}); stderr: {}",
                    stderr.trim()
                )));
            }
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
