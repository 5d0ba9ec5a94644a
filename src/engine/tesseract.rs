use super::{Engine, EngineDiag, EngineError, RecognizedLine, RecognizedText};
use crate::config::Config;
use crate::preprocess;
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Deterministic path: pipes the normalized image to the `tesseract` CLI
/// and reads per-line confidences back from its TSV output.
pub struct TesseractEngine {
    cfg: Config,
    exe: PathBuf,
}

impl TesseractEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let exe = resolve_tesseract_exe(&cfg.ocr.tesseract_exe);
        Ok(Self {
            cfg: cfg.clone(),
            exe,
        })
    }

    fn run_tsv(&self, png: &[u8]) -> Result<String, EngineError> {
        let mut cmd = Command::new(&self.exe);
        cmd.arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.cfg.ocr.language)
            .arg("--psm")
            .arg(self.cfg.ocr.psm.to_string())
            .arg("tsv");
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(
            "tesseract run exe={} lang={} psm={}",
            self.exe.display(),
            self.cfg.ocr.language,
            self.cfg.ocr.psm
        );

        let mut child = cmd.spawn().map_err(|e| {
            EngineError::Unavailable(format!("spawning {}: {e}", self.exe.display()))
        })?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::Unavailable("no stdin".into()))?;
            use std::io::Write;
            stdin
                .write_all(png)
                .map_err(|e| EngineError::Unavailable(format!("writing image: {e}")))?;
            // Dropping stdin closes the pipe so tesseract sees EOF.
        }

        let timeout = Duration::from_secs(self.cfg.ocr.timeout_seconds.max(1));
        let output = wait_with_timeout(&mut child, timeout)
            .map_err(|e| EngineError::Unavailable(format!("{e:#}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Unavailable(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("tesseract stderr: {}", stderr.trim());
        }

        String::from_utf8(output.stdout)
            .map_err(|e| EngineError::Unavailable(format!("non-utf8 tesseract output: {e}")))
    }
}

impl Engine for TesseractEngine {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn doctor(&self) -> Result<EngineDiag> {
        let out = Command::new(&self.exe).arg("--version").output();
        Ok(match out {
            Ok(o) if o.status.success() => {
                let combined = [o.stdout, o.stderr].concat();
                let version = String::from_utf8_lossy(&combined)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string();
                EngineDiag {
                    engine: "ocr".into(),
                    detail: version,
                    ok: true,
                    error: None,
                }
            }
            Ok(o) => EngineDiag {
                engine: "ocr".into(),
                detail: self.exe.display().to_string(),
                ok: false,
                error: Some(format!("tesseract exited with {}", o.status)),
            },
            Err(e) => EngineDiag {
                engine: "ocr".into(),
                detail: self.exe.display().to_string(),
                ok: false,
                error: Some(e.to_string()),
            },
        })
    }

    fn recognize(&self, image: &[u8]) -> Result<RecognizedText, EngineError> {
        let png = preprocess::normalize_for_ocr(&self.cfg.preprocess, image)?;
        let tsv = self.run_tsv(&png)?;
        Ok(parse_tsv(&tsv))
    }
}

/// Fold Tesseract's word-level TSV into one `RecognizedLine` per text line.
/// Line confidence is the mean word confidence, scaled from 0-100 to [0,1].
pub fn parse_tsv(tsv: &str) -> RecognizedText {
    // Columns: level page block par line word left top width height conf text
    let mut lines: Vec<RecognizedLine> = Vec::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;
    let mut words: Vec<String> = Vec::new();
    let mut confs: Vec<f32> = Vec::new();

    let mut flush =
        |words: &mut Vec<String>, confs: &mut Vec<f32>, lines: &mut Vec<RecognizedLine>| {
            if words.is_empty() {
                return;
            }
            let confidence = if confs.is_empty() {
                None
            } else {
                let mean = confs.iter().sum::<f32>() / confs.len() as f32;
                Some((mean / 100.0).clamp(0.0, 1.0))
            };
            lines.push(RecognizedLine {
                text: words.join(" "),
                confidence,
            });
            words.clear();
            confs.clear();
        };

    for (i, row) in tsv.lines().enumerate() {
        if i == 0 {
            // Header row.
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = cols[0].parse().unwrap_or(0);
        if level != 5 {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        if current_key != Some(key) {
            flush(&mut words, &mut confs, &mut lines);
            current_key = Some(key);
        }

        words.push(text.to_string());
        if let Ok(conf) = cols[10].parse::<f32>() {
            if conf >= 0.0 {
                confs.push(conf);
            }
        }
    }
    flush(&mut words, &mut confs, &mut lines);

    if lines.is_empty() {
        warn!("tesseract produced no text lines");
    }

    RecognizedText { lines }
}

fn resolve_tesseract_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("TESSERACT_EXE") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return p;
            }
        }
        return PathBuf::from("tesseract");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty child can't deadlock on a full
    // stdout/stderr buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("tesseract timed out after {:?}", timeout);
            let _ = child.kill();
            let _ = child.wait().with_context(|| "wait after kill")?;
            let _ = stdout_thread.join();
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Err(anyhow!(
                "tesseract exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
