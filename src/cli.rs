use crate::{
    calendar,
    config::Config,
    engine::{tesseract::TesseractEngine, vision::VisionEngine, Engine},
    pipeline::{JobOutput, Pipeline},
    report::{ProcessingResult, ShiftRecord},
    util::{ensure_dir, hash_bytes, now_rfc3339, sha256_hex},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "vaktplan")]
#[command(about = "Shift-schedule image extractor (OCR/vision + Norwegian parser + iCalendar)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./vaktplan.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineKind {
    /// Deterministic Tesseract OCR.
    Ocr,
    /// Generative vision model.
    Ai,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report availability of both extraction engines.
    Doctor {},
    /// Extract shifts from a schedule image into result.json.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value = "ocr")]
        engine: EngineKind,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Serialize a (possibly edited) shift list to an .ics file.
    Calendar {
        /// result.json from extract, or a bare JSON array of shifts.
        #[arg(long)]
        shifts: PathBuf,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract and serialize in one job directory.
    Run {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value = "ocr")]
        engine: EngineKind,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Doctor {} => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            doctor(&cfg)
        }
        Command::Calendar { shifts, owner, out } => {
            let log_path = resolve_log_path(&cfg, None);
            let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
            write_calendar(&cfg, shifts, owner, out.as_deref())
        }
        Command::Extract {
            input,
            engine,
            out_dir,
        } => extract(&args, &cfg, input, *engine, out_dir.as_deref(), None),
        Command::Run {
            input,
            engine,
            owner,
            out_dir,
        } => extract(&args, &cfg, input, *engine, out_dir.as_deref(), Some(owner)),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("vaktplan.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("vaktplan.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
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
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let ocr_diag = TesseractEngine::new(cfg)?.doctor()?;
    let ai_diag = match VisionEngine::new(cfg) {
        Ok(engine) => engine.doctor()?,
        Err(e) => crate::engine::EngineDiag {
            engine: "ai".into(),
            detail: cfg.vision.model.clone(),
            ok: false,
            error: Some(format!("{e:#}")),
        },
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "ocr": ocr_diag,
            "ai": ai_diag,
        }))?
    );
    Ok(())
}

fn extract(
    args: &Args,
    cfg: &Config,
    input: &Path,
    engine: EngineKind,
    out_override: Option<&Path>,
    owner: Option<&str>,
) -> Result<()> {
    validate_input(input)?;
    let image = std::fs::read(input)
        .with_context(|| format!("reading input: {}", input.display()))?;

    let cfg_hash = sha256_hex(cfg.normalized_for_hash().as_bytes());
    let input_hash = hash_bytes(cfg, &image)
        .with_context(|| format!("hashing input: {}", input.display()))?;
    let job_id = sha256_hex(format!("{}:{}", cfg_hash, input_hash).as_bytes());

    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    let job_dir = out_root.join(&job_id);

    if job_dir.exists() && !cfg.global.resume {
        return Err(anyhow!(
            "job_dir already exists and resume=false: {}",
            job_dir.display()
        ));
    }

    ensure_dir(&job_dir)?;
    ensure_dir(&job_dir.join("logs"))?;

    let log_path = resolve_log_path(cfg, Some(&job_dir));
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    info!("job_id={job_id} engine={engine:?} out={}", job_dir.display());

    let started = now_rfc3339();
    let output = run_pipeline(cfg, engine, &image)?;
    write_job_output(cfg, &job_dir, &output)?;

    let calendar_file = if let Some(owner) = owner {
        let ics = calendar::serialize(&cfg.calendar, &output.result.shifts, owner)?;
        let path = job_dir.join(&cfg.output.calendar_filename);
        std::fs::write(&path, ics)
            .with_context(|| format!("writing calendar: {}", path.display()))?;
        Some(cfg.output.calendar_filename.clone())
    } else {
        None
    };

    if cfg.output.write_index_json {
        let index = serde_json::json!({
            "job_id": job_id,
            "engine": format!("{engine:?}").to_lowercase(),
            "started": started,
            "finished": now_rfc3339(),
            "result": cfg.output.result_filename,
            "recognized": cfg.output.recognized_filename,
            "calendar": calendar_file,
        });
        std::fs::write(
            job_dir.join("index.json"),
            serde_json::to_string_pretty(&index)?,
        )?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "job_id": job_id,
                "job_dir": job_dir,
                "shifts": output.result.shifts.len(),
                "warnings": output.result.warnings.len(),
                "overall_confidence": output.result.overall_confidence,
            }))?
        );
    }

    Ok(())
}

fn run_pipeline(cfg: &Config, engine: EngineKind, image: &[u8]) -> Result<JobOutput> {
    match engine {
        EngineKind::Ocr => Pipeline::new(cfg, TesseractEngine::new(cfg)?)?.run(image),
        EngineKind::Ai => Pipeline::new(cfg, VisionEngine::new(cfg)?)?.run(image),
    }
}

fn write_job_output(cfg: &Config, job_dir: &Path, output: &JobOutput) -> Result<()> {
    if cfg.output.write_result_json {
        std::fs::write(
            job_dir.join(&cfg.output.result_filename),
            serde_json::to_string_pretty(&output.result)?,
        )?;
    }
    if cfg.output.write_recognized_text {
        std::fs::write(
            job_dir.join(&cfg.output.recognized_filename),
            output.recognized.to_plain_text(),
        )?;
    }
    Ok(())
}

fn write_calendar(cfg: &Config, shifts_path: &Path, owner: &str, out: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(shifts_path)
        .with_context(|| format!("reading shifts: {}", shifts_path.display()))?;

    // Accept either a bare shift array or a full extract result.
    let shifts: Vec<ShiftRecord> = match serde_json::from_str::<Vec<ShiftRecord>>(&raw) {
        Ok(list) => list,
        Err(_) => {
            let result: ProcessingResult = serde_json::from_str(&raw)
                .with_context(|| "parsing shifts JSON (neither array nor result)")?;
            result.shifts
        }
    };

    let ics = calendar::serialize(&cfg.calendar, &shifts, owner)?;
    let out_path = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.output.calendar_filename));
    std::fs::write(&out_path, ics)
        .with_context(|| format!("writing calendar: {}", out_path.display()))?;

    info!("wrote {} event(s) to {}", shifts.len(), out_path.display());
    Ok(())
}

fn validate_input(input: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("input does not exist: {}", input.display()));
    }

    if let Some(ext) = input.extension().and_then(|s| s.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if !matches!(ext.as_str(), "jpg" | "jpeg" | "png") {
            warn!(
                "unexpected input extension .{ext}; attempting decode anyway: {}",
                input.display()
            );
        }
    } else {
        warn!("input has no extension: {}", input.display());
    }

    Ok(())
}

fn resolve_log_path(cfg: &Config, job_dir: Option<&Path>) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    if let Some(job_dir) = job_dir {
        return Some(job_dir.join("logs").join("vaktplan.log"));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("vaktplan.log"))
}
