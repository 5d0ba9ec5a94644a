use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub hashing: Hashing,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub preprocess: Preprocess,
    #[serde(default)]
    pub vision: Vision,
    #[serde(default)]
    pub parse: Parse,
    #[serde(default)]
    pub classify: Classify,
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: Default::default(),
            paths: Default::default(),
            hashing: Default::default(),
            limits: Default::default(),
            ocr: Default::default(),
            preprocess: Default::default(),
            vision: Default::default(),
            parse: Default::default(),
            classify: Default::default(),
            scoring: Default::default(),
            calendar: Default::default(),
            output: Default::default(),
            logging: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
    pub resume: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            resume: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hashing {
    pub mode: String,
    pub fast_window_bytes: u64,
}
impl Default for Hashing {
    fn default() -> Self {
        Self {
            mode: "fast_2x16mb".into(),
            fast_window_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_image_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_image_bytes: 25 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    /// Tesseract executable. "auto" tries $TESSERACT_EXE, then plain "tesseract".
    pub tesseract_exe: String,
    pub language: String,
    pub psm: u32,
    pub timeout_seconds: u64,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            tesseract_exe: "auto".into(),
            language: "nor".into(),
            psm: 6,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocess {
    pub binarize: bool,
    pub binarize_threshold: u8,
}
impl Default for Preprocess {
    fn default() -> Self {
        Self {
            binarize: true,
            binarize_threshold: 128,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vision {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
}
impl Default for Vision {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            max_dimension: 1200,
            jpeg_quality: 85,
            max_tokens: 2000,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parse {
    /// Non-empty lines searched for a day number after a shift-time line.
    pub lookahead_lines: u32,
    pub collapse_split_digits: bool,
}
impl Default for Parse {
    fn default() -> Self {
        Self {
            lookahead_lines: 2,
            collapse_split_digits: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classify {
    pub early_start_hour: u8,
    pub mid_start_hour: u8,
    pub evening_start_hour: u8,
    pub night_start_hour: u8,
}
impl Default for Classify {
    fn default() -> Self {
        Self {
            early_start_hour: 6,
            mid_start_hour: 12,
            evening_start_hour: 16,
            night_start_hour: 22,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoring {
    /// OCR signal used when the engine reports no confidence (vision path).
    pub neutral_ocr_confidence: f32,
    pub skipped_line_factor: f32,
    pub digit_fix_factor: f32,
    pub out_of_window_factor: f32,
    pub past_window_months: i32,
    pub future_window_months: i32,
    pub low_confidence_threshold: f32,
    pub min_plausible_hours: f32,
    pub max_plausible_hours: f32,
    pub max_duration_warnings: u32,
}
impl Default for Scoring {
    fn default() -> Self {
        Self {
            neutral_ocr_confidence: 0.7,
            skipped_line_factor: 0.8,
            digit_fix_factor: 0.9,
            out_of_window_factor: 0.5,
            past_window_months: 2,
            future_window_months: 13,
            low_confidence_threshold: 0.6,
            min_plausible_hours: 4.0,
            max_plausible_hours: 12.0,
            max_duration_warnings: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub prodid: String,
    pub calname_prefix: String,
    pub default_owner: String,
    pub max_owner_length: usize,
    pub uid_domain: String,
}
impl Default for Calendar {
    fn default() -> Self {
        Self {
            prodid: "-//Vaktplan//OCR til iCal//NO".into(),
            calname_prefix: "Vakter".into(),
            default_owner: "Ansatt".into(),
            max_owner_length: 50,
            uid_domain: "vaktplan".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub write_result_json: bool,
    pub write_recognized_text: bool,
    pub write_index_json: bool,
    pub result_filename: String,
    pub recognized_filename: String,
    pub calendar_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_result_json: true,
            write_recognized_text: true,
            write_index_json: true,
            result_filename: "result.json".into(),
            recognized_filename: "recognized.txt".into(),
            calendar_filename: "vakter.ics".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
            write_to_file: true,
            file_path: "".into(),
        }
    }
}
