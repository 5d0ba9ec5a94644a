use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognition output shared by both engines: one entry per detected text
/// line, with an engine-reported confidence only on the Tesseract path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedText {
    pub lines: Vec<RecognizedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    /// Per-line confidence in [0,1]; `None` for the vision path.
    pub confidence: Option<f32>,
}

impl RecognizedText {
    pub fn from_plain_text(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| RecognizedLine {
                    text: l.to_string(),
                    confidence: None,
                })
                .collect(),
        }
    }

    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub engine: String,
    pub detail: String,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// The recognition engine could not be reached or did not finish in
    /// time. Retryable by the caller; never retried here.
    #[error("recognition engine unavailable: {0}")]
    Unavailable(String),
    /// The input could not be decoded as an image, or decoded to zero
    /// dimensions. Not retryable.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
}
