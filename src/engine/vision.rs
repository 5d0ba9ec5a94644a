use super::{Engine, EngineDiag, EngineError, RecognizedText};
use crate::config::Config;
use crate::preprocess;
use anyhow::{Context, Result};
use base64::Engine as _;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Generative path: asks an OpenAI-compatible vision model to transcribe
/// the schedule into the same plain line layout the deterministic engine
/// produces, so one parser serves both. No per-line confidences.
pub struct VisionEngine {
    cfg: Config,
    client: reqwest::blocking::Client,
    api_key: String,
}

const SYSTEM_MESSAGE: &str = "Du er en presis OCR-assistent spesialisert på norske vaktplaner. \
     Du transkriberer bilder av arbeidsplaner til ren tekst, linje for linje. \
     Vær ekstremt nøyaktig med tall - skill mellom 1/7, 3/8, 6/0 osv.";

const USER_PROMPT: &str = "Transkriber vaktplanen i bildet til ren tekst med nøyaktig dette linjeformatet:

måned årstall
ukedag HH:MM - HH:MM
dagnummer

Eksempel:
november 2025
mandag 07:00 - 15:00
18
tirsdag 14:00 - 22:00
19

Regler:
- Én måned-overskrift (f.eks. \"november 2025\") før vaktene den gjelder for; gjenta for hver måned i bildet
- Én linje per vakt med ukedag og tidsrom, deretter dagnummeret på egen linje
- Bruk 24-timers klokke med null-padding (07:00, ikke 7:00)
- Ta med ALLE vakter i bildet
- Returner BARE disse linjene, ingen markdown, ingen forklaring";

impl VisionEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let api_key = std::env::var(&cfg.vision.api_key_env)
            .with_context(|| format!("missing API key env: {}", cfg.vision.api_key_env))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.vision.timeout_seconds.max(1)))
            .build()
            .with_context(|| "building HTTP client")?;
        Ok(Self {
            cfg: cfg.clone(),
            client,
            api_key,
        })
    }

    fn request_transcript(&self, jpeg: &[u8], mime: &str) -> Result<String, EngineError> {
        let b64 = base64::engine::general_purpose::STANDARD.encode(jpeg);
        let body = serde_json::json!({
            "model": self.cfg.vision.model,
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": [
                    { "type": "text", "text": USER_PROMPT },
                    { "type": "image_url", "image_url": {
                        "url": format!("data:{mime};base64,{b64}"),
                        "detail": "high",
                    }},
                ]},
            ],
            "max_tokens": self.cfg.vision.max_tokens,
            "temperature": 0.1,
        });

        debug!(
            "vision request model={} payload_bytes={}",
            self.cfg.vision.model,
            b64.len()
        );

        let url = format!(
            "{}/chat/completions",
            self.cfg.vision.base_url.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| EngineError::Unavailable(format!("vision request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(EngineError::Unavailable(format!(
                "vision API returned {status}: {}",
                detail.trim()
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .map_err(|e| EngineError::Unavailable(format!("invalid vision response: {e}")))?;

        if let Some(usage) = &parsed.usage {
            info!(
                "vision tokens prompt={} completion={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(EngineError::Unavailable(
                "vision API returned empty content".into(),
            ));
        }

        Ok(content)
    }
}

impl Engine for VisionEngine {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn doctor(&self) -> Result<EngineDiag> {
        Ok(EngineDiag {
            engine: "ai".into(),
            detail: format!("{} @ {}", self.cfg.vision.model, self.cfg.vision.base_url),
            ok: true,
            error: None,
        })
    }

    fn recognize(&self, image: &[u8]) -> Result<RecognizedText, EngineError> {
        let (jpeg, mime) = preprocess::downscale_for_vision(&self.cfg.vision, image)?;
        let content = self.request_transcript(&jpeg, mime)?;
        Ok(RecognizedText::from_plain_text(strip_code_fences(&content)))
    }
}

/// Models sometimes wrap output in ``` fences despite instructions.
fn strip_code_fences(s: &str) -> &str {
    let s = s.trim();
    let Some(inner) = s.strip_prefix("```") else {
        return s;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop a language tag on the opening fence.
    match inner.split_once('\n') {
        Some((first, rest)) if !first.contains(' ') => rest.trim(),
        _ => inner.trim(),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
