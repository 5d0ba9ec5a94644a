use crate::{
    classify,
    config::Config,
    engine::{Engine, RecognizedText},
    locale::{LinePatterns, NORWEGIAN},
    parse::{self, ShiftCandidate},
    report::{ProcessingResult, ShiftRecord},
    score,
};
use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::time::Instant;
use time::Date;
use tracing::{debug, info};

/// Runs one image through extract → parse → classify → score. Holds no
/// mutable state, so callers may run one pipeline per image concurrently.
pub struct Pipeline<E: Engine> {
    cfg: Config,
    patterns: LinePatterns,
    engine: E,
}

#[derive(Debug)]
pub struct JobOutput {
    pub recognized: RecognizedText,
    pub result: ProcessingResult,
}

impl<E: Engine> Pipeline<E> {
    pub fn new(cfg: &Config, engine: E) -> Result<Self> {
        let patterns = LinePatterns::compile(&NORWEGIAN)?;
        Ok(Self {
            cfg: cfg.clone(),
            patterns,
            engine,
        })
    }

    pub fn run(&self, image: &[u8]) -> Result<JobOutput> {
        self.run_at(image, time::OffsetDateTime::now_utc().date())
    }

    /// `today` anchors the date-plausibility window; injected so tests and
    /// replays are deterministic.
    pub fn run_at(&self, image: &[u8], today: Date) -> Result<JobOutput> {
        let started = Instant::now();

        if image.len() as u64 > self.cfg.limits.max_image_bytes {
            return Err(anyhow!(
                "input exceeds max_image_bytes: {}",
                image.len()
            ));
        }

        let recognized = self.engine.recognize(image).map_err(anyhow::Error::from)?;
        info!(
            "engine={} recognized_lines={}",
            self.engine.name(),
            recognized.lines.len()
        );

        let (candidates, mut warnings) = parse::parse(&self.cfg.parse, &self.patterns, &recognized);
        info!(
            "parsed candidates={} warnings={}",
            candidates.len(),
            warnings.len()
        );

        let shifts = self.finalize(candidates, today);

        let overall_confidence = if shifts.is_empty() {
            0.0
        } else {
            shifts.iter().map(|s| s.confidence).sum::<f32>() / shifts.len() as f32
        };

        warnings.extend(score::summary_warnings(
            &self.cfg.scoring,
            &shifts,
            overall_confidence,
        ));

        let result = ProcessingResult {
            shifts,
            warnings,
            overall_confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
        };

        Ok(JobOutput { recognized, result })
    }

    /// Classify and score candidates in first-appearance order, dropping
    /// exact duplicates the way the OCR text sometimes repeats them.
    fn finalize(&self, candidates: Vec<ShiftCandidate>, today: Date) -> Vec<ShiftRecord> {
        let mut seen = HashSet::new();
        let mut shifts = Vec::with_capacity(candidates.len());

        for c in candidates {
            if !seen.insert((c.date, c.start, c.end)) {
                debug!(
                    "duplicate shift skipped: {} {} - {}",
                    c.date,
                    parse::fmt_time(c.start),
                    parse::fmt_time(c.end)
                );
                continue;
            }

            let shift_type = classify::classify(&self.cfg.classify, c.start);
            let confidence = score::score(&self.cfg.scoring, &c, today);

            shifts.push(ShiftRecord {
                date: format!(
                    "{:02}.{:02}.{:04}",
                    c.date.day(),
                    u8::from(c.date.month()),
                    c.date.year()
                ),
                start_time: parse::fmt_time(c.start),
                end_time: parse::fmt_time(c.end),
                shift_type,
                confidence,
            });
        }

        shifts
    }
}
