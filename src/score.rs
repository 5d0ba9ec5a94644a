use crate::config::Scoring;
use crate::parse::ShiftCandidate;
use crate::report::ShiftRecord;
use time::Date;

/// Composite confidence for one candidate: engine signal × pattern-fit
/// signal × date-plausibility signal. A product, not a sum, so any signal
/// near zero drags the result down with it.
pub fn score(cfg: &Scoring, candidate: &ShiftCandidate, today: Date) -> f32 {
    let ocr_signal = candidate
        .source_confidence
        .unwrap_or(cfg.neutral_ocr_confidence);

    let mut pattern_signal = if candidate.fit.lines_skipped == 0 {
        1.0
    } else {
        cfg.skipped_line_factor
    };
    if candidate.fit.digit_fix {
        pattern_signal *= cfg.digit_fix_factor;
    }

    let plausibility = if date_in_window(cfg, candidate.date, today) {
        1.0
    } else {
        cfg.out_of_window_factor
    };

    (ocr_signal * pattern_signal * plausibility).clamp(0.0, 1.0)
}

/// Month-granularity window around today, guarding against a misread year.
fn date_in_window(cfg: &Scoring, date: Date, today: Date) -> bool {
    let months = |d: Date| d.year() * 12 + u8::from(d.month()) as i32 - 1;
    let diff = months(date) - months(today);
    diff >= -cfg.past_window_months && diff <= cfg.future_window_months
}

/// Advisory warnings over the finished shift list: overall-confidence
/// notices, a low-confidence count, and suspicious durations (capped so a
/// garbled image cannot flood the caller).
pub fn summary_warnings(cfg: &Scoring, shifts: &[ShiftRecord], overall: f32) -> Vec<String> {
    let mut warnings = Vec::new();
    if shifts.is_empty() {
        return warnings;
    }

    if overall < 0.5 {
        warnings.push("Lav sikkerhet på OCR-resultatet. Vennligst dobbelsjekk alle vakter.".into());
    } else if overall < 0.7 {
        warnings.push("Moderat sikkerhet. Sjekk spesielt datoer og klokkeslett.".into());
    }

    let low = shifts
        .iter()
        .filter(|s| s.confidence < cfg.low_confidence_threshold)
        .count();
    if low > 0 {
        warnings.push(format!("{low} vakt(er) har lav sikkerhet."));
    }

    let mut detailed = 0u32;
    let mut suspicious = 0u32;
    for shift in shifts {
        let Some(duration) = shift.duration_hours() else {
            continue;
        };
        let too_short = duration > 0.0 && duration < cfg.min_plausible_hours;
        let too_long = duration > cfg.max_plausible_hours;
        if !(too_short || too_long) {
            continue;
        }
        suspicious += 1;
        if detailed >= cfg.max_duration_warnings {
            continue;
        }
        detailed += 1;
        if too_short {
            warnings.push(format!(
                "Vakt {} virker veldig kort ({duration:.1} timer). Sjekk at tidene er korrekte.",
                shift.date
            ));
        } else {
            warnings.push(format!(
                "Vakt {} virker veldig lang ({duration:.1} timer). Sjekk at tidene er korrekte.",
                shift.date
            ));
        }
    }

    let remaining = suspicious.saturating_sub(detailed);
    if remaining > 0 {
        warnings.push(format!(
            "...og {remaining} andre vakt(er) med uvanlig varighet."
        ));
    }

    warnings
}
