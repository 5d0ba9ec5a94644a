use crate::config::Parse;
use crate::engine::RecognizedText;
use crate::locale::{normalize_line, LinePatterns, Locale, NORWEGIAN};
use time::{Date, Month, Time};
use tracing::debug;

/// How cleanly a candidate matched the expected line-adjacency structure,
/// independent of engine confidence. Feeds the confidence scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternFit {
    /// Non-empty lines skipped between the time line and the day number.
    pub lines_skipped: u32,
    /// Whether "2 3" style digit splitting had to be collapsed.
    pub digit_fix: bool,
}

/// One tentative shift, anchored to a concrete calendar date but not yet
/// classified or scored.
#[derive(Debug, Clone)]
pub struct ShiftCandidate {
    pub date: Date,
    pub start: Time,
    pub end: Time,
    pub source_confidence: Option<f32>,
    pub fit: PatternFit,
}

#[derive(Debug, Clone, Copy)]
struct MonthContext {
    month: Month,
    year: i32,
}

#[derive(Debug)]
struct PendingShift {
    start: Time,
    end: Time,
    confidence: Option<f32>,
    skipped: u32,
}

/// Single left-to-right scan over recognized lines. Month headers update
/// the active context without resetting the scan, so one image may span
/// several months. Candidates keep first-appearance order; content
/// problems become warnings, never errors.
pub fn parse(
    cfg: &Parse,
    patterns: &LinePatterns,
    text: &RecognizedText,
) -> (Vec<ShiftCandidate>, Vec<String>) {
    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    let mut ctx: Option<MonthContext> = None;
    let mut pending: Option<PendingShift> = None;

    for line in &text.lines {
        let norm = normalize_line(&line.text);
        if norm.is_empty() {
            // Lookahead counts non-empty lines only.
            continue;
        }

        if let Some(caps) = patterns.month_header.captures(&norm) {
            if let Some(new_ctx) = month_context_from(&NORWEGIAN, &caps) {
                debug!("month context: {:?} {}", new_ctx.month, new_ctx.year);
                ctx = Some(new_ctx);
            }
            bump_lookahead(cfg, &mut pending, &mut warnings);
            continue;
        }

        if let Some(caps) = patterns.shift_time.captures(&norm) {
            if let Some(p) = pending.take() {
                warnings.push(no_day_number_warning(&p));
            }
            match parse_time_range(&caps) {
                Ok((start, end)) => {
                    pending = Some(PendingShift {
                        start,
                        end,
                        confidence: line.confidence,
                        skipped: 0,
                    });
                }
                Err(reason) => warnings.push(reason),
            }
            continue;
        }

        if pending.is_none() {
            continue;
        }

        let (day_text, digit_fix) = collapse_split_digits(cfg, patterns, &norm);
        if let Some(caps) = patterns.day_number.captures(&day_text) {
            let p = pending.take().expect("pending checked above");
            let day: u8 = caps[1].parse().unwrap_or(0);
            match resolve_candidate(ctx, &p, day, digit_fix) {
                Ok(c) => candidates.push(c),
                Err(reason) => warnings.push(reason),
            }
            continue;
        }

        bump_lookahead(cfg, &mut pending, &mut warnings);
    }

    if let Some(p) = pending.take() {
        warnings.push(no_day_number_warning(&p));
    }

    (candidates, warnings)
}

fn month_context_from(locale: &Locale, caps: &regex::Captures) -> Option<MonthContext> {
    let month_num = locale.month_number(&caps[1])?;
    let month = Month::try_from(month_num).ok()?;
    let year: i32 = caps[2].parse().ok()?;
    Some(MonthContext { month, year })
}

fn parse_time_range(caps: &regex::Captures) -> Result<(Time, Time), String> {
    let sh: u8 = caps[1].parse().map_err(|_| bad_time_warning(caps))?;
    let sm: u8 = caps[2].parse().map_err(|_| bad_time_warning(caps))?;
    let eh: u8 = caps[3].parse().map_err(|_| bad_time_warning(caps))?;
    let em: u8 = caps[4].parse().map_err(|_| bad_time_warning(caps))?;

    let start = Time::from_hms(sh, sm, 0).map_err(|_| bad_time_warning(caps))?;
    let end = Time::from_hms(eh, em, 0).map_err(|_| bad_time_warning(caps))?;

    if start == end {
        return Err(format!(
            "Ugyldig tidsrom {:02}:{:02} - {:02}:{:02}: start og slutt er like",
            sh, sm, eh, em
        ));
    }
    // end < start is a valid overnight shift; the calendar serializer
    // rolls it to the next day.
    Ok((start, end))
}

fn collapse_split_digits(cfg: &Parse, patterns: &LinePatterns, norm: &str) -> (String, bool) {
    if !cfg.collapse_split_digits {
        return (norm.to_string(), false);
    }
    if let Some(caps) = patterns.split_digits.captures(norm) {
        return (format!("{}{}", &caps[1], &caps[2]), true);
    }
    (norm.to_string(), false)
}

fn resolve_candidate(
    ctx: Option<MonthContext>,
    p: &PendingShift,
    day: u8,
    digit_fix: bool,
) -> Result<ShiftCandidate, String> {
    let Some(ctx) = ctx else {
        return Err(format!(
            "Vakt {} - {} funnet uten måned/år i teksten; hopper over",
            fmt_time(p.start),
            fmt_time(p.end)
        ));
    };

    let date = Date::from_calendar_date(ctx.year, ctx.month, day).map_err(|_| {
        format!(
            "Ugyldig dagnummer {} for {:02}.{}; hopper over vakt",
            day,
            u8::from(ctx.month),
            ctx.year
        )
    })?;

    Ok(ShiftCandidate {
        date,
        start: p.start,
        end: p.end,
        source_confidence: p.confidence,
        fit: PatternFit {
            lines_skipped: p.skipped,
            digit_fix,
        },
    })
}

fn bump_lookahead(cfg: &Parse, pending: &mut Option<PendingShift>, warnings: &mut Vec<String>) {
    if let Some(p) = pending.as_mut() {
        p.skipped += 1;
        if p.skipped >= cfg.lookahead_lines.max(1) {
            let p = pending.take().expect("pending checked above");
            warnings.push(no_day_number_warning(&p));
        }
    }
}

fn no_day_number_warning(p: &PendingShift) -> String {
    format!(
        "Vakt {} - {} funnet uten datonummer; hopper over",
        fmt_time(p.start),
        fmt_time(p.end)
    )
}

fn bad_time_warning(caps: &regex::Captures) -> String {
    format!("Ugyldig klokkeslett i linjen: {}", &caps[0])
}

pub fn fmt_time(t: Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}
