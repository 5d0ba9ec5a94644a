use crate::config::Calendar;
use crate::report::ShiftRecord;
use anyhow::{anyhow, Result};
use time::{Date, Month};

/// Render a shift list as an iCalendar document. Output is byte-identical
/// for identical input: UID and DTSTAMP derive from event data, never from
/// the wall clock, which is what makes round-trip testing possible.
///
/// Records may have been edited outside the pipeline, so dates and times
/// are re-validated here.
pub fn serialize(cfg: &Calendar, shifts: &[ShiftRecord], owner: &str) -> Result<Vec<u8>> {
    let owner = sanitize_owner(cfg, owner);

    let mut out = String::new();
    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, &format!("PRODID:{}", cfg.prodid));
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(
        &mut out,
        &format!(
            "X-WR-CALNAME:{}",
            escape_text(&format!("{} - {}", cfg.calname_prefix, owner))
        ),
    );

    for shift in shifts {
        write_event(cfg, &mut out, shift, &owner)?;
    }

    push_line(&mut out, "END:VCALENDAR");
    Ok(out.into_bytes())
}

fn write_event(cfg: &Calendar, out: &mut String, shift: &ShiftRecord, owner: &str) -> Result<()> {
    let date = parse_date(&shift.date)?;
    let (start_h, start_m) = parse_time(&shift.start_time)?;
    let (end_h, end_m) = parse_time(&shift.end_time)?;

    // An end before the start means the shift spans midnight: roll the
    // end to the next calendar day instead of rejecting the record.
    let end_date = if (end_h, end_m) < (start_h, start_m) {
        date.next_day()
            .ok_or_else(|| anyhow!("date overflow: {}", shift.date))?
    } else {
        date
    };

    let dtstart = format!("{}T{:02}{:02}00", fmt_date(date), start_h, start_m);
    let dtend = format!("{}T{:02}{:02}00", fmt_date(end_date), end_h, end_m);

    push_line(out, "BEGIN:VEVENT");
    push_line(
        out,
        &format!(
            "UID:{}-{}@{}",
            dtstart,
            owner_slug(owner),
            cfg.uid_domain
        ),
    );
    push_line(out, &format!("DTSTAMP:{dtstart}Z"));
    push_line(out, &format!("DTSTART:{dtstart}"));
    push_line(out, &format!("DTEND:{dtend}"));
    push_line(
        out,
        &format!(
            "SUMMARY:{}",
            escape_text(&format!("{} jobber {}", owner, shift.shift_type))
        ),
    );
    push_line(
        out,
        &format!(
            "DESCRIPTION:{}",
            escape_text(&format!(
                "Vakt importert fra vaktplan-bilde\nTid: {} - {}\nType: {}",
                shift.start_time, shift.end_time, shift.shift_type
            ))
        ),
    );
    push_line(out, "END:VEVENT");
    Ok(())
}

fn parse_date(s: &str) -> Result<Date> {
    let mut parts = s.split('.');
    let (Some(d), Some(m), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(anyhow!("invalid date (expected DD.MM.YYYY): {s}"));
    };
    let day: u8 = d.parse().map_err(|_| anyhow!("invalid day in date: {s}"))?;
    let month: u8 = m.parse().map_err(|_| anyhow!("invalid month in date: {s}"))?;
    let year: i32 = y.parse().map_err(|_| anyhow!("invalid year in date: {s}"))?;
    let month = Month::try_from(month).map_err(|_| anyhow!("invalid month in date: {s}"))?;
    Date::from_calendar_date(year, month, day).map_err(|_| anyhow!("invalid calendar date: {s}"))
}

fn parse_time(s: &str) -> Result<(u8, u8)> {
    let Some((h, m)) = s.split_once(':') else {
        return Err(anyhow!("invalid time (expected HH:MM): {s}"));
    };
    let h: u8 = h.parse().map_err(|_| anyhow!("invalid hour: {s}"))?;
    let m: u8 = m.parse().map_err(|_| anyhow!("invalid minute: {s}"))?;
    if h >= 24 || m >= 60 {
        return Err(anyhow!("time out of range: {s}"));
    }
    Ok((h, m))
}

fn fmt_date(d: Date) -> String {
    format!("{:04}{:02}{:02}", d.year(), u8::from(d.month()), d.day())
}

/// RFC 5545 TEXT escaping.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Owner names arrive from a free-text field. Strip markup and control
/// characters, collapse whitespace, truncate, and fall back to the
/// configured default when nothing survives.
pub fn sanitize_owner(cfg: &Calendar, raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(cfg.max_owner_length).collect();
    let trimmed = truncated.trim().to_string();
    if trimmed.is_empty() {
        cfg.default_owner.clone()
    } else {
        trimmed
    }
}

fn owner_slug(owner: &str) -> String {
    owner
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}
