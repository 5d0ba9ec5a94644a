use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Locale vocabulary as data, so the scanning algorithm in `parse` stays
/// language-agnostic. Weekday entries are regex fragments because OCR
/// regularly mangles the ø in lørdag/søndag.
pub struct Locale {
    pub months: [(&'static str, u8); 12],
    pub weekday_patterns: [&'static str; 7],
}

pub static NORWEGIAN: Locale = Locale {
    months: [
        ("januar", 1),
        ("februar", 2),
        ("mars", 3),
        ("april", 4),
        ("mai", 5),
        ("juni", 6),
        ("juli", 7),
        ("august", 8),
        ("september", 9),
        ("oktober", 10),
        ("november", 11),
        ("desember", 12),
    ],
    weekday_patterns: [
        "mandag", "tirsdag", "onsdag", "torsdag", "fredag", "l.rdag", "s.ndag",
    ],
};

impl Locale {
    pub fn month_number(&self, name: &str) -> Option<u8> {
        self.months
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, num)| *num)
    }
}

/// Compiled line matchers for one locale. Built once per pipeline and
/// shared across invocations; `Regex` matching needs no mutable state.
pub struct LinePatterns {
    pub month_header: Regex,
    pub shift_time: Regex,
    pub day_number: Regex,
    pub split_digits: Regex,
}

impl LinePatterns {
    pub fn compile(locale: &Locale) -> Result<Self> {
        let months = locale
            .months
            .iter()
            .map(|(n, _)| *n)
            .collect::<Vec<_>>()
            .join("|");
        let weekdays = locale.weekday_patterns.join("|");

        let month_header = Regex::new(&format!(r"\b({months})\s+(\d{{4}})\b"))
            .with_context(|| "compiling month header pattern")?;
        let shift_time = Regex::new(&format!(
            r"\b(?:{weekdays})\b\s*(\d{{1,2}})\s*:\s*(\d{{2}})\s*[-–—]\s*(\d{{1,2}})\s*:\s*(\d{{2}})"
        ))
        .with_context(|| "compiling shift time pattern")?;
        let day_number =
            Regex::new(r"^(\d{1,2})$").with_context(|| "compiling day number pattern")?;
        let split_digits =
            Regex::new(r"^(\d)\s+(\d)$").with_context(|| "compiling split digit pattern")?;

        Ok(Self {
            month_header,
            shift_time,
            day_number,
            split_digits,
        })
    }
}

/// NFKC-fold and lowercase a recognized line before matching, so full-width
/// digits and composed/decomposed variants from OCR compare equal.
pub fn normalize_line(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase().trim().to_string()
}
