use crate::classify::ShiftType;
use serde::{Deserialize, Serialize};

/// Finalized shift, the externally visible output unit. Dates and times
/// are fixed-format strings ("DD.MM.YYYY" / "HH:MM") so the shape matches
/// what edit layers hand back to the calendar serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub shift_type: ShiftType,
    pub confidence: f32,
}

impl ShiftRecord {
    /// Shift length in hours, overnight wrap included. `None` when the
    /// time strings are malformed (possible on user-edited records).
    pub fn duration_hours(&self) -> Option<f32> {
        let start = parse_hhmm(&self.start_time)?;
        let end = parse_hhmm(&self.end_time)?;
        let minutes = (end as i32 - start as i32).rem_euclid(24 * 60);
        Some(minutes as f32 / 60.0)
    }
}

pub(crate) fn parse_hhmm(s: &str) -> Option<u32> {
    let (h, m) = s.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h >= 24 || m >= 60 {
        return None;
    }
    Some(h * 60 + m)
}

/// One pipeline invocation's complete outcome. Zero shifts is a valid
/// result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub shifts: Vec<ShiftRecord>,
    pub warnings: Vec<String>,
    pub overall_confidence: f32,
    pub processing_time_ms: u64,
}
