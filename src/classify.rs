use crate::config::Classify;
use serde::{Deserialize, Serialize};
use time::Time;

/// Named shift-type buckets. Serialized with the Norwegian labels the
/// downstream contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Tidlig,
    Mellom,
    Kveld,
    Natt,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Tidlig => "tidlig",
            ShiftType::Mellom => "mellom",
            ShiftType::Kveld => "kveld",
            ShiftType::Natt => "natt",
        }
    }
}

impl std::fmt::Display for ShiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a start time into a shift type. Total over all minutes of the
/// day; boundaries are inclusive-lower/exclusive-upper, so 12:00 is mellom
/// and 21:59 is still kveld.
pub fn classify(cfg: &Classify, start: Time) -> ShiftType {
    let minute = start.hour() as u32 * 60 + start.minute() as u32;
    let early = cfg.early_start_hour as u32 * 60;
    let mid = cfg.mid_start_hour as u32 * 60;
    let evening = cfg.evening_start_hour as u32 * 60;
    let night = cfg.night_start_hour as u32 * 60;

    if (early..mid).contains(&minute) {
        ShiftType::Tidlig
    } else if (mid..evening).contains(&minute) {
        ShiftType::Mellom
    } else if (evening..night).contains(&minute) {
        ShiftType::Kveld
    } else {
        ShiftType::Natt
    }
}
