use time::Time;
use vaktplan::{
    classify::{classify, ShiftType},
    config::Config,
};

fn at(h: u8, m: u8) -> Time {
    Time::from_hms(h, m, 0).expect("valid time")
}

#[test]
fn boundary_grid() {
    let cfg = Config::default();
    let cases = [
        ((0, 0), ShiftType::Natt),
        ((5, 59), ShiftType::Natt),
        ((6, 0), ShiftType::Tidlig),
        ((11, 59), ShiftType::Tidlig),
        ((12, 0), ShiftType::Mellom),
        ((15, 59), ShiftType::Mellom),
        ((16, 0), ShiftType::Kveld),
        ((21, 59), ShiftType::Kveld),
        ((22, 0), ShiftType::Natt),
        ((23, 59), ShiftType::Natt),
    ];
    for ((h, m), expected) in cases {
        assert_eq!(
            classify(&cfg.classify, at(h, m)),
            expected,
            "start {h:02}:{m:02}"
        );
    }
}

#[test]
fn every_minute_maps_to_exactly_one_bucket() {
    let cfg = Config::default();
    let mut counts = [0u32; 4];
    for h in 0..24 {
        for m in 0..60 {
            match classify(&cfg.classify, at(h, m)) {
                ShiftType::Tidlig => counts[0] += 1,
                ShiftType::Mellom => counts[1] += 1,
                ShiftType::Kveld => counts[2] += 1,
                ShiftType::Natt => counts[3] += 1,
            }
        }
    }
    assert_eq!(counts.iter().sum::<u32>(), 24 * 60);
    assert_eq!(counts[0], 6 * 60); // 06-12
    assert_eq!(counts[1], 4 * 60); // 12-16
    assert_eq!(counts[2], 6 * 60); // 16-22
    assert_eq!(counts[3], 8 * 60); // 22-06
}

#[test]
fn norwegian_labels() {
    assert_eq!(ShiftType::Tidlig.as_str(), "tidlig");
    assert_eq!(ShiftType::Mellom.as_str(), "mellom");
    assert_eq!(ShiftType::Kveld.as_str(), "kveld");
    assert_eq!(ShiftType::Natt.as_str(), "natt");
    assert_eq!(
        serde_json::to_string(&ShiftType::Natt).expect("serialize"),
        "\"natt\""
    );
}
