use vaktplan::{
    calendar::{sanitize_owner, serialize},
    classify::ShiftType,
    config::Config,
    report::ShiftRecord,
};

fn mk_shift(date: &str, start: &str, end: &str, shift_type: ShiftType) -> ShiftRecord {
    ShiftRecord {
        date: date.into(),
        start_time: start.into(),
        end_time: end.into(),
        shift_type,
        confidence: 0.9,
    }
}

fn ics(shifts: &[ShiftRecord], owner: &str) -> String {
    let cfg = Config::default();
    let bytes = serialize(&cfg.calendar, shifts, owner).expect("serialize");
    String::from_utf8(bytes).expect("utf8")
}

#[test]
fn serialization_is_byte_identical_across_runs() {
    let shifts = vec![
        mk_shift("18.11.2025", "07:00", "15:00", ShiftType::Tidlig),
        mk_shift("19.11.2025", "22:00", "06:00", ShiftType::Natt),
    ];
    let a = ics(&shifts, "Kari");
    let b = ics(&shifts, "Kari");
    assert_eq!(a, b);
}

#[test]
fn event_count_matches_shift_count() {
    let shifts: Vec<ShiftRecord> = (1..=5)
        .map(|d| mk_shift(&format!("{d:02}.11.2025"), "07:00", "15:00", ShiftType::Tidlig))
        .collect();
    let doc = ics(&shifts, "Kari");
    assert_eq!(doc.matches("BEGIN:VEVENT").count(), 5);
    assert_eq!(doc.matches("END:VEVENT").count(), 5);
}

#[test]
fn empty_shift_list_is_a_valid_document() {
    let doc = ics(&[], "Kari");
    assert!(doc.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(doc.ends_with("END:VCALENDAR\r\n"));
    assert_eq!(doc.matches("BEGIN:VEVENT").count(), 0);
}

#[test]
fn summary_uses_owner_and_shift_type() {
    let shifts = vec![mk_shift("18.11.2025", "07:00", "15:00", ShiftType::Tidlig)];
    let doc = ics(&shifts, "Kari");
    assert!(doc.contains("SUMMARY:Kari jobber tidlig\r\n"));
}

#[test]
fn same_day_shift_keeps_dtend_on_start_date() {
    let shifts = vec![mk_shift("18.11.2025", "07:00", "15:00", ShiftType::Tidlig)];
    let doc = ics(&shifts, "Kari");
    assert!(doc.contains("DTSTART:20251118T070000\r\n"));
    assert!(doc.contains("DTEND:20251118T150000\r\n"));
}

#[test]
fn overnight_shift_rolls_dtend_to_next_day() {
    let shifts = vec![mk_shift("30.11.2025", "22:00", "06:00", ShiftType::Natt)];
    let doc = ics(&shifts, "Kari");
    assert!(doc.contains("DTSTART:20251130T220000\r\n"));
    assert!(doc.contains("DTEND:20251201T060000\r\n"));
}

#[test]
fn text_values_are_escaped() {
    let shifts = vec![mk_shift("18.11.2025", "07:00", "15:00", ShiftType::Tidlig)];
    let doc = ics(&shifts, "Nilsen, Kari");
    assert!(doc.contains("SUMMARY:Nilsen\\, Kari jobber tidlig\r\n"));
}

#[test]
fn invalid_edited_date_is_an_error() {
    let cfg = Config::default();
    let shifts = vec![mk_shift("31.02.2025", "07:00", "15:00", ShiftType::Tidlig)];
    assert!(serialize(&cfg.calendar, &shifts, "Kari").is_err());
}

#[test]
fn invalid_edited_time_is_an_error() {
    let cfg = Config::default();
    let shifts = vec![mk_shift("18.11.2025", "25:00", "15:00", ShiftType::Tidlig)];
    assert!(serialize(&cfg.calendar, &shifts, "Kari").is_err());
}

#[test]
fn owner_sanitization_strips_markup_and_falls_back() {
    let cfg = Config::default();
    assert_eq!(
        sanitize_owner(&cfg.calendar, "<script>Kari</script>"),
        "scriptKari/script"
    );
    assert_eq!(sanitize_owner(&cfg.calendar, "  Kari   Nordmann "), "Kari Nordmann");
    assert_eq!(sanitize_owner(&cfg.calendar, "<>"), "Ansatt");
    let long = "K".repeat(200);
    assert_eq!(sanitize_owner(&cfg.calendar, &long).chars().count(), 50);
}
