use time::macros::date;
use vaktplan::{
    config::Config,
    engine::{RecognizedLine, RecognizedText},
    locale::{LinePatterns, NORWEGIAN},
    parse::{parse, ShiftCandidate},
};

fn scan(text: &str) -> (Vec<ShiftCandidate>, Vec<String>) {
    let cfg = Config::default();
    let patterns = LinePatterns::compile(&NORWEGIAN).expect("compile patterns");
    parse(
        &cfg.parse,
        &patterns,
        &RecognizedText::from_plain_text(text),
    )
}

#[test]
fn single_shift_with_month_header() {
    let (candidates, warnings) = scan("november 2025\nmandag 07:00 - 15:00\n18");
    assert_eq!(candidates.len(), 1);
    assert!(warnings.is_empty());

    let c = &candidates[0];
    assert_eq!(c.date, date!(2025 - 11 - 18));
    assert_eq!((c.start.hour(), c.start.minute()), (7, 0));
    assert_eq!((c.end.hour(), c.end.minute()), (15, 0));
    assert_eq!(c.fit.lines_skipped, 0);
    assert!(!c.fit.digit_fix);
}

#[test]
fn time_line_without_day_number_warns() {
    let (candidates, warnings) = scan("november 2025\nmandag 07:00 - 15:00");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("uten datonummer"));
}

#[test]
fn two_month_headers_each_govern_following_days() {
    let text = "oktober 2025\nmandag 08:00 - 16:00\n6\nnovember 2025\ntirsdag 08:00 - 16:00\n4";
    let (candidates, warnings) = scan(text);
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].date, date!(2025 - 10 - 06));
    assert_eq!(candidates[1].date, date!(2025 - 11 - 04));
}

#[test]
fn split_digits_collapse_to_one_day() {
    let (candidates, warnings) = scan("november 2025\nfredag 14:00 - 22:00\n2 3");
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].date, date!(2025 - 11 - 23));
    assert!(candidates[0].fit.digit_fix);
}

#[test]
fn day_out_of_range_for_month_is_warned_not_fatal() {
    let (candidates, warnings) = scan("april 2025\nmandag 07:00 - 15:00\n31");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Ugyldig dagnummer"));
}

#[test]
fn february_30_is_rejected() {
    let (candidates, warnings) = scan("februar 2025\nmandag 07:00 - 15:00\n30");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
}

#[test]
fn shift_without_month_context_is_skipped() {
    let (candidates, warnings) = scan("mandag 07:00 - 15:00\n18");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("uten måned/år"));
}

#[test]
fn one_skipped_line_is_tolerated_and_recorded() {
    let (candidates, warnings) = scan("november 2025\nonsdag 10:00 - 18:00\nuleselig\n12");
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].fit.lines_skipped, 1);
}

#[test]
fn lookahead_window_expires_after_two_junk_lines() {
    let (candidates, warnings) = scan("november 2025\nonsdag 10:00 - 18:00\nstøy\nmer støy\n12");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("uten datonummer"));
}

#[test]
fn empty_lines_do_not_consume_lookahead() {
    let (candidates, warnings) = scan("november 2025\ntorsdag 07:30 - 15:30\n\n\n9");
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].date, date!(2025 - 11 - 09));
}

#[test]
fn equal_start_and_end_times_are_rejected() {
    let (candidates, warnings) = scan("november 2025\nmandag 08:00 - 08:00\n3");
    assert!(candidates.is_empty());
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Ugyldig tidsrom"));
}

#[test]
fn overnight_range_is_accepted_by_parser() {
    let (candidates, warnings) = scan("november 2025\nl\u{f8}rdag 22:00 - 06:00\n15");
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 1);
    assert_eq!((candidates[0].end.hour(), candidates[0].end.minute()), (6, 0));
}

#[test]
fn mangled_weekday_diacritic_still_matches() {
    // OCR often turns the ø in lørdag/søndag into another glyph.
    let (candidates, warnings) = scan("november 2025\nlurdag 09:00 - 17:00\n8\nsandag 09:00 - 17:00\n9");
    assert!(warnings.is_empty());
    assert_eq!(candidates.len(), 2);
}

#[test]
fn candidates_keep_source_order_not_date_order() {
    let text = "november 2025\nmandag 07:00 - 15:00\n24\ntirsdag 07:00 - 15:00\n4";
    let (candidates, _) = scan(text);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].date, date!(2025 - 11 - 24));
    assert_eq!(candidates[1].date, date!(2025 - 11 - 04));
}

#[test]
fn engine_confidence_is_carried_onto_candidates() {
    let cfg = Config::default();
    let patterns = LinePatterns::compile(&NORWEGIAN).expect("compile patterns");
    let text = RecognizedText {
        lines: vec![
            RecognizedLine {
                text: "november 2025".into(),
                confidence: Some(0.95),
            },
            RecognizedLine {
                text: "mandag 07:00 - 15:00".into(),
                confidence: Some(0.82),
            },
            RecognizedLine {
                text: "18".into(),
                confidence: Some(0.90),
            },
        ],
    };
    let (candidates, _) = parse(&cfg.parse, &patterns, &text);
    assert_eq!(candidates.len(), 1);
    // The time line's confidence travels with the shift.
    assert_eq!(candidates[0].source_confidence, Some(0.82));
}
