use vaktplan::engine::tesseract::parse_tsv;

fn header() -> &'static str {
    "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext"
}

fn word(block: u32, line: u32, word: u32, conf: &str, text: &str) -> String {
    format!("5\t1\t{block}\t1\t{line}\t{word}\t0\t0\t10\t10\t{conf}\t{text}")
}

#[test]
fn words_fold_into_lines_with_mean_confidence() {
    let tsv = [
        header().to_string(),
        // Non-word structural rows carry conf -1 and must be ignored.
        "4\t1\t1\t1\t1\t0\t0\t0\t10\t10\t-1\t".to_string(),
        word(1, 1, 1, "96", "november"),
        word(1, 1, 2, "88", "2025"),
        word(1, 2, 1, "90", "mandag"),
        word(1, 2, 2, "70", "07:00"),
        word(1, 2, 3, "80", "-"),
        word(1, 2, 4, "60", "15:00"),
        word(1, 3, 1, "85", "18"),
    ]
    .join("\n");

    let text = parse_tsv(&tsv);
    assert_eq!(text.lines.len(), 3);
    assert_eq!(text.lines[0].text, "november 2025");
    assert_eq!(text.lines[1].text, "mandag 07:00 - 15:00");
    assert_eq!(text.lines[2].text, "18");

    let c0 = text.lines[0].confidence.expect("confidence");
    assert!((c0 - 0.92).abs() < 1e-4);
    let c1 = text.lines[1].confidence.expect("confidence");
    assert!((c1 - 0.75).abs() < 1e-4);
}

#[test]
fn empty_tsv_yields_no_lines() {
    let text = parse_tsv(header());
    assert!(text.lines.is_empty());
}

#[test]
fn blank_word_cells_are_skipped() {
    let tsv = [
        header().to_string(),
        word(1, 1, 1, "95", "18"),
        word(1, 1, 2, "95", " "),
    ]
    .join("\n");
    let text = parse_tsv(&tsv);
    assert_eq!(text.lines.len(), 1);
    assert_eq!(text.lines[0].text, "18");
}

#[test]
fn separate_blocks_become_separate_lines() {
    let tsv = [
        header().to_string(),
        word(1, 1, 1, "90", "oktober"),
        word(1, 1, 2, "90", "2025"),
        word(2, 1, 1, "90", "november"),
        word(2, 1, 2, "90", "2025"),
    ]
    .join("\n");
    let text = parse_tsv(&tsv);
    assert_eq!(text.lines.len(), 2);
}
