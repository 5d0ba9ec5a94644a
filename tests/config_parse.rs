use vaktplan::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../vaktplan.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.ocr.language, "nor");
    assert!(cfg.parse.lookahead_lines >= 1);
    assert!(!cfg.paths.out_dir.is_empty());
}

#[test]
fn defaults_match_example() {
    let raw = include_str!("../vaktplan.example.toml");
    let parsed: Config = toml::from_str(raw).expect("parse TOML");
    let defaults = Config::default();
    assert_eq!(parsed.normalized_for_hash(), defaults.normalized_for_hash());
}
