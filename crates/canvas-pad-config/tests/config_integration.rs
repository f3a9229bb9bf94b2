use canvas_pad_config::{AppConfig, HexColor};

#[test]
fn test_load_creates_default_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");
    assert!(!path.exists());

    let config = AppConfig::load_or_create(&path);
    assert!(path.exists());
    assert_eq!(config, AppConfig::default());

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(parsed["debounce_ms"], 300);
    assert_eq!(parsed["background"], "#FFFFFF");
}

#[test]
fn test_load_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");
    let json = r##"{
        "canvas_width": 1080,
        "canvas_height": 1080,
        "background": "#7B68EE",
        "debounce_ms": 150,
        "baseline_snapshot": true
    }"##;
    std::fs::write(&path, json).unwrap();

    let config = AppConfig::load_or_create(&path);
    assert_eq!(config.canvas_width, 1080);
    assert_eq!(config.canvas_height, 1080);
    assert_eq!(config.background, HexColor::rgb(0x7B, 0x68, 0xEE));
    assert_eq!(config.debounce_ms, 150);
    assert!(config.baseline_snapshot);
    assert_eq!(config.max_history_depth, 500);
}

#[test]
fn test_broken_json_returns_defaults_and_keeps_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");
    std::fs::write(&path, "{ this is not valid json }}}").unwrap();

    let config = AppConfig::load_or_create(&path);
    assert_eq!(config, AppConfig::default());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{ this is not valid json }}}"
    );
}

#[test]
fn test_invalid_color_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");
    std::fs::write(&path, r#"{"background": "purple"}"#).unwrap();

    let config = AppConfig::load_or_create(&path);
    assert_eq!(config.background, HexColor::WHITE);
}

#[test]
fn test_loaded_config_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");
    std::fs::write(&path, r#"{"max_history_depth": 0, "canvas_width": 1}"#).unwrap();

    let config = AppConfig::load_or_create(&path);
    assert_eq!(config.max_history_depth, 1);
    assert_eq!(config.canvas_width, 16);
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canvas-pad.json");

    let mut config = AppConfig::default();
    config.data_dir = dir.path().join("data").display().to_string();
    config.default_document = "poster".to_string();
    config.save(&path).unwrap();

    let loaded = AppConfig::load_or_create(&path);
    assert_eq!(loaded, config);
    assert_eq!(loaded.data_dir_override(), Some(dir.path().join("data")));
}
